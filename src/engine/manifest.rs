//! Project introspection
//!
//! Before anything is built, the engine is asked for two small JSON
//! documents: the list of outputs and the binary cache configuration.
//! Both are decoded into typed records right here.

use crate::config::Config;
use crate::engine::invocation::{BuildInvocation, BuildRequest, Target};
use crate::error::{MakesError, MakesResult};
use crate::process;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Outputs that exist for internal use and are hidden from listings
pub const HIDDEN_OUTPUTS: &[&str] = &["__all__", "/secretsForAwsFromEnv/__default__"];

/// One binary cache record from `cacheAsJson`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfigEntry {
    /// Backend type, e.g. `cachix`
    #[serde(rename = "type")]
    pub kind: String,
    /// Cache name as known to the backend
    pub name: String,
    /// Substituter URL
    pub url: String,
    /// Trusted public key
    #[serde(rename = "pubKey")]
    pub pub_key: String,
}

impl CacheConfigEntry {
    /// Whether this record is a Cachix cache
    pub fn is_cachix(&self) -> bool {
        self.kind == "cachix"
    }
}

/// Outputs worth showing to the user
pub fn visible_outputs(outputs: &[String]) -> impl Iterator<Item = &str> {
    outputs
        .iter()
        .map(String::as_str)
        .filter(|name| !HIDDEN_OUTPUTS.iter().any(|hidden| hidden == name))
}

/// Runs introspection builds against a checkout
pub struct Introspector<'a> {
    config: &'a Config,
    scratch: &'a Path,
}

impl<'a> Introspector<'a> {
    /// `scratch` receives the result links and must outlive the run
    pub fn new(config: &'a Config, scratch: &'a Path) -> Self {
        Self { config, scratch }
    }

    /// Every output name the project defines
    pub async fn list_outputs(&self, raw: &str, head: &Path) -> MakesResult<Vec<String>> {
        self.introspect(
            Target::Attrs,
            head,
            format!("Unable to list project outputs from: {}", raw),
            raw,
        )
        .await
    }

    /// The project's binary cache configuration
    pub async fn cache_config(&self, raw: &str, head: &Path) -> MakesResult<Vec<CacheConfigEntry>> {
        self.introspect(
            Target::CacheAsJson,
            head,
            format!("Unable to get cache config from: {}", raw),
            raw,
        )
        .await
    }

    async fn introspect<T: DeserializeOwned>(
        &self,
        target: Target<'_>,
        head: &Path,
        failure: String,
        raw: &str,
    ) -> MakesResult<T> {
        let out = self.result_link();
        let request = BuildRequest {
            attr: target.attr_path(self.config.mode, head),
            cache: None,
            head,
            out_link: Some(&out),
        };
        let execution_id = Uuid::new_v4().simple().to_string();
        let invocation = BuildInvocation::new(self.config, &execution_id, &request);

        let output = process::run_captured(&invocation.program, invocation.args.as_slice(), None).await?;
        if !output.success() {
            return Err(MakesError::IntrospectionFailed {
                message: failure,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        let content = tokio::fs::read_to_string(&out)
            .await
            .map_err(|e| MakesError::io(format!("reading {}", out.display()), e))?;
        debug!("Introspection result: {}", content.trim());
        decode(&content, raw)
    }

    fn result_link(&self) -> PathBuf {
        self.scratch
            .join(format!("introspect-{}", Uuid::new_v4().simple()))
    }
}

/// Decode a manifest, rejecting anything that is not the expected shape
pub fn decode<T: DeserializeOwned>(content: &str, raw: &str) -> MakesResult<T> {
    serde_json::from_str(content).map_err(|e| MakesError::ManifestInvalid {
        source_ref: raw.to_string(),
        reason: e.to_string(),
    })
}
