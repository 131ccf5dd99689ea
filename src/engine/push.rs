//! Binary cache upload after a successful build

use crate::config::Config;
use crate::engine::manifest::CacheConfigEntry;
use crate::process;
use crate::ui;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A planned `cachix push`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePush {
    /// Push client binary
    pub program: PathBuf,
    /// Arguments in order
    pub args: Vec<String>,
}

/// Decide whether and where to push `out`
///
/// The first Cachix record wins, and only when a push credential is
/// configured. Anything else means no push.
pub fn plan_push(config: &Config, cache: &[CacheConfigEntry], out: &Path) -> Option<CachePush> {
    if !config.cachix_token_present {
        debug!("No cache credential present, skipping push");
        return None;
    }

    let entry = cache.iter().find(|e| e.is_cachix())?;
    Some(CachePush {
        program: PathBuf::from("cachix"),
        args: vec![
            "push".to_string(),
            "-c".to_string(),
            "0".to_string(),
            entry.name.clone(),
            out.display().to_string(),
        ],
    })
}

/// Push `out` to the project cache; never fails the run
pub async fn push_to_cache(config: &Config, cache: &[CacheConfigEntry], out: &Path) {
    let Some(push) = plan_push(config, cache, out) else {
        return;
    };

    ui::announce("Pushing to cache");
    match process::run_streamed(&push.program, push.args.as_slice(), None).await {
        Ok(0) => {}
        Ok(code) => warn!("Cache push exited with code {}", code),
        Err(e) => warn!("Cache push failed: {}", e),
    }
}
