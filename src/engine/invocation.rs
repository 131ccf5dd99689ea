//! Build engine command lines
//!
//! Both engine modes share one option set; only the binary, the way the
//! target is named and a few mode-specific flags differ.

use crate::config::{BuildMode, Config};
use crate::engine::manifest::CacheConfigEntry;
use std::path::{Path, PathBuf};

/// Public default substituter used before any project cache is known
pub const DEFAULT_SUBSTITUTER: &str = "https://cache.nixos.org";
/// Signing key of [`DEFAULT_SUBSTITUTER`]
pub const DEFAULT_PUBLIC_KEY: &str =
    "cache.nixos.org-1:6NCHdD59X431o0gWypbMrAURkbJ16ZPMQFGspcDShjY=";

/// What to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<'a> {
    /// JSON list of every output name
    Attrs,
    /// JSON list of binary cache records
    CacheAsJson,
    /// A user-facing output such as `/hello`
    Output(&'a str),
}

impl Target<'_> {
    /// Attribute path in the convention `mode` expects
    pub fn attr_path(&self, mode: BuildMode, head: &Path) -> String {
        match mode {
            BuildMode::Stable => match self {
                Self::Attrs => "config.attrs".to_string(),
                Self::CacheAsJson => "config.cacheAsJson".to_string(),
                Self::Output(name) => format!("config.outputs.\"{}\"", name),
            },
            BuildMode::Unstable => {
                let attr = match self {
                    Self::Attrs => "config:attrs".to_string(),
                    Self::CacheAsJson => "config:cacheAsJson".to_string(),
                    Self::Output(name) => format!("config:outputs:{}", name),
                };
                format!("{}#__makes__.\"{}\"", head.display(), attr)
            }
        }
    }
}

/// Inputs of a single build engine call
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    /// Mode-appropriate attribute path (see [`Target::attr_path`])
    pub attr: String,
    /// Project cache records; `None` means the public default cache
    pub cache: Option<&'a [CacheConfigEntry]>,
    /// Checkout directory
    pub head: &'a Path,
    /// Where to leave the result link; `None` requests no link
    pub out_link: Option<&'a Path>,
}

/// A fully assembled build engine command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    /// Engine binary
    pub program: PathBuf,
    /// Arguments in order
    pub args: Vec<String>,
}

impl BuildInvocation {
    /// Assemble the command line for `request` under `config`
    ///
    /// `execution_id` is only used in stable mode, where the evaluator
    /// receives it as `makesExecutionId`.
    pub fn new(config: &Config, execution_id: &str, request: &BuildRequest<'_>) -> Self {
        let engine = &config.engine;
        let head = request.head.display().to_string();
        let makes_src = engine
            .makes_src
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let (program, mut args) = match config.mode {
            BuildMode::Stable => (
                engine.nix_build_bin(),
                vec![
                    "--argstr".to_string(),
                    "makesExecutionId".to_string(),
                    execution_id.to_string(),
                    "--argstr".to_string(),
                    "makesSrc".to_string(),
                    makes_src.clone(),
                    "--argstr".to_string(),
                    "projectSrc".to_string(),
                    head,
                    "--attr".to_string(),
                    request.attr.clone(),
                ],
            ),
            BuildMode::Unstable => (
                engine.nix_bin(),
                vec![
                    "--experimental-features".to_string(),
                    "flakes nix-command".to_string(),
                    "build".to_string(),
                    "--impure".to_string(),
                ],
            ),
        };

        args.extend(shared_options(config, request));

        match config.mode {
            BuildMode::Stable => args.push(format!("{}/src/evaluator/default.nix", makes_src)),
            BuildMode::Unstable => args.push(request.attr.clone()),
        }

        Self { program, args }
    }
}

/// Options passed identically in both modes
fn shared_options(config: &Config, request: &BuildRequest<'_>) -> Vec<String> {
    let (substituters, trusted_keys) = match request.cache {
        None => (
            DEFAULT_SUBSTITUTER.to_string(),
            DEFAULT_PUBLIC_KEY.to_string(),
        ),
        Some(entries) => (
            join_field(entries, |e| &e.url),
            join_field(entries, |e| &e.pub_key),
        ),
    };
    let sandbox = if config.k8s_compat { "false" } else { "true" };

    let mut options: Vec<String> = Vec::new();
    let mut option = |name: &str, value: &str| {
        options.push("--option".to_string());
        options.push(name.to_string());
        options.push(value.to_string());
    };
    option("cores", "0");
    option("narinfo-cache-negative-ttl", "1");
    option("narinfo-cache-positive-ttl", "1");
    option("max-jobs", "auto");
    option("substituters", &substituters);
    option("trusted-public-keys", &trusted_keys);
    option("sandbox", sandbox);

    match request.out_link {
        Some(link) => {
            options.push("--out-link".to_string());
            options.push(link.display().to_string());
        }
        None => options.push("--no-out-link".to_string()),
    }
    options.push("--show-trace".to_string());
    options
}

fn join_field<F>(entries: &[CacheConfigEntry], field: F) -> String
where
    F: Fn(&CacheConfigEntry) -> &String,
{
    entries
        .iter()
        .map(|e| field(e).as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
