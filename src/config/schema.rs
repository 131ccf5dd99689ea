//! Configuration schema for Makes
//!
//! Every field is resolved once from the environment at startup and
//! never changes for the rest of the invocation.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Which build engine CLI convention to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Legacy `nix-build` with `--attr` and `--argstr`
    Stable,
    /// Unified `nix build` with flakes and `--impure`
    Unstable,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Unstable => write!(f, "unstable"),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Home directory under which the clone cache lives
    pub home: PathBuf,

    /// Disable build sandboxing (for Kubernetes-like runners)
    pub k8s_compat: bool,

    /// Build engine mode
    pub mode: BuildMode,

    /// Build engine settings
    pub engine: EngineConfig,

    /// Whether a Cachix push credential is present
    pub cachix_token_present: bool,
}

/// Locations the build invocation depends on
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// Prefix containing `bin/nix-build`; `None` means look it up on PATH
    pub nix_stable: Option<PathBuf>,

    /// Prefix containing `bin/nix`; `None` means look it up on PATH
    pub nix_unstable: Option<PathBuf>,

    /// Makes source tree, passed to the stable evaluator
    pub makes_src: Option<PathBuf>,
}

impl EngineConfig {
    /// Path of the `nix-build` binary
    pub fn nix_build_bin(&self) -> PathBuf {
        match &self.nix_stable {
            Some(prefix) => prefix.join("bin").join("nix-build"),
            None => PathBuf::from("nix-build"),
        }
    }

    /// Path of the `nix` binary
    pub fn nix_bin(&self) -> PathBuf {
        match &self.nix_unstable {
            Some(prefix) => prefix.join("bin").join("nix"),
            None => PathBuf::from("nix"),
        }
    }
}

impl Config {
    /// Root of the on-disk clone cache
    pub fn sources_cache_dir(&self) -> PathBuf {
        self.home.join(".cache").join("makes").join("sources")
    }
}
