//! Configuration management for Makes
//!
//! Feature flags and tool locations come from the environment. They are
//! read exactly once into a [`Config`] which is then passed by reference.

pub mod schema;

pub use schema::{BuildMode, Config, EngineConfig};

use crate::error::{MakesError, MakesResult};
use std::path::PathBuf;
use tracing::debug;

/// Clone-cache home directory
pub const ENV_HOME: &str = "HOME_IMPURE";
/// Disables build sandboxing when set to a non-empty value
pub const ENV_K8S_COMPAT: &str = "K8S_COMPAT";
/// Selects the unstable build engine mode when set to a non-empty value
pub const ENV_NIX_UNSTABLE: &str = "NIX_UNSTABLE";
/// Prefix of the stable build engine
pub const ENV_NIX_STABLE_PREFIX: &str = "__NIX_STABLE__";
/// Prefix of the unstable build engine
pub const ENV_NIX_UNSTABLE_PREFIX: &str = "__NIX_UNSTABLE__";
/// Makes' own source tree
pub const ENV_MAKES_SRC: &str = "__MAKES_SRC__";
/// Cachix push credential
pub const ENV_CACHIX_TOKEN: &str = "CACHIX_AUTH_TOKEN";

impl Config {
    /// Resolve configuration from the process environment
    pub fn from_env() -> MakesResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> MakesResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Flags follow shell truthiness: set and non-empty
        let flag = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let home = path(ENV_HOME)
            .or_else(dirs::home_dir)
            .ok_or(MakesError::ConfigMissing(ENV_HOME))?;

        let mode = if flag(ENV_NIX_UNSTABLE) {
            BuildMode::Unstable
        } else {
            BuildMode::Stable
        };

        let makes_src = path(ENV_MAKES_SRC);
        if mode == BuildMode::Stable && makes_src.is_none() {
            return Err(MakesError::ConfigMissing(ENV_MAKES_SRC));
        }

        let config = Self {
            home,
            k8s_compat: flag(ENV_K8S_COMPAT),
            mode,
            engine: EngineConfig {
                nix_stable: path(ENV_NIX_STABLE_PREFIX),
                nix_unstable: path(ENV_NIX_UNSTABLE_PREFIX),
                makes_src,
            },
            cachix_token_present: lookup(ENV_CACHIX_TOKEN).is_some(),
        };

        debug!(mode = %config.mode, "Resolved configuration: {:?}", config);
        Ok(config)
    }
}
