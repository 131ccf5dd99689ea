//! Build engine protocol
//!
//! Everything that talks to the external build engine, plus the two
//! steps that follow a successful build:
//! - [`invocation`]: command lines for stable (`nix-build`) and unstable
//!   (`nix build`) mode
//! - [`manifest`]: output listing and cache configuration
//! - [`push`]: best-effort Cachix upload
//! - [`action`]: the output's `makes-action.sh`

pub mod action;
pub mod invocation;
pub mod manifest;
pub mod push;

pub use action::{execute_action, ACTION_SCRIPT};
pub use invocation::{BuildInvocation, BuildRequest, Target};
pub use manifest::{visible_outputs, CacheConfigEntry, Introspector};
pub use push::push_to_cache;
