//! Makes - reproducible builds from a local working copy or a pinned repository
//!
//! Checks a source out into an isolated directory, asks Nix to build one
//! of its outputs and hands over to that output's action script.

pub mod cache;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod process;
pub mod source;
pub mod ui;

pub use error::{MakesError, MakesResult};

/// Release shown in the startup banner
pub const VERSION: &str = "21.10";
