//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};

/// Makes - reproducible builds from a local working copy or a pinned repository
///
/// Checks out SOURCE in isolation, builds OUTPUT with Nix and runs the
/// output's action with ARGS.
#[derive(Parser, Debug)]
#[command(name = "m")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// `.`, github:owner/repo@rev or gitlab:owner/repo@rev
    pub source: Option<String>,

    /// Output to build, as listed when only SOURCE is given
    pub output: Option<String>,

    /// Arguments forwarded to the output's action
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
