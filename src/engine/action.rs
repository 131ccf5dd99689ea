//! Post-build actions
//!
//! A build output may ship an executable `makes-action.sh`. When present it
//! runs after the build with the output path and the user's extra
//! arguments, and its exit code becomes ours.

use crate::error::MakesResult;
use crate::process;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the action script inside a build output
pub const ACTION_SCRIPT: &str = "makes-action.sh";

/// Location of the action script for an output, if it has one
pub fn find_action(out: &Path) -> Option<PathBuf> {
    let script = out.join(ACTION_SCRIPT);
    script.exists().then_some(script)
}

/// Arguments the action script receives
pub fn action_args(out: &Path, forwarded: &[String]) -> Vec<String> {
    std::iter::once(out.display().to_string())
        .chain(forwarded.iter().cloned())
        .collect()
}

/// Run the output's action, returning its exit code, or `None` if it has none
pub async fn execute_action(
    out: &Path,
    forwarded: &[String],
    cwd: &Path,
) -> MakesResult<Option<i32>> {
    let Some(script) = find_action(out) else {
        debug!("No {} in {}", ACTION_SCRIPT, out.display());
        return Ok(None);
    };

    let args = action_args(out, forwarded);
    let code = process::run_streamed(&script, args.as_slice(), Some(cwd)).await?;
    Ok(Some(code))
}
