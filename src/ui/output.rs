//! Diagnostic output
//!
//! Everything here goes to stderr; stdout belongs to the build and the
//! action script.

use crate::error::MakesError;
use crate::VERSION;
use console::style;

/// Print a line to stderr
pub fn announce(message: &str) {
    eprintln!("{}", message);
}

/// Print a line followed by a blank line
pub fn notice(message: &str) {
    eprintln!("{}", message);
    eprintln!();
}

/// Print the version banner
pub fn banner() {
    notice(&format!(
        "Makes v{}-{} (IOHK)",
        VERSION,
        std::env::consts::OS
    ));
}

/// Print an internal error with any captured child output
pub fn report_error(err: &MakesError) {
    let tag = style("[ERROR]").red().bold().for_stderr();
    eprintln!("{} {}", tag, err);
    if let Some((stdout, stderr)) = err.captured() {
        eprintln!("{} Stdout: \n{}", tag, String::from_utf8_lossy(stdout));
        eprintln!("{} Stderr: \n{}", tag, String::from_utf8_lossy(stderr));
    }
    if let Some(hint) = err.hint() {
        eprintln!("{} {}", style("Hint:").yellow().for_stderr(), hint);
    }
}

/// What the usage screen knows so far
#[derive(Debug, Default)]
pub struct Usage<'a> {
    /// The `[SOURCE]` the user gave, if any
    pub source: Option<&'a str>,
    /// Outputs of that source, if they could be listed
    pub outputs: Option<Vec<&'a str>>,
    /// Listing the outputs failed; an error report follows instead of the footer
    pub failed: bool,
}

impl Usage<'_> {
    /// Render the usage screen
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = vec!["Usage: m [SOURCE] [OUTPUT] [ARGS]...".to_string(), String::new()];

        match self.source {
            Some(source) => lines.push(format!("[SOURCE] is currently: {}", source)),
            None => lines.extend(
                [
                    "[SOURCE] can be:",
                    "",
                    "  A Git repository in the current working directory:",
                    "    $ m .",
                    "",
                    "  A GitHub repository and revision (branch, commit or tag):",
                    "    $ m github:owner/repo@rev",
                    "",
                    "  A GitLab repository and revision (branch, commit or tag):",
                    "    $ m gitlab:owner/repo@rev",
                ]
                .map(String::from),
            ),
        }
        lines.push(String::new());

        match &self.outputs {
            Some(outputs) => {
                lines.push("[OUTPUT] can be:".to_string());
                lines.extend(outputs.iter().map(|o| format!("  {}", o)));
            }
            None => {
                lines.push("[OUTPUT] options will be listed when you provide a [SOURCE]".to_string())
            }
        }
        if self.failed {
            return lines.join("\n");
        }
        lines.push(String::new());
        lines.push("[ARGS] are passed to the output (if supported).".to_string());

        lines.join("\n")
    }

    /// Print the usage screen to stderr
    pub fn print(&self) {
        eprintln!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_usage_lists_source_forms() {
        let text = Usage::default().render();
        assert!(text.starts_with("Usage: m [SOURCE] [OUTPUT] [ARGS]..."));
        assert!(text.contains("$ m github:owner/repo@rev"));
        assert!(text.contains("$ m gitlab:owner/repo@rev"));
        assert!(text.contains("[OUTPUT] options will be listed when you provide a [SOURCE]"));
        assert!(text.ends_with("[ARGS] are passed to the output (if supported)."));
    }

    #[test]
    fn usage_with_outputs() {
        let usage = Usage {
            source: Some("."),
            outputs: Some(vec!["/hello", "/lint"]),
            failed: false,
        };
        let text = usage.render();
        assert!(text.contains("[SOURCE] is currently: ."));
        assert!(text.contains("[OUTPUT] can be:\n  /hello\n  /lint"));
        assert!(!text.contains("[SOURCE] can be:"));
    }

    #[test]
    fn failed_listing_omits_footer() {
        let usage = Usage {
            source: Some("github:o/r@main"),
            outputs: None,
            failed: true,
        };
        let text = usage.render();
        assert!(text.contains("[SOURCE] is currently: github:o/r@main"));
        assert!(text.ends_with("[OUTPUT] options will be listed when you provide a [SOURCE]"));
        assert!(!text.contains("[ARGS]"));
    }

    #[test]
    fn report_error_does_not_panic() {
        report_error(&MakesError::clone_failed(
            "git fetch",
            "github:o/r@main",
            b"\xff partial".to_vec(),
            b"fatal: not found".to_vec(),
        ));
    }
}
