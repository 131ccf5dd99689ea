//! Run command - check out, build and act on one output

use crate::cache::CloneCache;
use crate::cleanup::Cleanup;
use crate::cli::args::Cli;
use crate::config::Config;
use crate::engine::{
    execute_action, push_to_cache, visible_outputs, BuildInvocation, BuildRequest, Introspector,
    Target,
};
use crate::error::{MakesError, MakesResult};
use crate::process;
use crate::source::{CheckoutBuilder, SourceReference};
use crate::ui::{TaskSpinner, UiContext, Usage};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Exit code for usage errors and help screens
pub const USAGE_EXIT_CODE: i32 = 1;

/// Execute one invocation, returning the process exit code
///
/// Temporary directories created along the way are removed before this
/// returns, on success and on error alike.
pub async fn execute(cli: Cli, config: &Config) -> MakesResult<i32> {
    let Some(source) = cli.source else {
        Usage::default().print();
        return Ok(USAGE_EXIT_CODE);
    };

    let cwd = env::current_dir().map_err(|e| MakesError::io("getting current directory", e))?;
    let mut cleanup = Cleanup::new();
    let run = Run::new(config, &cwd, &mut cleanup)?;

    match cli.output {
        None => run.show_outputs(&source, &mut cleanup).await,
        Some(output) => run.build_output(&source, &output, &cli.args, &mut cleanup).await,
    }
}

/// State shared by the steps of one invocation
struct Run<'a> {
    config: &'a Config,
    cwd: &'a Path,
    cache: CloneCache,
    scratch: PathBuf,
    ctx: UiContext,
}

impl<'a> Run<'a> {
    fn new(config: &'a Config, cwd: &'a Path, cleanup: &mut Cleanup) -> MakesResult<Self> {
        let scratch_dir = tempfile::Builder::new()
            .prefix("makes-out-")
            .tempdir()
            .map_err(|e| MakesError::io("creating output directory", e))?;
        let scratch = scratch_dir.path().to_path_buf();
        cleanup.adopt(scratch_dir);

        Ok(Self {
            config,
            cwd,
            cache: CloneCache::new(config.sources_cache_dir()),
            scratch,
            ctx: UiContext::detect(),
        })
    }

    /// No output requested: list what can be built
    async fn show_outputs(&self, source: &str, cleanup: &mut Cleanup) -> MakesResult<i32> {
        match self.prepare(source, cleanup).await {
            Ok((_, outputs)) => {
                Usage {
                    source: Some(source),
                    outputs: Some(visible_outputs(&outputs).collect()),
                    failed: false,
                }
                .print();
                Ok(USAGE_EXIT_CODE)
            }
            Err(e) => {
                Usage {
                    source: Some(source),
                    outputs: None,
                    failed: true,
                }
                .print();
                eprintln!();
                Err(e)
            }
        }
    }

    /// Build `output` and hand over to its action
    async fn build_output(
        &self,
        source: &str,
        output: &str,
        args: &[String],
        cleanup: &mut Cleanup,
    ) -> MakesResult<i32> {
        let (head, outputs) = self.prepare(source, cleanup).await?;

        if !outputs.iter().any(|o| o == output) {
            Usage {
                source: Some(source),
                outputs: Some(visible_outputs(&outputs).collect()),
                failed: false,
            }
            .print();
            return Ok(USAGE_EXIT_CODE);
        }

        let mut spinner = TaskSpinner::new(&self.ctx);
        spinner.start(&format!("Reading cache configuration of {}...", source));
        let introspector = Introspector::new(self.config, &self.scratch);
        let cache_config = introspector.cache_config(source, &head).await;
        spinner.clear();
        let cache_config = cache_config?;

        let out = self.scratch.join(out_link_name(output));
        let request = BuildRequest {
            attr: Target::Output(output).attr_path(self.config.mode, &head),
            cache: Some(&cache_config),
            head: &head,
            out_link: Some(&out),
        };
        let execution_id = Uuid::new_v4().simple().to_string();
        let invocation = BuildInvocation::new(self.config, &execution_id, &request);

        info!("Building {} from {}", output, source);
        let code =
            process::run_streamed(&invocation.program, invocation.args.as_slice(), None).await?;
        if code != 0 {
            debug!("Build of {} exited with code {}", output, code);
            return Ok(code);
        }

        push_to_cache(self.config, &cache_config, &out).await;

        match execute_action(&out, args, self.cwd).await? {
            Some(code) => Ok(code),
            None => Ok(0),
        }
    }

    /// Check out `source` and list its outputs
    async fn prepare(
        &self,
        source: &str,
        cleanup: &mut Cleanup,
    ) -> MakesResult<(PathBuf, Vec<String>)> {
        let reference = SourceReference::parse(source, self.cwd)?;
        let head = CheckoutBuilder::new(&self.cache)
            .build(source, &reference, cleanup)
            .await?;

        let mut spinner = TaskSpinner::new(&self.ctx);
        spinner.start(&format!("Listing outputs of {}...", source));
        let outputs = Introspector::new(self.config, &self.scratch)
            .list_outputs(source, &head)
            .await;
        spinner.clear();

        Ok((head, outputs?))
    }
}

/// Result link name for an output; `/` would otherwise create directories
pub fn out_link_name(output: &str) -> String {
    format!("result{}", output.replace('/', "-"))
}
