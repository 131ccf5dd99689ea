//! Makes - CLI entry point

use clap::error::ErrorKind;
use clap::Parser;
use makes::cli::commands::run::USAGE_EXIT_CODE;
use makes::cli::Cli;
use makes::config::{BuildMode, Config};
use makes::error::MakesResult;
use makes::ui;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            ui::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> MakesResult<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are not errors; anything else is a usage error
            let _ = e.print();
            return Ok(match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => USAGE_EXIT_CODE,
            });
        }
    };

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("makes=warn"),
        1 => EnvFilter::new("makes=info"),
        _ => EnvFilter::new("makes=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    ui::banner();

    let config = Config::from_env()?;
    if config.k8s_compat {
        ui::notice("Using feature flag: K8S_COMPAT");
    }
    if config.mode == BuildMode::Unstable {
        ui::notice("Using feature flag: NIX_UNSTABLE");
    }

    makes::cli::commands::run(cli, &config).await
}
