//! bi-seed - Main entry point

use bi_seed_cli::{config, report, Cli, RunConfig};
use bi_seed_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

/// Exit status when the run completed but some items failed
const EXIT_ITEM_FAILURES: i32 = 2;
const EXIT_FATAL: i32 = 1;

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // The log guard lives inside `bootstrap`, so buffered file output is
    // flushed before the process exits
    let code = bootstrap(&cli).await;
    if code != 0 {
        process::exit(code);
    }
}

async fn bootstrap(cli: &Cli) -> i32 {
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        })
        .output(LogOutput::Console)
        .build();

    // Environment variables take precedence over flags
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The run still works without logging
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        },
    };

    let vars = config::utf8_vars(std::env::vars_os(), &cli.connection_prefix);
    let config = match RunConfig::from_cli(cli, vars) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        },
    };

    match bi_seed_cli::run(&config).await {
        Ok(summary) => {
            report::print_summary(&summary);
            if cli.fail_on_error && summary.has_failures() {
                EXIT_ITEM_FAILURES
            } else {
                0
            }
        },
        Err(e) => {
            error!(error = %e, "Bootstrap aborted");
            eprintln!("Error: {e}");
            EXIT_FATAL
        },
    }
}
