mod config;
mod logging;
mod parse;

use clap::{Parser, Subcommand};
use collector::config::ValidationError;
use collector::errors::CollectorError;
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "reportd", version, about = "Browser report collector")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "REPORTD_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the collector
    Serve,
    /// Run a report file through the parser and print the normalized records
    Parse(parse::ParseArgs),
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Metrics(#[from] logging::MetricsInitError),
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error(transparent)]
    Parse(#[from] parse::ParseCommandError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "reportd failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        CliCommand::Serve => {
            config
                .collector
                .override_port(std::env::var("PORT").ok().as_deref())?;
            config.collector.validate()?;

            let _sentry = logging::init_logging(&config.common.logging);
            if let Some(metrics) = &config.common.metrics {
                logging::init_metrics(metrics)?;
            }

            tracing::info!("starting collector");
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(collector::run(config.collector))?;
        }
        CliCommand::Parse(args) => {
            let _sentry = logging::init_logging(&config.common.logging);
            println!("{}", parse::run(&args)?);
        }
        CliCommand::CheckConfig => {
            config.collector.validate()?;
            println!("config ok");
        }
    }

    Ok(())
}
