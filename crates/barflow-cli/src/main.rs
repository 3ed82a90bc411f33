mod cli;
mod error;
mod logging;

use std::io::ErrorKind;
use std::path::Path;
use std::process::ExitCode;

use barflow_core::{flatten_dedup, write_json, Config, Orchestrator, PolygonClient, RunReport};
use clap::Parser;
use tracing::{error, info};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = %error, "run failed");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    load_dotenv(dotenvy::dotenv())?;
    logging::init(&cli.log_file)?;

    let config = Config::from_env()?;
    let query = cli.query()?;

    let client = PolygonClient::new(config.base_url.clone(), config.api_key.clone())
        .with_retry(config.retry())
        .with_timeout_ms(config.timeout_ms);
    info!(base_url = %client.base_url(), "initialized API client");

    let report = Orchestrator::new(client).run(&cli.tickers, &query).await;
    save_report(&report, &cli.output)?;
    Ok(())
}

/// A missing `.env` is fine since variables may come from the real
/// environment. One that exists but does not parse is a config error.
fn load_dotenv<T>(loaded: Result<T, dotenvy::Error>) -> Result<(), CliError> {
    match loaded {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(error)) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(CliError::Dotenv(error)),
    }
}

/// Flatten, deduplicate, and save `report` to `output`, returning the number
/// of rows written.
///
/// The file is written even when every ticker failed; that case is still
/// reported as [`CliError::NoSuccessfulTickers`] afterwards.
fn save_report(report: &RunReport, output: &Path) -> Result<usize, CliError> {
    let saved = flatten_dedup(&report.outcomes)
        .and_then(|rows| write_json(output, &rows).map(|()| rows.len()));
    let rows = match saved {
        Ok(rows) => {
            info!(
                path = %output.display(),
                rows,
                "successfully deduped and saved results"
            );
            rows
        }
        Err(cause) => {
            error!(error = %cause, "error during deduplication or saving results");
            return Err(cause.into());
        }
    };

    if !report.outcomes.is_empty() && report.succeeded() == 0 {
        return Err(CliError::NoSuccessfulTickers {
            failed: report.failed(),
        });
    }

    Ok(rows)
}
