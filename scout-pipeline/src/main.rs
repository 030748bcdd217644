//! scout - one batch run of the top-gainer / leverage scrape.
//!
//! Takes no arguments. Exits 0 when the result CSV was produced, 1 when the
//! run aborted or the CSV could not be saved.

use std::process::ExitCode;

use anyhow::Result;
use scout_browser::{ChromeLauncher, SessionConfig};
use scout_common::config::Config;
use scout_common::logging::init_logging_with_exclusions;
use scout_pipeline::report::banner;
use scout_pipeline::{Orchestrator, RunContext};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => {
            println!("\nScraping completed successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            println!("\nScraping failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::load_and_validate()?;

    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("scout v{}", env!("CARGO_PKG_VERSION"));

    let ctx = RunContext::new(&config.output);
    println!(
        "{}",
        banner(&format!(
            "TOP GAINERS x {}X LEVERAGE SCOUT",
            config.output.target_multiplier
        ))
    );

    let launcher = ChromeLauncher::new(SessionConfig::from(&config.browser));
    let orchestrator = Orchestrator::new(launcher, &config);
    let outcome = orchestrator.run(&ctx).await?;

    tracing::info!(
        csv = %outcome.csv_path.display(),
        xlsx = %outcome.xlsx_path.display(),
        "Run complete"
    );
    if !outcome.csv_written {
        anyhow::bail!(
            "results were not saved to {}",
            outcome.csv_path.display()
        );
    }
    Ok(())
}
