//! scout-bot - answers Telegram commands by running the scout scrape.

use std::time::Duration;

use anyhow::{Context, Result};
use scout_bot::{Bot, ProcessJob, TelegramClient};
use scout_common::config::Config;
use scout_common::logging::init_logging_with_exclusions;
use scout_common::Validate;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_with_env()?;

    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    tracing::info!("scout-bot v{}", env!("CARGO_PKG_VERSION"));

    config
        .bot
        .validate()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Invalid bot configuration (set TELEGRAM_BOT_TOKEN)")?;
    let token = config.bot.bot_token.clone().unwrap_or_default();

    let binary = ProcessJob::resolve_binary(&config.bot.job_binary).with_context(|| {
        format!(
            "Scrape job binary not found: {}",
            config.bot.job_binary.display()
        )
    })?;
    let job = ProcessJob::new(binary, Duration::from_secs(config.bot.job_timeout_secs));
    tracing::info!(binary = %job.binary().display(), "Using scrape job");

    let client = TelegramClient::with_base_url(token, &config.bot.api_base_url);
    let bot = Bot::from_config(client, job, &config);

    tokio::select! {
        () = bot.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}
