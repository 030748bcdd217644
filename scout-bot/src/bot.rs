//! Poll loop and command handling.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use scout_common::Config;
use scout_pipeline::read_rows;
use tracing::{error, info, warn};

use crate::command::{Command, HELP_TEXT, OUT_OF_RANGE_TEXT, UNKNOWN_TEXT};
use crate::discovery::newest_output;
use crate::format::format_table;
use crate::job::ScrapeJob;
use crate::telegram::{TelegramClient, Update, User};

/// Pause after a failed poll.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);
/// Pause between successful polls.
const IDLE_PAUSE: Duration = Duration::from_secs(1);

/// Telegram front-end for the scrape job.
pub struct Bot<J: ScrapeJob> {
    client: TelegramClient,
    job: J,
    output_dir: PathBuf,
    prefix: String,
    allowed_users: Vec<String>,
    poll_timeout_secs: u64,
}

impl<J: ScrapeJob> Bot<J> {
    pub fn new(client: TelegramClient, job: J, output_dir: PathBuf, prefix: String) -> Self {
        Self {
            client,
            job,
            output_dir,
            prefix,
            allowed_users: Vec::new(),
            poll_timeout_secs: 30,
        }
    }

    pub fn from_config(client: TelegramClient, job: J, config: &Config) -> Self {
        Self::new(
            client,
            job,
            config.output.dir.clone(),
            config.output.prefix.clone(),
        )
        .with_allowed_users(config.bot.allowed_users.clone())
        .with_poll_timeout(config.bot.poll_timeout_secs)
    }

    /// Restrict commands to these usernames or numeric ids. `*` allows all.
    pub fn with_allowed_users(mut self, users: Vec<String>) -> Self {
        self.allowed_users = users;
        self
    }

    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    /// Poll forever.
    pub async fn run(&self) {
        let mut offset = 0;
        info!("Bot started, waiting for messages");

        loop {
            match self.poll_once(offset).await {
                Ok(next) => {
                    offset = next;
                    tokio::time::sleep(IDLE_PAUSE).await;
                }
                Err(e) => {
                    warn!(error = %e, "Telegram poll error");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }

    /// Fetch and handle one batch of updates; returns the next offset.
    pub async fn poll_once(&self, offset: i64) -> Result<i64> {
        let updates = self
            .client
            .get_updates(offset, self.poll_timeout_secs)
            .await?;

        let mut next = offset;
        for update in &updates {
            next = update.update_id + 1;
            self.handle_update(update).await;
        }
        Ok(next)
    }

    pub async fn handle_update(&self, update: &Update) {
        let Some(message) = &update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let chat_id = message.chat.id;

        if !self.is_allowed(message.from.as_ref()) {
            warn!(chat_id, "Ignoring message from unauthorized user");
            return;
        }

        info!(chat_id, text = %text, "Message received");
        self.handle_command(chat_id, Command::parse(text)).await;
    }

    pub async fn handle_command(&self, chat_id: i64, command: Command) {
        match command {
            Command::Start => self.reply(chat_id, HELP_TEXT).await,
            Command::Refresh => self.refresh(chat_id).await,
            Command::Top(limit) => self.send_top(chat_id, limit).await,
            Command::OutOfRange => self.reply(chat_id, OUT_OF_RANGE_TEXT).await,
            Command::Unknown => self.reply(chat_id, UNKNOWN_TEXT).await,
        }
    }

    async fn refresh(&self, chat_id: i64) {
        self.reply(
            chat_id,
            "Running scraper... This may take 5-10 minutes. Please wait...",
        )
        .await;

        if let Err(e) = self.job.run().await {
            error!(error = %e, "Scrape job failed");
            self.reply(chat_id, "Error running scraper. Try again.").await;
            return;
        }

        match self.latest_output() {
            Some(_) => self.reply(chat_id, "Scraping complete! Getting data...").await,
            None => {
                self.reply(chat_id, "Scraping complete but couldn't find CSV file")
                    .await
            }
        }
    }

    async fn send_top(&self, chat_id: i64, limit: usize) {
        self.reply(chat_id, &format!("Fetching top {limit} gainers..."))
            .await;

        if let Err(e) = self.job.run().await {
            error!(error = %e, "Scrape job failed");
            self.reply(chat_id, "Error running scraper").await;
            return;
        }

        let Some(csv) = self.latest_output() else {
            self.reply(chat_id, "Error: CSV file not found").await;
            return;
        };

        let rows = match read_rows(&csv) {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                self.reply(chat_id, "Error reading data").await;
                return;
            }
            Err(e) => {
                error!(path = %csv.display(), error = %e, "Failed to read results");
                self.reply(chat_id, "Error reading data").await;
                return;
            }
        };

        let shown = &rows[..limit.min(rows.len())];
        self.reply(chat_id, &format_table(shown)).await;

        if let Err(e) = self.client.send_document(chat_id, &csv).await {
            error!(chat_id, error = %e, "Failed to send results file");
        }
    }

    fn latest_output(&self) -> Option<PathBuf> {
        match newest_output(&self.output_dir, &self.prefix) {
            Ok(Some(path)) => {
                info!(path = %path.display(), "Found results file");
                Some(path)
            }
            Ok(None) => None,
            Err(e) => {
                error!(dir = %self.output_dir.display(), error = %e, "Failed to scan output directory");
                None
            }
        }
    }

    fn is_allowed(&self, user: Option<&User>) -> bool {
        if self.allowed_users.is_empty() {
            return true;
        }
        let Some(user) = user else {
            return false;
        };
        let id = user.id.to_string();
        self.allowed_users.iter().any(|allowed| {
            allowed == "*" || *allowed == id || user.username.as_deref() == Some(allowed.as_str())
        })
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.client.send_message(chat_id, text).await {
            error!(chat_id, error = %e, "Failed to send message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoopJob;

    #[async_trait]
    impl ScrapeJob for NoopJob {
        async fn run(&self) -> scout_common::Result<()> {
            Ok(())
        }
    }

    fn bot(allowed: &[&str]) -> Bot<NoopJob> {
        Bot::new(
            TelegramClient::new("token"),
            NoopJob,
            PathBuf::from("."),
            "Gainers".into(),
        )
        .with_allowed_users(allowed.iter().map(|s| s.to_string()).collect())
    }

    fn user(id: i64, username: Option<&str>) -> User {
        User {
            id,
            username: username.map(String::from),
        }
    }

    #[test]
    fn test_empty_allow_list_admits_everyone() {
        let bot = bot(&[]);
        assert!(bot.is_allowed(None));
        assert!(bot.is_allowed(Some(&user(1, None))));
    }

    #[test]
    fn test_allow_list_by_username_or_id() {
        let bot = bot(&["alice", "42"]);
        assert!(bot.is_allowed(Some(&user(7, Some("alice")))));
        assert!(bot.is_allowed(Some(&user(42, None))));
        assert!(!bot.is_allowed(Some(&user(8, Some("eve")))));
        assert!(!bot.is_allowed(None));
    }

    #[test]
    fn test_wildcard() {
        assert!(bot(&["*"]).is_allowed(Some(&user(99, Some("anyone")))));
    }
}
