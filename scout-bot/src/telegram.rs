//! Minimal Telegram Bot API client.
//!
//! Covers the three calls the command layer needs: long-polling for
//! updates, sending text, and uploading a document.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client bound to one bot token.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    bot_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_base_url(bot_token, "https://api.telegram.org")
    }

    /// Point the client at another API host (tests use a mock server).
    pub fn with_base_url(bot_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.bot_token)
    }

    /// Long-poll for updates with id >= `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"]
        });

        let resp: ApiResponse<Vec<Update>> = self
            .client
            .post(self.api_url("getUpdates"))
            .json(&body)
            .timeout(Duration::from_secs(timeout_secs + 10))
            .send()
            .await
            .context("Telegram getUpdates request failed")?
            .json()
            .await
            .context("Telegram getUpdates returned malformed JSON")?;

        if !resp.ok {
            anyhow::bail!(
                "Telegram getUpdates failed: {}",
                resp.description.unwrap_or_default()
            );
        }
        Ok(resp.result.unwrap_or_default())
    }

    /// Send plain text, split into chunks under the message size limit.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.send_single_chunk(chat_id, &chunk).await?;
        }
        Ok(())
    }

    async fn send_single_chunk(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram sendMessage failed: {err}");
        }
        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Upload a file as a document.
    pub async fn send_document(&self, chat_id: i64, file_path: &Path) -> Result<()> {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("results.csv")
            .to_string();

        let file_bytes = tokio::fs::read(file_path)
            .await
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let part = Part::bytes(file_bytes).file_name(file_name.clone());
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let resp = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram sendDocument failed: {err}");
        }

        tracing::info!(chat_id, file = %file_name, "Telegram document sent");
        Ok(())
    }
}

/// Split on line boundaries into chunks of at most `max_len` characters.
/// A single line longer than `max_len` is cut at character boundaries.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.chars().count() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.lines() {
        let mut line: Vec<char> = line.chars().collect();
        while line.len() > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = line.split_off(max_len);
            chunks.push(line.into_iter().collect());
            line = rest;
        }

        let needed = if current.is_empty() {
            line.len()
        } else {
            line.len() + 1
        };
        if current_len + needed > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current_len += line.len();
        current.extend(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = TelegramClient::with_base_url("123:ABC", "http://localhost:8080/");
        assert_eq!(
            client.api_url("getUpdates"),
            "http://localhost:8080/bot123:ABC/getUpdates"
        );
        assert_eq!(
            TelegramClient::new("t").api_url("sendMessage"),
            "https://api.telegram.org/bott/sendMessage"
        );
    }

    #[test]
    fn test_split_message_short() {
        assert_eq!(split_message("hello", 4096), vec!["hello"]);
    }

    #[test]
    fn test_split_message_on_lines() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_split_message_long_line() {
        let chunks = split_message("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_update_deserialize() {
        let json = r#"{"update_id": 7, "message": {"chat": {"id": 42}, "from": {"id": 9, "username": "alice"}, "text": "/top10"}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 7);
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/top10"));
        assert_eq!(message.from.unwrap().username.as_deref(), Some("alice"));
    }
}
