//! Command handling against a mock Telegram API.

use std::path::PathBuf;

use async_trait::async_trait;
use scout_bot::{Bot, Command, ScrapeJob, TelegramClient};
use scout_pipeline::output::{write_csv, OutputRow};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TOKEN: &str = "123:TEST";
const PREFIX: &str = "Gainers";

/// Writes a fixed result file, like a successful scrape would.
struct WriteCsvJob {
    dir: PathBuf,
    rows: Vec<OutputRow>,
}

#[async_trait]
impl ScrapeJob for WriteCsvJob {
    async fn run(&self) -> scout_common::Result<()> {
        let path = self.dir.join(format!("{PREFIX}_20240102_030405.csv"));
        write_csv(&path, &self.rows)
            .map_err(|e| scout_common::Error::Job(e.to_string()))
    }
}

struct FailingJob;

#[async_trait]
impl ScrapeJob for FailingJob {
    async fn run(&self) -> scout_common::Result<()> {
        Err(scout_common::Error::Timeout)
    }
}

struct NoopJob;

#[async_trait]
impl ScrapeJob for NoopJob {
    async fn run(&self) -> scout_common::Result<()> {
        Ok(())
    }
}

fn rows(n: usize) -> Vec<OutputRow> {
    (1..=n)
        .map(|i| OutputRow {
            name: format!("Stock {i}"),
            code: format!("S{i}"),
            leverage: if i % 2 == 0 { "NA".into() } else { "5x".into() },
        })
        .collect()
}

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;
    let ok = ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}}));
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ok.clone())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendDocument")))
        .respond_with(ok)
        .mount(&server)
        .await;
    server
}

async fn requests_to(server: &MockServer, api_method: &str) -> Vec<Request> {
    let suffix = format!("/{api_method}");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().ends_with(&suffix))
        .collect()
}

async fn sent_texts(server: &MockServer) -> Vec<String> {
    requests_to(server, "sendMessage")
        .await
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

fn client(server: &MockServer) -> TelegramClient {
    TelegramClient::with_base_url(TOKEN, server.uri())
}

#[tokio::test]
async fn test_top_sends_table_then_document() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let job = WriteCsvJob {
        dir: dir.path().to_path_buf(),
        rows: rows(30),
    };
    let bot = Bot::new(client(&server), job, dir.path().to_path_buf(), PREFIX.into());

    bot.handle_command(42, Command::Top(10)).await;

    let texts = sent_texts(&server).await;
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "Fetching top 10 gainers...");
    assert!(texts[1].starts_with("Top Gainers with Leverage"));
    assert!(texts[1].contains(" 1. Stock 1"));
    assert!(texts[1].contains("10. Stock 10"));
    assert!(!texts[1].contains("Stock 11"));

    let documents = requests_to(&server, "sendDocument").await;
    assert_eq!(documents.len(), 1);
    let body = String::from_utf8_lossy(&documents[0].body);
    assert!(body.contains("Gainers_20240102_030405.csv"));
    assert!(body.contains("Stock Name,NSE,Leverage"));
}

#[tokio::test]
async fn test_limit_larger_than_results() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let job = WriteCsvJob {
        dir: dir.path().to_path_buf(),
        rows: rows(3),
    };
    let bot = Bot::new(client(&server), job, dir.path().to_path_buf(), PREFIX.into());

    bot.handle_command(42, Command::Top(100)).await;

    let texts = sent_texts(&server).await;
    assert!(texts[1].contains(" 3. Stock 3"));
    assert_eq!(requests_to(&server, "sendDocument").await.len(), 1);
}

#[tokio::test]
async fn test_failed_job_reports_error() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let bot = Bot::new(client(&server), FailingJob, dir.path().to_path_buf(), PREFIX.into());

    bot.handle_command(42, Command::Top(25)).await;
    bot.handle_command(42, Command::Refresh).await;

    let texts = sent_texts(&server).await;
    assert_eq!(
        texts,
        vec![
            "Fetching top 25 gainers...",
            "Error running scraper",
            "Running scraper... This may take 5-10 minutes. Please wait...",
            "Error running scraper. Try again.",
        ]
    );
    assert!(requests_to(&server, "sendDocument").await.is_empty());
}

#[tokio::test]
async fn test_missing_csv() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let bot = Bot::new(client(&server), NoopJob, dir.path().to_path_buf(), PREFIX.into());

    bot.handle_command(42, Command::Refresh).await;
    bot.handle_command(42, Command::Top(10)).await;

    let texts = sent_texts(&server).await;
    assert_eq!(texts[1], "Scraping complete but couldn't find CSV file");
    assert_eq!(texts[3], "Error: CSV file not found");
}

#[tokio::test]
async fn test_refresh_finds_csv() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    let job = WriteCsvJob {
        dir: dir.path().to_path_buf(),
        rows: rows(2),
    };
    let bot = Bot::new(client(&server), job, dir.path().to_path_buf(), PREFIX.into());

    bot.handle_command(7, Command::Refresh).await;

    let texts = sent_texts(&server).await;
    assert_eq!(texts[1], "Scraping complete! Getting data...");
    assert!(requests_to(&server, "sendDocument").await.is_empty());
}

#[tokio::test]
async fn test_poll_once_filters_users_and_advances_offset() {
    let server = mock_api().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"chat": {"id": 1}, "from": {"id": 5, "username": "alice"}, "text": " /START "}},
                {"update_id": 11, "message": {"chat": {"id": 2}, "from": {"id": 6, "username": "eve"}, "text": "/start"}},
                {"update_id": 12, "message": {"chat": {"id": 1}, "from": {"id": 5, "username": "alice"}, "text": "500"}},
                {"update_id": 13, "message": {"chat": {"id": 1}, "from": {"id": 5, "username": "alice"}, "text": "hello"}},
                {"update_id": 14, "edited_message": {"chat": {"id": 1}, "text": "/start"}}
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let bot = Bot::new(client(&server), NoopJob, dir.path().to_path_buf(), PREFIX.into())
        .with_allowed_users(vec!["alice".into()])
        .with_poll_timeout(0);

    let next = bot.poll_once(10).await.unwrap();
    assert_eq!(next, 15);

    let texts = sent_texts(&server).await;
    assert_eq!(texts.len(), 3);
    assert!(texts[0].starts_with("Stock Scraper Bot"));
    assert_eq!(texts[1], "Please send a number between 1 and 100");
    assert_eq!(texts[2], "Unknown command. Send /start for help");

    let poll = requests_to(&server, "getUpdates").await;
    let body: Value = serde_json::from_slice(&poll[0].body).unwrap();
    assert_eq!(body["offset"], 10);
}

#[tokio::test]
async fn test_poll_error_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getUpdates")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let bot = Bot::new(client(&server), NoopJob, dir.path().to_path_buf(), PREFIX.into())
        .with_poll_timeout(0);

    let err = bot.poll_once(0).await.unwrap_err();
    assert!(err.to_string().contains("Unauthorized"));
}
