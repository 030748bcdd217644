//! scout-bot - Telegram command layer for the scout scrape.
//!
//! Each request runs the `scout` batch job, finds the newest result file,
//! and replies with the first N rows plus the file itself.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod bot;
pub mod command;
pub mod discovery;
pub mod format;
pub mod job;
pub mod telegram;

pub use bot::Bot;
pub use command::Command;
pub use discovery::newest_output;
pub use format::format_table;
pub use job::{ProcessJob, ScrapeJob};
pub use telegram::TelegramClient;
