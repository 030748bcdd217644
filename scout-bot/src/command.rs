//! Chat command grammar.

/// Largest row count a user can ask for.
pub const MAX_ROWS: usize = 100;

pub const HELP_TEXT: &str = "Stock Scraper Bot

Send a number (1-100) to get top X gainers:
Example: 20 (for top 20 gainers)

Commands:
/top10 - Top 10
/top25 - Top 25
/top50 - Top 50
/all - All 100
/refresh - Run fresh scrape";

pub const OUT_OF_RANGE_TEXT: &str = "Please send a number between 1 and 100";
pub const UNKNOWN_TEXT: &str = "Unknown command. Send /start for help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show help
    Start,
    /// Run a scrape and report whether a result file appeared
    Refresh,
    /// Run a scrape and send the first `n` rows plus the file
    Top(usize),
    /// A bare number outside 1..=100
    OutOfRange,
    Unknown,
}

impl Command {
    /// Parse a message. Input is trimmed and lower-cased first.
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        match text.as_str() {
            "/start" => Self::Start,
            "/refresh" => Self::Refresh,
            "/top10" => Self::Top(10),
            "/top25" => Self::Top(25),
            "/top50" => Self::Top(50),
            "/all" => Self::Top(MAX_ROWS),
            digits if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                match digits.parse::<usize>() {
                    Ok(n) if (1..=MAX_ROWS).contains(&n) => Self::Top(n),
                    _ => Self::OutOfRange,
                }
            }
            _ => Self::Unknown,
        }
    }
}
