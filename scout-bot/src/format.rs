//! Plain-text rendering of result rows for chat.

use std::fmt::Write;

use scout_pipeline::OutputRow;

const NAME_WIDTH: usize = 28;
const CODE_WIDTH: usize = 8;

/// Fixed-width table: `NN. name code leverage`, names cut to 28 characters
/// and codes to 8.
pub fn format_table(rows: &[OutputRow]) -> String {
    let mut message = String::from("Top Gainers with Leverage\n\n");
    let _ = writeln!(
        message,
        "{:<NAME_WIDTH$}  {:<CODE_WIDTH$} Leverage",
        "Stock Name", "NSE"
    );
    message.push_str(&"-".repeat(60));
    message.push('\n');

    for (index, row) in rows.iter().enumerate() {
        let _ = writeln!(
            message,
            "{:2}. {:<NAME_WIDTH$} {:<CODE_WIDTH$} {}",
            index + 1,
            truncate(&row.name, NAME_WIDTH),
            truncate(&row.code, CODE_WIDTH),
            row.leverage
        );
    }
    message
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, code: &str, leverage: &str) -> OutputRow {
        OutputRow {
            name: name.into(),
            code: code.into(),
            leverage: leverage.into(),
        }
    }

    #[test]
    fn test_format_table() {
        let text = format_table(&[
            row("Infosys Ltd", "INFY", "5x"),
            row(
                "A Very Long Company Name That Overflows",
                "LONGCODE123",
                "NA",
            ),
        ]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Top Gainers with Leverage");
        assert_eq!(lines[2], "Stock Name                    NSE      Leverage");
        assert_eq!(lines[3], "-".repeat(60));
        assert_eq!(lines[4], " 1. Infosys Ltd                  INFY     5x");
        assert_eq!(lines[5], " 2. A Very Long Company Name Tha LONGCODE NA");
    }

    #[test]
    fn test_rank_numbers_two_wide() {
        let rows: Vec<OutputRow> = (0..12).map(|i| row(&format!("S{i}"), "X", "NA")).collect();
        let text = format_table(&rows);
        assert!(text.lines().any(|l| l.starts_with("12. S11")));
    }
}
