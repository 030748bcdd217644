//! Result ordering and the CSV/XLSX writers.
//!
//! Both files carry the same three columns in the same order. The CSV is
//! UTF-8 with a byte-order mark so spreadsheet tools pick the right encoding.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::context::RunContext;
use crate::error::{PipelineError, Result};
use crate::model::{LeverageTag, MergedRecord};

pub const CSV_HEADER: [&str; 3] = ["Stock Name", "NSE", "Leverage"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SHEET_NAME: &str = "Top Gainers";

/// One output line as it appears on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Stock Name")]
    pub name: String,
    #[serde(rename = "NSE")]
    pub code: String,
    #[serde(rename = "Leverage")]
    pub leverage: String,
}

impl OutputRow {
    pub fn from_record(record: &MergedRecord, target: &str) -> Self {
        Self {
            name: record.display_name.clone(),
            code: record.exchange_code.clone(),
            leverage: record.leverage_tag.label(target),
        }
    }

    pub fn to_record(&self) -> MergedRecord {
        MergedRecord {
            display_name: self.name.clone(),
            exchange_code: self.code.clone(),
            leverage_tag: LeverageTag::from_label(&self.leverage),
        }
    }
}

/// Qualifying rows first; each group keeps its original relative order.
pub fn reorder(records: &[MergedRecord]) -> Vec<MergedRecord> {
    let (qualifying, rest): (Vec<&MergedRecord>, Vec<&MergedRecord>) = records
        .iter()
        .partition(|record| record.leverage_tag.qualifies());
    qualifying.into_iter().chain(rest).cloned().collect()
}

pub fn write_csv(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_xlsx(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, title) in CSV_HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let line = index as u32 + 1;
        sheet.write_string(line, 0, &row.name)?;
        sheet.write_string(line, 1, &row.code)?;
        sheet.write_string(line, 2, &row.leverage)?;
    }
    sheet.set_column_width(0, 48)?;
    sheet.set_column_width(1, 16)?;
    sheet.set_column_width(2, 10)?;

    workbook.save(path)?;
    Ok(())
}

/// Rows of a previously written CSV, as text.
pub fn read_rows(path: &Path) -> Result<Vec<OutputRow>> {
    let content = fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new().from_reader(content.as_bytes());
    let headers = reader.headers()?;
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(PipelineError::Malformed {
            path: path.to_path_buf(),
            reason: format!("unexpected header {:?}", headers.iter().collect::<Vec<_>>()),
        });
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<OutputRow>, csv::Error>>()?;
    Ok(rows)
}

/// Merged records read back from a CSV written by [`write_csv`].
pub fn read_csv(path: &Path) -> Result<Vec<MergedRecord>> {
    Ok(read_rows(path)?.iter().map(OutputRow::to_record).collect())
}

/// Orders results and writes both output files.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    target: String,
}

impl ResultWriter {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn rows(&self, records: &[MergedRecord]) -> Vec<OutputRow> {
        records
            .iter()
            .map(|record| OutputRow::from_record(record, &self.target))
            .collect()
    }

    /// Reorder and persist. Write failures are logged, never raised; the
    /// reordered list is returned either way.
    pub fn persist(&self, ctx: &RunContext, records: &[MergedRecord]) -> Vec<MergedRecord> {
        let ordered = reorder(records);
        let rows = self.rows(&ordered);

        if let Some(dir) = ctx.csv_path().parent() {
            if !dir.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(dir) {
                    error!(dir = %dir.display(), error = %e, "Failed to create output directory");
                }
            }
        }

        match write_xlsx(ctx.xlsx_path(), &rows) {
            Ok(()) => info!(path = %ctx.xlsx_path().display(), "Saved XLSX"),
            Err(e) => error!(path = %ctx.xlsx_path().display(), error = %e, "Failed to save XLSX"),
        }
        match write_csv(ctx.csv_path(), &rows) {
            Ok(()) => info!(path = %ctx.csv_path().display(), "Saved CSV"),
            Err(e) => error!(path = %ctx.csv_path().display(), error = %e, "Failed to save CSV"),
        }

        ordered
    }
}
