//! scout-pipeline - Top-gainer scrape, leverage merge and result writer.
//!
//! A run collects the leverage table, then the ranked gainers, tags each
//! gainer by whether its exchange code qualifies for the target multiplier,
//! and writes the qualifying-first result to CSV and XLSX.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod collector;
pub mod context;
pub mod error;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod report;

pub use collector::{parse_exchange_code, GainersCollector, LeverageCollector};
pub use context::RunContext;
pub use error::PipelineError;
pub use merge::merge;
pub use model::{GainerRecord, LeverageRecord, LeverageTable, LeverageTag, MergedRecord, QualifyingSet};
pub use orchestrator::{Orchestrator, RunOutcome, RunState};
pub use output::{read_csv, read_rows, reorder, OutputRow, ResultWriter, CSV_HEADER};
pub use report::RunSummary;
