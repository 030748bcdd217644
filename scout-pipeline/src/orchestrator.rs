//! Sequential run: leverage → gainers → merge → write → report.

use std::fmt;
use std::path::PathBuf;

use scout_browser::DriverLauncher;
use scout_common::Config;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::collector::{GainersCollector, LeverageCollector};
use crate::context::RunContext;
use crate::error::{PipelineError, Result};
use crate::merge::merge;
use crate::model::MergedRecord;
use crate::output::ResultWriter;
use crate::report::{banner, results_table, RunSummary};

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Start,
    LeverageScrape,
    GainersScrape,
    Merge,
    Write,
    Report,
    Done,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::LeverageScrape => "leverage scrape",
            Self::GainersScrape => "gainers scrape",
            Self::Merge => "merge",
            Self::Write => "write",
            Self::Report => "report",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Qualifying-first results
    pub records: Vec<MergedRecord>,
    pub summary: RunSummary,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
    pub csv_written: bool,
    pub xlsx_written: bool,
}

/// Runs the collectors and writers in fixed order. No retries.
pub struct Orchestrator<L: DriverLauncher> {
    launcher: L,
    leverage: LeverageCollector,
    gainers: GainersCollector,
    writer: ResultWriter,
    target: String,
    print: bool,
}

impl<L: DriverLauncher> Orchestrator<L> {
    pub fn new(launcher: L, config: &Config) -> Self {
        let target = config.output.target_multiplier.clone();
        Self {
            launcher,
            leverage: LeverageCollector::new(config.leverage.clone(), target.clone()),
            gainers: GainersCollector::new(config.gainers.clone()),
            writer: ResultWriter::new(target.clone()),
            target,
            print: true,
        }
    }

    /// Skip console output; the summary is still logged.
    pub fn quiet(mut self) -> Self {
        self.print = false;
        self
    }

    pub async fn run(&self, ctx: &RunContext) -> Result<RunOutcome> {
        let result = self.execute(ctx).await;
        match &result {
            Ok(_) => enter(RunState::Done),
            Err(e) => {
                enter(RunState::Aborted);
                error!(error = %e, "Run aborted");
            }
        }
        result
    }

    async fn execute(&self, ctx: &RunContext) -> Result<RunOutcome> {
        enter(RunState::Start);
        info!(timestamp = ctx.timestamp(), target = %self.target, "Starting run");

        enter(RunState::LeverageScrape);
        let table = self
            .leverage
            .collect(&self.launcher)
            .await
            .map_err(|e| PipelineError::aborted(RunState::LeverageScrape, e))?;
        if table.qualifying().is_empty() {
            return Err(PipelineError::aborted(
                RunState::LeverageScrape,
                PipelineError::NoQualifyingCodes {
                    target: self.target.clone(),
                },
            ));
        }
        let leverage_entries = table.len();

        enter(RunState::GainersScrape);
        let gainers = self
            .gainers
            .collect(&self.launcher)
            .await
            .map_err(|e| PipelineError::aborted(RunState::GainersScrape, e))?;
        if gainers.is_empty() {
            return Err(PipelineError::aborted(
                RunState::GainersScrape,
                PipelineError::NoGainers,
            ));
        }

        enter(RunState::Merge);
        let merged = merge(&gainers, table.qualifying());

        enter(RunState::Write);
        let records = self.writer.persist(ctx, &merged);
        let csv_written = ctx.csv_path().is_file();
        let xlsx_written = ctx.xlsx_path().is_file();
        if !csv_written && !xlsx_written {
            warn!(dir = ?ctx.csv_path().parent(), "No result files were written");
        } else if !csv_written {
            warn!(path = %ctx.csv_path().display(), "CSV result file was not written");
        }

        enter(RunState::Report);
        let summary = RunSummary::new(&records, leverage_entries, ctx.elapsed());
        if self.print {
            let rows = self.writer.rows(&records);
            println!("\n{}", banner("FINAL RESULTS"));
            println!("{}", results_table(&rows));
            println!("\n{}", summary.render(&self.target));
        }
        summary.log(&self.target);

        Ok(RunOutcome {
            records,
            summary,
            csv_path: ctx.csv_path().to_path_buf(),
            xlsx_path: ctx.xlsx_path().to_path_buf(),
            csv_written,
            xlsx_written,
        })
    }
}

fn enter(state: RunState) {
    info!(state = %state, "Entering stage");
}
