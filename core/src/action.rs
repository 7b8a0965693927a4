pub mod error {
    pub(crate) use anyhow::Context as _;
    pub use anyhow::{Error, Result};
}

use std::io::{self, Write as _};
use std::time::Duration;

use error::*;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::config::BenchConfig;
use crate::dataset::Dataset;
use crate::memory;
use crate::pipeline::BatchPipeline;
use crate::style::{self, Status};
use crate::testing::{CaseRunner, Report, TestCase};

/// How print mode writes reports to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrintOptions {
    pub json: bool,
    pub summary: bool,
}

pub fn build_pipeline(cfg: &BenchConfig, interrupt: CancellationToken) -> BatchPipeline {
    let runner = CaseRunner::new(cfg.engine)
        .time_unit(cfg.time_unit)
        .pump_repeat(cfg.pump_repeat)
        .interrupt_token(interrupt);
    BatchPipeline::new(runner)
}

/// Runs every case and prints one report block per case as soon as it is
/// done (or a JSON array at the end when `opts.json` is set).
pub async fn run_and_print(
    pipeline: &BatchPipeline,
    cases: &[TestCase],
    timeout: Duration,
    measure_memory: bool,
    opts: PrintOptions,
) -> Result<Vec<Report>> {
    if measure_memory && !memory::is_tracking() {
        log::warn!("Memory tracking allocator is not installed; memory will read as 0");
    }
    log::info!(
        "Running {} case(s) with the {} engine (timeout={:?})",
        cases.len(),
        pipeline.runner().get_engine(),
        timeout
    );

    let mut write_err = None;
    let reports = pipeline
        .run_each(cases, timeout, measure_memory, |_, report| {
            if opts.json || write_err.is_some() {
                return;
            }
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", report).and_then(|_| stdout.flush()) {
                write_err = Some(e);
            }
        })
        .await;
    if let Some(e) = write_err {
        return Err(e).context("Failed to write report to stdout");
    }

    if opts.json {
        serde_json::to_writer_pretty(io::stdout(), &reports)
            .context("Failed to write reports as JSON")?;
        println!();
    }
    if opts.summary {
        style::print_summary(&reports);
    }
    Ok(reports)
}

/// Runs every case of `dataset` and writes each result back under `key`,
/// then rewrites the file. Memory is not measured in this mode.
pub async fn run_and_record(
    pipeline: &BatchPipeline,
    dataset: &mut Dataset,
    timeout: Duration,
    key: &str,
    pretty: bool,
) -> Result<Vec<Report>> {
    let cases = dataset.testcases()?;
    if cases.is_empty() {
        log::warn!("No testcases in {}", dataset.path().to_string_lossy());
    }

    let bar_style = ProgressStyle::default_bar()
        .template("{spinner} [{pos}/{len}] {msg}")
        .context("Invalid progress bar template")?;
    let bar = ProgressBar::new(cases.len() as u64).with_style(bar_style);
    bar.enable_steady_tick(Duration::from_millis(100));

    log::info!(
        "Recording {} case(s) under '{}' into {}",
        cases.len(),
        key,
        dataset.path().to_string_lossy()
    );
    let reports = pipeline
        .run_each(&cases, timeout, false, |_, report| {
            bar.inc(1);
            bar.set_message(format!(
                "{} /{}/",
                style::status_icon(Status::from(report)),
                report.testcase.pattern
            ));
        })
        .await;
    bar.finish_and_clear();

    dataset.record(key, &reports)?;
    dataset
        .save(pretty)
        .with_context(|| format!("Failed to save {}", dataset.path().to_string_lossy()))?;
    style::print_summary(&reports);
    Ok(reports)
}
