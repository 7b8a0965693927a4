use std::time::Duration;

use crate::testing::{CaseRunner, Report, TestCase};

/// Runs cases strictly one after another; case N+1 starts only after the
/// runner returned for case N. Reports come back in input order.
#[derive(Debug, Clone)]
pub struct BatchPipeline {
    runner: CaseRunner,
}

impl BatchPipeline {
    pub fn new(runner: CaseRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &CaseRunner {
        &self.runner
    }

    pub async fn run_all(
        &self,
        cases: &[TestCase],
        timeout: Duration,
        measure_memory: bool,
    ) -> Vec<Report> {
        self.run_each(cases, timeout, measure_memory, |_, _| ()).await
    }

    /// Like [`BatchPipeline::run_all`], calling `on_report(index, report)` as
    /// soon as each case finishes.
    pub async fn run_each<F>(
        &self,
        cases: &[TestCase],
        timeout: Duration,
        measure_memory: bool,
        mut on_report: F,
    ) -> Vec<Report>
    where
        F: FnMut(usize, &Report),
    {
        let mut reports = Vec::with_capacity(cases.len());
        for (i, t) in cases.iter().enumerate() {
            log::info!("[{}/{}] /{}/", i + 1, cases.len(), t.pattern);
            let report = self.runner.run(t, timeout, measure_memory).await;
            on_report(i, &report);
            reports.push(report);
        }
        reports
    }
}
