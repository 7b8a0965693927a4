use std::{hint::black_box, time::Duration};

use anyhow::{bail, Context as _};
use tokio_util::sync::CancellationToken;

use super::{bounded::BoundedExecutor, result::*, testcase::*};
use crate::{engine::EngineKind, memory::MemoryProbe};

/// Turns one [`TestCase`] into a bounded matching operation and its outcome
/// into a [`Report`].
#[derive(Debug, Clone)]
pub struct CaseRunner {
    executor: BoundedExecutor,
    engine: EngineKind,
    time_unit: TimeUnit,
    pump_repeat: usize,
}

impl CaseRunner {
    pub const DEFAULT_PUMP_REPEAT: usize = 32;

    pub fn new(engine: EngineKind) -> Self {
        Self {
            executor: BoundedExecutor::new(),
            engine,
            time_unit: TimeUnit::default(),
            pump_repeat: Self::DEFAULT_PUMP_REPEAT,
        }
    }

    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    pub fn pump_repeat(mut self, n: usize) -> Self {
        self.pump_repeat = n;
        self
    }

    pub fn interrupt_token(mut self, token: CancellationToken) -> Self {
        self.executor = self.executor.interrupt_token(token);
        self
    }

    pub fn get_engine(&self) -> EngineKind {
        self.engine
    }

    /// Compiles the pattern and runs a full-string match against the case's
    /// literal input, bounded by `timeout`. The match result is discarded;
    /// only its cost is reported.
    pub async fn run(&self, testcase: &TestCase, timeout: Duration, measure_memory: bool) -> Report {
        let engine = self.engine;
        let pump_repeat = self.pump_repeat;
        let case = testcase.clone();
        let pattern = testcase.pattern.clone();

        // The haystack is built on the worker so a huge `pump_repeat` is
        // bounded by the deadline and fails as this case only.
        let op = move |cancel: &CancellationToken| -> anyhow::Result<Option<u64>> {
            let haystack = case.literal_input(pump_repeat)?;
            log::debug!(
                "running /{}/ against {} bytes with the {} engine",
                pattern,
                haystack.len(),
                engine
            );
            let probe = measure_memory.then(MemoryProbe::start);

            let mut matcher = engine.compile(&pattern)?;
            if cancel.is_cancelled() {
                bail!("Cancelled after compiling /{}/", pattern);
            }
            let matched = matcher
                .is_full_match(&haystack)
                .with_context(|| format!("Failed to match /{}/", pattern))?;
            black_box(matched);

            // Read while the compiled matcher is still alive.
            let memory = probe.map(MemoryProbe::finish);
            drop(matcher);
            Ok(memory)
        };

        let outcome = self.executor.run(op, timeout).await;
        match &outcome {
            Outcome::TimedOut => log::warn!("/{}/ abandoned after {:?}", testcase.pattern, timeout),
            Outcome::Failed { kind, message } => {
                log::info!("/{}/ failed ({:?}): {}", testcase.pattern, kind, message)
            }
            Outcome::Completed { .. } => (),
        }
        let measurement = Measurement::from_outcome(outcome, timeout);
        Report::new(testcase.clone(), measurement, self.time_unit)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::exploit::PumpSpec;

    struct X {
        testcase: TestCase,
        engine: EngineKind,
        want_error: Option<ErrorKind>,
    }

    async fn run_test(x: X) -> Report {
        let r = CaseRunner::new(x.engine).time_unit(TimeUnit::Millis);
        let report = dbg!(r.run(&x.testcase, Duration::from_secs(5), false).await);
        assert_eq!(report.error(), x.want_error);
        report
    }

    #[tokio::test]
    async fn should_complete_on_match() {
        let report = run_test(X {
            testcase: TestCase::new("(a|b)*c", "ababc"),
            engine: EngineKind::Meta,
            want_error: None,
        })
        .await;
        assert!(report.time().is_some());
        assert_eq!(report.memory_used(), None);
    }

    #[tokio::test]
    async fn should_complete_on_mismatch() {
        let report = run_test(X {
            testcase: TestCase::new("(a|b)*c", "ababx"),
            engine: EngineKind::PikeVm,
            want_error: None,
        })
        .await;
        assert!(report.time().is_some());
    }

    #[tokio::test]
    async fn should_be_execution_error_on_bad_pattern() {
        let report = run_test(X {
            testcase: TestCase::new("(a|b", "ab"),
            engine: EngineKind::Meta,
            want_error: Some(ErrorKind::Execution),
        })
        .await;
        assert!(report.error_detail().unwrap().contains("Invalid pattern"));
    }

    #[tokio::test]
    async fn should_render_exploit_in_report() {
        let report = run_test(X {
            testcase: TestCase::with_exploit("(a|a)*b", PumpSpec::eda("", "a", "!")),
            engine: EngineKind::Backtrack,
            want_error: None,
        })
        .await;
        assert_eq!(report.exploit, "a...a!");
        assert!(report.to_string().starts_with("regex: (a|a)*b\nexploit: a...a!\n"));
    }

    #[tokio::test]
    async fn memory_is_reported_when_requested() {
        let r = CaseRunner::new(EngineKind::Meta);
        let report = r.run(&TestCase::new("a+", "aaa"), Duration::from_secs(5), true).await;
        // Without the tracking allocator the probe reads zero, never negative.
        assert!(report.memory_used().is_some());
    }

    #[tokio::test]
    async fn oversized_exploit_is_an_execution_error() {
        let t = TestCase::with_exploit("(a|a)*b", PumpSpec::eda("", "ab", "!"));
        let r = CaseRunner::new(EngineKind::Meta).pump_repeat(usize::MAX);
        let report = r.run(&t, Duration::from_secs(2), false).await;
        assert_eq!(report.error(), Some(ErrorKind::Execution));
        assert!(report.error_detail().unwrap().contains("does not fit"));
        assert_eq!(report.exploit, "ab...ab!");
    }

    #[tokio::test]
    async fn interrupted_runner_reports_interrupted() {
        let token = CancellationToken::new();
        token.cancel();
        let r = CaseRunner::new(EngineKind::Meta).interrupt_token(token);
        let report = r.run(&TestCase::new("a", "a"), Duration::from_secs(5), false).await;
        assert_eq!(report.error(), Some(ErrorKind::Interrupted));
    }
}
