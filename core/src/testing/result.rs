use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use super::testcase::TestCase;

/// Result of one bounded execution. Exactly one variant is produced per call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed {
        elapsed: Duration,
        memory_bytes: Option<u64>,
    },
    /// The deadline passed. The worker may still be running.
    TimedOut,
    Failed {
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The waiting caller was interrupted.
    Interrupted,
    /// The operation itself failed or panicked.
    Execution,
}

/// Error names as they appear in reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
pub enum ErrorKind {
    #[strum(serialize = "TimeoutException")]
    Timeout,
    #[strum(serialize = "InterruptedException")]
    Interrupted,
    #[strum(serialize = "ExecutionException")]
    Execution,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeUnit {
    /// Fractional seconds, e.g. `0.0123`.
    #[default]
    Seconds,
    /// Whole milliseconds, e.g. `12`.
    Millis,
}

impl TimeUnit {
    pub fn format(self, d: Duration) -> String {
        match self {
            TimeUnit::Seconds => d.as_secs_f64().to_string(),
            TimeUnit::Millis => d.as_millis().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Measurement {
    /// `time` is absent when the run completed at or past the deadline.
    Sample {
        time: Option<Duration>,
        memory_used: Option<u64>,
    },
    Error {
        kind: ErrorKind,
        detail: Option<String>,
    },
}

impl Measurement {
    /// Timings that land at or past `timeout` are dropped: they are noise at
    /// the cutoff, not valid samples.
    pub fn from_outcome(outcome: Outcome, timeout: Duration) -> Self {
        match outcome {
            Outcome::Completed {
                elapsed,
                memory_bytes,
            } => Measurement::Sample {
                time: (elapsed < timeout).then_some(elapsed),
                memory_used: memory_bytes,
            },
            Outcome::TimedOut => Measurement::Error {
                kind: ErrorKind::Timeout,
                detail: None,
            },
            Outcome::Failed {
                kind: FailureKind::Interrupted,
                message,
            } => Measurement::Error {
                kind: ErrorKind::Interrupted,
                detail: Some(message),
            },
            Outcome::Failed {
                kind: FailureKind::Execution,
                message,
            } => Measurement::Error {
                kind: ErrorKind::Execution,
                detail: Some(message),
            },
        }
    }
}

/// Printed/persisted result of one [`TestCase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub testcase: TestCase,
    /// Escaped rendering of the haystack.
    pub exploit: String,
    pub measurement: Measurement,
    pub time_unit: TimeUnit,
}

const NA: &str = "NA";

impl Report {
    pub fn new(testcase: TestCase, measurement: Measurement, time_unit: TimeUnit) -> Self {
        Self {
            exploit: testcase.description(),
            testcase,
            measurement,
            time_unit,
        }
    }

    pub fn time(&self) -> Option<String> {
        match &self.measurement {
            Measurement::Sample { time: Some(t), .. } => Some(self.time_unit.format(*t)),
            _ => None,
        }
    }

    pub fn memory_used(&self) -> Option<String> {
        match &self.measurement {
            Measurement::Sample {
                memory_used: Some(m),
                ..
            } => Some(m.to_string()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match &self.measurement {
            Measurement::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        match &self.measurement {
            Measurement::Error { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Single value stored by batch-update mode: the error name, else the
    /// time. `None` when the run completed without a valid timing.
    pub fn recorded_value(&self) -> Option<String> {
        match self.error() {
            Some(kind) => Some(kind.to_string()),
            None => self.time(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "regex: {}", self.testcase.pattern)?;
        writeln!(f, "exploit: {}", self.exploit)?;
        match self.error() {
            Some(kind) => write!(f, "{}", kind),
            None => write!(
                f,
                "{} {}",
                self.time().as_deref().unwrap_or(NA),
                self.memory_used().as_deref().unwrap_or(NA),
            ),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportJson<'a> {
    pattern: &'a str,
    exploit: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

impl Serialize for Report {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ReportJson {
            pattern: &self.testcase.pattern,
            exploit: &self.exploit,
            time: self.time(),
            memory_used: self.memory_used(),
            error: self.error().map(<&'static str>::from),
            detail: self.error_detail(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(3);

    fn report(outcome: Outcome, unit: TimeUnit) -> Report {
        let m = Measurement::from_outcome(outcome, TIMEOUT);
        Report::new(TestCase::new("a+", "aaa"), m, unit)
    }

    #[test]
    fn completed_under_deadline_is_a_sample() {
        let r = report(
            Outcome::Completed {
                elapsed: Duration::from_millis(1500),
                memory_bytes: Some(2048),
            },
            TimeUnit::Seconds,
        );
        assert_eq!(r.time().as_deref(), Some("1.5"));
        assert_eq!(r.memory_used().as_deref(), Some("2048"));
        assert_eq!(r.error(), None);
        assert_eq!(r.to_string(), "regex: a+\nexploit: aaa\n1.5 2048");
    }

    #[test]
    fn millis_are_whole_numbers() {
        let r = report(
            Outcome::Completed {
                elapsed: Duration::from_micros(12_345),
                memory_bytes: None,
            },
            TimeUnit::Millis,
        );
        assert_eq!(r.time().as_deref(), Some("12"));
        assert_eq!(r.to_string(), "regex: a+\nexploit: aaa\n12 NA");
    }

    #[test]
    fn completed_at_or_past_deadline_drops_time() {
        for elapsed in [TIMEOUT, TIMEOUT + Duration::from_millis(1)] {
            let r = report(
                Outcome::Completed {
                    elapsed,
                    memory_bytes: Some(0),
                },
                TimeUnit::Seconds,
            );
            assert_eq!(r.time(), None);
            assert_eq!(r.error(), None);
            assert_eq!(r.recorded_value(), None);
            assert!(r.to_string().ends_with("\nNA 0"));
        }
    }

    #[test]
    fn failures_map_to_exception_names() {
        let cases = [
            (Outcome::TimedOut, "TimeoutException"),
            (
                Outcome::Failed {
                    kind: FailureKind::Interrupted,
                    message: "ctrl-c".into(),
                },
                "InterruptedException",
            ),
            (
                Outcome::Failed {
                    kind: FailureKind::Execution,
                    message: "invalid pattern".into(),
                },
                "ExecutionException",
            ),
        ];
        for (outcome, want) in cases {
            let r = report(outcome, TimeUnit::Seconds);
            assert_eq!(r.recorded_value().as_deref(), Some(want));
            assert_eq!(r.time(), None);
            assert_eq!(r.memory_used(), None);
            assert!(r.to_string().ends_with(&format!("\n{}", want)));
        }
    }

    #[test]
    fn json_omits_absent_fields() {
        let r = report(
            Outcome::Failed {
                kind: FailureKind::Execution,
                message: "boom".into(),
            },
            TimeUnit::Seconds,
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "pattern": "a+",
                "exploit": "aaa",
                "error": "ExecutionException",
                "detail": "boom",
            })
        );
    }
}
