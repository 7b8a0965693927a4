use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_json::Value;

use crate::testing::{Report, TestCase};

/// A batch JSON file kept as raw values so fields this crate does not know
/// about survive a rewrite.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    entries: Vec<Value>,
}

impl Dataset {
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries: Vec<Value> = fsutil::read_json_with_deserialize(&path)?;
        Ok(Self { path, entries })
    }

    pub fn from_entries(path: impl Into<PathBuf>, entries: Vec<Value>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn testcases(&self) -> anyhow::Result<Vec<TestCase>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, v)| {
                serde_json::from_value(v.clone()).with_context(|| {
                    format!("Invalid testcase #{} in {}", i, self.path.to_string_lossy())
                })
            })
            .collect()
    }

    /// Stores each report's value under `key` in the entry it came from.
    /// Entries whose run produced no value keep whatever `key` held before.
    pub fn record(&mut self, key: &str, reports: &[Report]) -> anyhow::Result<()> {
        anyhow::ensure!(
            reports.len() == self.entries.len(),
            "Got {} reports for {} testcases",
            reports.len(),
            self.entries.len()
        );
        for (entry, report) in self.entries.iter_mut().zip(reports) {
            let Some(value) = report.recorded_value() else {
                continue;
            };
            let Value::Object(obj) = entry else {
                anyhow::bail!("Testcase is not a JSON object: {}", entry);
            };
            obj.insert(key.to_owned(), Value::String(value));
        }
        Ok(())
    }

    pub fn save(&self, pretty: bool) -> anyhow::Result<()> {
        fsutil::write_json(&self.path, &self.entries, pretty)?;
        Ok(())
    }
}
