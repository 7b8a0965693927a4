use serde::{Deserialize, Serialize};

use crate::exploit::{self, LiteralTooLarge, PumpSpec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("case /{0}/ has neither an input string nor an exploit string")]
    MissingInput(String),

    #[error("exploit string has {separators} separators but {pumps} pumps")]
    LengthMismatch { separators: usize, pumps: usize },

    #[error("exploit string of degree {degree} needs at least {needed} pump segments, found {found}")]
    TooFewSegments {
        degree: i32,
        needed: usize,
        found: usize,
    },

    #[error("exploit string has no pump segments and no example string")]
    EmptyExploit,
}

/// One benchmark unit: a pattern and the haystack to match it against.
///
/// The pattern is never validated here; an invalid pattern surfaces as an
/// execution failure when the case runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTestCase")]
pub struct TestCase {
    pub pattern: String,

    #[serde(rename = "string", skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(rename = "exploitString", skip_serializing_if = "Option::is_none")]
    pub exploit: Option<PumpSpec>,
}

#[derive(Debug, Deserialize)]
struct RawTestCase {
    pattern: String,
    #[serde(default, alias = "input")]
    string: Option<String>,
    #[serde(default, rename = "exploitString")]
    exploit_string: Option<PumpSpec>,
}

impl TryFrom<RawTestCase> for TestCase {
    type Error = DecodeError;

    fn try_from(raw: RawTestCase) -> Result<Self, Self::Error> {
        if raw.string.is_none() && raw.exploit_string.is_none() {
            return Err(DecodeError::MissingInput(raw.pattern));
        }
        Ok(Self {
            pattern: raw.pattern,
            input: raw.string,
            exploit: raw.exploit_string,
        })
    }
}

impl TestCase {
    pub fn new(pattern: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            input: Some(input.into()),
            exploit: None,
        }
    }

    pub fn with_exploit(pattern: impl Into<String>, exploit: PumpSpec) -> Self {
        Self {
            pattern: pattern.into(),
            input: None,
            exploit: Some(exploit),
        }
    }

    /// The haystack handed to the matcher.
    ///
    /// Precedence: raw input, then the exploit's example string, then the
    /// exploit rendered literally with `pump_repeat` repetitions.
    pub fn literal_input(&self, pump_repeat: usize) -> Result<String, LiteralTooLarge> {
        if let Some(input) = &self.input {
            return Ok(input.clone());
        }
        match &self.exploit {
            Some(PumpSpec {
                example_string: Some(example),
                ..
            }) => Ok(example.clone()),
            Some(spec) => spec.literal(pump_repeat),
            None => Ok(String::new()),
        }
    }

    /// Escaped description of the haystack for reports.
    pub fn description(&self) -> String {
        match &self.exploit {
            Some(spec) if spec.has_segments() => spec.render(),
            Some(PumpSpec {
                example_string: Some(example),
                ..
            }) if self.input.is_none() => exploit::escape(example),
            _ => exploit::escape(self.input.as_deref().unwrap_or_default()),
        }
    }
}
