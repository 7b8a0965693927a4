use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::testing::DecodeError;

const VERBATIM_CHAR_MIN: u32 = 33; // '!'
const VERBATIM_CHAR_MAX: u32 = 126; // '~'

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("exploit string with {repeat} pump repetitions does not fit in memory")]
pub struct LiteralTooLarge {
    pub repeat: usize,
}

/// An attack string built from repeated "pump" substrings.
///
/// `degree <= 0` describes an EDA exploit (one separator/pump segment), while
/// `degree > 0` describes an IDA exploit made of `degree` segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPumpSpec", rename_all = "camelCase")]
pub struct PumpSpec {
    pub degree: i32,
    pub separators: Vec<String>,
    pub pumps: Vec<String>,
    pub suffix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_string: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPumpSpec {
    #[serde(default)]
    degree: i32,
    #[serde(default)]
    separators: Vec<String>,
    #[serde(default)]
    pumps: Vec<String>,
    #[serde(default)]
    suffix: String,
    #[serde(default)]
    example_string: Option<String>,
}

impl TryFrom<RawPumpSpec> for PumpSpec {
    type Error = DecodeError;

    fn try_from(raw: RawPumpSpec) -> Result<Self, Self::Error> {
        let RawPumpSpec {
            degree,
            separators,
            pumps,
            suffix,
            example_string,
        } = raw;
        PumpSpec {
            degree,
            separators,
            pumps,
            suffix,
            example_string,
        }
        .validated()
    }
}

impl PumpSpec {
    /// Creates an EDA (`degree == 0`) exploit with a single segment.
    pub fn eda(
        separator: impl Into<String>,
        pump: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            degree: 0,
            separators: vec![separator.into()],
            pumps: vec![pump.into()],
            suffix: suffix.into(),
            example_string: None,
        }
    }

    /// Creates an IDA exploit whose degree equals the number of segments.
    pub fn ida<S: Into<String>>(
        segments: impl IntoIterator<Item = (S, S)>,
        suffix: impl Into<String>,
    ) -> Self {
        let (separators, pumps): (Vec<String>, Vec<String>) = segments
            .into_iter()
            .map(|(sep, pump)| (sep.into(), pump.into()))
            .unzip();
        Self {
            degree: pumps.len() as i32,
            separators,
            pumps,
            suffix: suffix.into(),
            example_string: None,
        }
    }

    pub fn with_example_string(mut self, example: impl Into<String>) -> Self {
        self.example_string = Some(example.into());
        self
    }

    pub fn validated(self) -> Result<Self, DecodeError> {
        if self.separators.len() != self.pumps.len() {
            return Err(DecodeError::LengthMismatch {
                separators: self.separators.len(),
                pumps: self.pumps.len(),
            });
        }
        if self.pumps.is_empty() {
            // An exploit carrying only its example string is still usable as input.
            return match self.example_string {
                Some(_) => Ok(self),
                None => Err(DecodeError::EmptyExploit),
            };
        }
        if self.pumps.len() < self.segment_count() {
            return Err(DecodeError::TooFewSegments {
                degree: self.degree,
                needed: self.segment_count(),
                found: self.pumps.len(),
            });
        }
        Ok(self)
    }

    pub fn is_eda(&self) -> bool {
        self.degree <= 0
    }

    pub fn has_segments(&self) -> bool {
        !self.pumps.is_empty()
    }

    fn segment_count(&self) -> usize {
        if self.is_eda() {
            1
        } else {
            self.degree as usize
        }
    }

    /// (separator, pump) pairs that take part in the exploit, in order.
    pub fn segments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.separators
            .iter()
            .zip(&self.pumps)
            .take(self.segment_count())
            .map(|(sep, pump)| (sep.as_str(), pump.as_str()))
    }

    /// Builds the literal attack string, repeating every pump `repeat` times.
    ///
    /// Fails instead of panicking when the result cannot be allocated.
    pub fn literal(&self, repeat: usize) -> Result<String, LiteralTooLarge> {
        let too_large = || LiteralTooLarge { repeat };
        let len = self
            .segments()
            .try_fold(self.suffix.len(), |acc, (sep, pump)| {
                pump.len()
                    .checked_mul(repeat)
                    .and_then(|n| n.checked_add(sep.len()))
                    .and_then(|n| n.checked_add(acc))
            })
            .ok_or_else(too_large)?;

        let mut s = String::new();
        s.try_reserve_exact(len).map_err(|_| too_large())?;
        for (sep, pump) in self.segments() {
            s.push_str(sep);
            for _ in 0..repeat {
                s.push_str(pump);
            }
        }
        s.push_str(&self.suffix);
        Ok(s)
    }

    /// Escaped, human-readable description: `sep pump...pump` per segment,
    /// followed by the suffix.
    pub fn render(&self) -> String {
        let mut s = String::new();
        for (sep, pump) in self.segments() {
            let pump = escape(pump);
            s.push_str(&escape(sep));
            s.push_str(&pump);
            s.push_str("...");
            s.push_str(&pump);
        }
        s.push_str(&escape(&self.suffix));
        s
    }
}

impl fmt::Display for PumpSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escapes every char that is not printable ASCII (space included).
///
/// ```
/// use rebench_core::exploit::escape;
///
/// assert_eq!(escape("a b"), r"a\x20b");
/// assert_eq!(escape("\u{e9}"), r"\xe9");
/// assert_eq!(escape("\u{3042}"), r"\x{3042}");
/// ```
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let c = ch as u32;
        if (VERBATIM_CHAR_MIN..=VERBATIM_CHAR_MAX).contains(&c) {
            out.push(ch);
        } else if c < 256 {
            let _ = write!(out, "\\x{:02x}", c);
        } else {
            let _ = write!(out, "\\x{{{:02x}}}", c);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eda_renders_pump_with_ellipsis() {
        let spec = PumpSpec::eda("a", "b", "c");
        assert_eq!(spec.render(), "ab...bc");
        assert_eq!(spec.to_string(), "ab...bc");
    }

    #[test]
    fn eda_literal_repeats_pump() {
        let spec = PumpSpec::eda("a", "b", "c");
        assert_eq!(spec.literal(3).unwrap(), "abbbc");
        assert_eq!(spec.literal(0).unwrap(), "ac");
    }

    #[test]
    fn ida_renders_every_segment_in_order() {
        let spec = PumpSpec::ida([("x", "y"), ("p", "q")], "z");
        assert_eq!(spec.degree, 2);
        assert_eq!(spec.render(), "xy...ypq...qz");
        assert_eq!(spec.literal(2).unwrap(), "xyypqqz");
    }

    #[test]
    fn eda_ignores_extra_segments() {
        let spec = PumpSpec {
            degree: 0,
            separators: vec!["a".into(), "x".into()],
            pumps: vec!["b".into(), "y".into()],
            suffix: "!".into(),
            example_string: None,
        };
        assert_eq!(spec.render(), "ab...b!");
        assert_eq!(spec.literal(2).unwrap(), "abb!");
    }

    #[test]
    fn negative_degree_is_eda() {
        let spec = PumpSpec {
            degree: -1,
            ..PumpSpec::eda("s", "p", "")
        };
        assert!(spec.is_eda());
        assert_eq!(spec.render(), "sp...p");
    }

    #[test]
    fn escape_boundaries() {
        assert_eq!(escape("\u{07}"), r"\x07");
        assert_eq!(escape("\u{1F600}"), r"\x{1f600}");
        assert_eq!(escape("!~"), "!~");
        assert_eq!(escape(" "), r"\x20");
        assert_eq!(escape("\u{7f}"), r"\x7f");
        assert_eq!(escape("\u{ff}"), r"\xff");
        assert_eq!(escape("\u{100}"), r"\x{100}");
        assert_eq!(escape("\n\t"), r"\x0a\x09");
    }

    #[test]
    fn render_escapes_every_part() {
        let spec = PumpSpec::eda(" ", "\u{0}", "\n");
        assert_eq!(spec.render(), r"\x20\x00...\x00\x0a");
    }

    #[test]
    fn decode_from_json() {
        let json = r#"{
            "degree": 2,
            "separators": ["x", "p"],
            "pumps": ["y", "q"],
            "suffix": "z",
            "exampleString": "xyyypqqqz"
        }"#;
        let spec: PumpSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.render(), "xy...ypq...qz");
        assert_eq!(spec.example_string.as_deref(), Some("xyyypqqqz"));
    }

    #[test]
    fn decode_rejects_broken_invariants() {
        let mismatch = r#"{"degree": 0, "separators": ["a", "b"], "pumps": ["c"], "suffix": ""}"#;
        let err = serde_json::from_str::<PumpSpec>(mismatch).unwrap_err();
        assert!(err.to_string().contains("2 separators but 1 pumps"), "{}", err);

        let too_few = r#"{"degree": 3, "separators": ["a"], "pumps": ["b"], "suffix": ""}"#;
        let err = serde_json::from_str::<PumpSpec>(too_few).unwrap_err();
        assert!(err.to_string().contains("degree 3"), "{}", err);

        let empty = r#"{"degree": 0, "suffix": "x"}"#;
        assert!(serde_json::from_str::<PumpSpec>(empty).is_err());
    }

    #[test]
    fn decode_accepts_example_only_exploit() {
        let spec: PumpSpec = serde_json::from_str(r#"{"exampleString": "aaaa!"}"#).unwrap();
        assert!(!spec.has_segments());
        assert_eq!(spec.render(), "");
        assert_eq!(spec.literal(10).unwrap(), "");
    }

    #[test]
    fn literal_overflow_is_an_error() {
        let spec = PumpSpec::eda("", "ab", "!");
        assert_eq!(
            spec.literal(usize::MAX),
            Err(LiteralTooLarge { repeat: usize::MAX })
        );

        let ida = PumpSpec::ida([("x", "y"), ("p", "q")], "z");
        assert!(ida.literal(usize::MAX / 2 + 1).is_err());
    }
}
