use regex_automata::{
    meta,
    nfa::thompson::{self, backtrack, pikevm},
};
use regex_syntax::hir::{Hir, Look};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid pattern: {0}")]
    Syntax(#[from] Box<regex_syntax::Error>),

    #[error("Cannot compile pattern with the {engine} engine: {message}")]
    Build {
        engine: EngineKind,
        message: String,
    },

    #[error("Search failed: {0}")]
    Search(String),
}

/// Regex engine under test.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EngineKind {
    /// `regex_automata`'s meta regex, the engine behind `regex::Regex`
    #[default]
    Meta,
    /// `regex_automata`'s bounded backtracker
    Backtrack,
    /// `regex_automata`'s PikeVM
    PikeVm,
}

/// A compiled pattern that can be searched repeatedly.
pub trait Matcher: Send {
    /// Whether the whole haystack matches, not just a substring.
    fn is_full_match(&mut self, haystack: &str) -> Result<bool, EngineError>;
}

struct MetaMatcher(meta::Regex);

struct BacktrackMatcher {
    re: backtrack::BoundedBacktracker,
    cache: backtrack::Cache,
}

struct PikeVmMatcher {
    re: pikevm::PikeVM,
    cache: pikevm::Cache,
}

impl Matcher for MetaMatcher {
    fn is_full_match(&mut self, haystack: &str) -> Result<bool, EngineError> {
        Ok(self.0.is_match(haystack))
    }
}

impl Matcher for BacktrackMatcher {
    fn is_full_match(&mut self, haystack: &str) -> Result<bool, EngineError> {
        self.re
            .try_is_match(&mut self.cache, haystack)
            .map_err(|e| EngineError::Search(e.to_string()))
    }
}

impl Matcher for PikeVmMatcher {
    fn is_full_match(&mut self, haystack: &str) -> Result<bool, EngineError> {
        Ok(self.re.is_match(&mut self.cache, haystack))
    }
}

impl EngineKind {
    /// Compiles `pattern` so that it only matches entire haystacks.
    pub fn compile(self, pattern: &str) -> Result<Box<dyn Matcher>, EngineError> {
        let hir = regex_syntax::ParserBuilder::new()
            .build()
            .parse(pattern)
            .map_err(Box::new)?;
        // Anchor the parsed pattern, not its text: flags like `(?x)` must not
        // leak into the wrapper.
        let anchored = Hir::concat(vec![Hir::look(Look::Start), hir, Hir::look(Look::End)]);

        let build_err = |message: String| EngineError::Build {
            engine: self,
            message,
        };
        let matcher: Box<dyn Matcher> = match self {
            EngineKind::Meta => {
                let re = meta::Builder::new()
                    .build_from_hir(&anchored)
                    .map_err(|e| build_err(e.to_string()))?;
                Box::new(MetaMatcher(re))
            }
            EngineKind::Backtrack => {
                let nfa = thompson::Compiler::new()
                    .build_from_hir(&anchored)
                    .map_err(|e| build_err(e.to_string()))?;
                let re = backtrack::Builder::new()
                    .build_from_nfa(nfa)
                    .map_err(|e| build_err(e.to_string()))?;
                let cache = re.create_cache();
                Box::new(BacktrackMatcher { re, cache })
            }
            EngineKind::PikeVm => {
                let nfa = thompson::Compiler::new()
                    .build_from_hir(&anchored)
                    .map_err(|e| build_err(e.to_string()))?;
                let re = pikevm::Builder::new()
                    .build_from_nfa(nfa)
                    .map_err(|e| build_err(e.to_string()))?;
                let cache = re.create_cache();
                Box::new(PikeVmMatcher { re, cache })
            }
        };
        Ok(matcher)
    }
}
