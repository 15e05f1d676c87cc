// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Examples and the probes and assertions they collect.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use babylon_runtime::Value;

use crate::literal::Literal;

/// Which statements of a traced example record probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Only statements under an explicit `<Probe />` marker.
    #[default]
    Default,
    /// Every executed statement.
    All,
    /// Nothing, not even assertions.
    Off,
}

impl ProbeMode {
    /// Case-insensitive; anything unrecognised is `Default`.
    pub fn parse(text: &str) -> ProbeMode {
        match text.to_ascii_lowercase().as_str() {
            "all" => ProbeMode::All,
            "off" => ProbeMode::Off,
            _ => ProbeMode::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProbeMode::Default => "default",
            ProbeMode::All => "all",
            ProbeMode::Off => "off",
        }
    }
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value observed while tracing, or why it could not be observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Captured {
    Value(Value),
    Failure(String),
}

impl Captured {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Captured::Value(value) => Some(value),
            Captured::Failure(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Captured::Failure(_))
    }
}

impl fmt::Display for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Captured::Value(value) => write!(f, "{}", value.repr()),
            Captured::Failure(message) => write!(f, "{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub uri: String,
    pub line: usize,
    pub start_col: Option<usize>,
    pub end_col: Option<usize>,
    pub value: Captured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub uri: String,
    pub line: usize,
    pub start_col: Option<usize>,
    pub end_col: Option<usize>,
    pub expected: Literal,
    pub actual: Captured,
}

impl Assertion {
    pub fn passed(&self) -> bool {
        match &self.actual {
            Captured::Value(value) => self.expected.matches(value),
            Captured::Failure(_) => false,
        }
    }
}

/// What an assertion marker checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionPayload {
    /// Compare the statement's result with a literal.
    Expected(Literal),
    /// Evaluate guest code in the statement's frame; it should be `true`.
    Expression(String),
}

/// A `<Probe />` marker found inside the example's function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSite {
    pub line: usize,
    pub expression: Option<String>,
}

/// An `<Assertion />` marker naming the example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionSite {
    pub line: usize,
    pub payload: AssertionPayload,
}

/// A named invocation of an annotated function.
///
/// Parsing fills in everything up to the pending sites; tracing fills in
/// `result`, `probes`, and `assertions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub name: String,
    pub function_name: String,
    /// Line of the function the example invokes.
    pub function_line: usize,
    /// Guest code appended to the document to run the example.
    pub invocation: String,
    pub definition_line: usize,
    /// Column of the directive's closing `>`.
    pub definition_end_col: usize,
    pub probe_mode: ProbeMode,
    pub uri: String,
    pub result: Option<Captured>,
    pub probes: Vec<Probe>,
    pub assertions: Vec<Assertion>,
    pub probe_sites: Vec<ProbeSite>,
    pub assertion_sites: Vec<AssertionSite>,
}

impl Example {
    pub fn glyph(&self) -> &'static str {
        glyph(&self.name)
    }

    pub fn is_traced(&self) -> bool {
        self.result.is_some()
    }

    /// The run completed and every assertion holds.
    pub fn passed(&self) -> bool {
        matches!(self.result, Some(Captured::Value(_))) && self.assertions.iter().all(Assertion::passed)
    }

    pub fn failed_assertions(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter().filter(|assertion| !assertion.passed())
    }
}

const GLYPHS: &[&str] = &[
    "🍎", "🍊", "🍋", "🍇", "🍓", "🥝", "🍑", "🍒", "🥥", "🍍", "🥕", "🌽", "🍄", "🌰", "🥑", "🫐",
];

/// Emoji that tells one example's decorations apart from another's.
pub fn glyph(name: &str) -> &'static str {
    let digest = Sha256::digest(name.as_bytes());
    let n = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    GLYPHS[n as usize % GLYPHS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_mode_parsing() {
        assert_eq!(ProbeMode::parse("ALL"), ProbeMode::All);
        assert_eq!(ProbeMode::parse("off"), ProbeMode::Off);
        assert_eq!(ProbeMode::parse("sometimes"), ProbeMode::Default);
    }

    #[test]
    fn glyph_is_stable_per_name() {
        assert_eq!(glyph("foo"), glyph("foo"));
        assert!(GLYPHS.contains(&glyph("")));
    }

    #[test]
    fn assertion_outcome() {
        let mut assertion = Assertion {
            uri: "a.bab".into(),
            line: 3,
            start_col: None,
            end_col: None,
            expected: Literal::Int(4),
            actual: Captured::Value(Value::Int(4)),
        };
        assert!(assertion.passed());
        assertion.actual = Captured::Failure("boom".into());
        assert!(!assertion.passed());
    }

    #[test]
    fn captured_serializes_with_kind() {
        let json = serde_json::to_string(&Captured::Value(Value::Int(1))).unwrap();
        assert_eq!(json, r#"{"kind":"value","value":{"type":"int","value":1}}"#);
        assert_eq!(Captured::Failure("x".into()).to_string(), "x");
    }
}
