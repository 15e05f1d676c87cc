// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Literals written inside annotations.

use std::fmt;

use serde::{Deserialize, Serialize};

use babylon_runtime::Value;

/// A typed literal from annotation text: an argument default or an
/// assertion's expected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Text that is none of the above, kept verbatim.
    Raw(String),
}

impl Literal {
    /// Convert annotation text: quoted string, then integer, then float,
    /// then boolean, else the raw text.
    pub fn parse(text: &str) -> Literal {
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            return Literal::Str(text[1..text.len() - 1].to_string());
        }
        if let Ok(n) = text.parse::<i64>() {
            return Literal::Int(n);
        }
        // f64 parsing also accepts "inf" and "NaN"; only numerals count here.
        if text.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(x) = text.parse::<f64>() {
                return Literal::Float(x);
            }
        }
        match text {
            "true" | "True" => Literal::Bool(true),
            "false" | "False" => Literal::Bool(false),
            _ => Literal::Raw(text.to_string()),
        }
    }

    /// The runtime value this literal stands for. Raw text becomes a string.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Str(s) | Literal::Raw(s) => Value::Str(s.clone()),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(x) => Value::Float(*x),
            Literal::Bool(b) => Value::Bool(*b),
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.to_value() == *value
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Raw(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_value().repr()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_order() {
        assert_eq!(Literal::parse("true"), Literal::Bool(true));
        assert_eq!(Literal::parse("False"), Literal::Bool(false));
        assert_eq!(Literal::parse("3.5"), Literal::Float(3.5));
        assert_eq!(Literal::parse("-7"), Literal::Int(-7));
        assert_eq!(Literal::parse("\"hi\""), Literal::Str("hi".into()));
        assert_eq!(Literal::parse("\"42\""), Literal::Str("42".into()));
        assert_eq!(Literal::parse("xyz"), Literal::Raw("xyz".into()));
        assert_eq!(Literal::parse("NaN"), Literal::Raw("NaN".into()));
        assert_eq!(Literal::parse("\""), Literal::Raw("\"".into()));
    }

    #[test]
    fn matching_runtime_values() {
        assert!(Literal::Int(2).matches(&Value::Float(2.0)));
        assert!(Literal::Raw("xyz".into()).matches(&Value::Str("xyz".into())));
        assert!(!Literal::Str("1".into()).matches(&Value::Int(1)));
        assert!(!Literal::Bool(true).matches(&Value::Int(1)));
    }

    #[test]
    fn display() {
        assert_eq!(Literal::Str("a".into()).to_string(), "\"a\"");
        assert_eq!(Literal::Float(2.0).to_string(), "2.0");
        assert_eq!(Literal::Raw("a b".into()).to_string(), "a b");
    }
}
