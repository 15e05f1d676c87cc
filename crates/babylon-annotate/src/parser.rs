// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Extraction of examples and markers from annotated source.

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use babylon_runtime::FunctionDeclaration;
use babylon_source::TextMap;

use crate::literal::Literal;
use crate::model::{AssertionPayload, AssertionSite, Example, ProbeMode, ProbeSite};

const EXAMPLE_PATTERN: &str = r#"<Example((?:\s+[^\s=/>]+=(?:"[^"]*"|[^\s"/>]+))*)\s*/>"#;
const PROBE_PATTERN: &str = r#"<Probe((?:\s+[^\s=/>]+=(?:"[^"]*"|[^\s"/>]+))*)\s*/>"#;
const ASSERTION_PATTERN: &str = r#"<Assertion((?:\s+[^\s=/>]+=(?:"[^"]*"|[^\s"/>]+))*)\s*/>"#;
const ATTRIBUTE_PATTERN: &str = r#"([^\s=/>]+)=("[^"]*"|[^\s"/>]+)"#;
const NAME_PATTERN: &str = r"^[A-Za-z0-9_]*$";

/// Placeholder for arguments with neither a binding nor a default.
pub const DEFAULT_MISSING_ARGUMENT: &str = "null";

/// An annotation pattern that does not compile.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid annotation pattern: {0}")]
pub struct PatternError(#[from] regex::Error);

/// A marker comment above a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    Probe { expression: Option<String> },
    Assertion { example: String, payload: AssertionPayload },
}

/// Compiled annotation patterns plus parse options, for one request.
#[derive(Debug, Clone)]
pub struct ParseContext {
    example: Regex,
    probe: Regex,
    assertion: Regex,
    attribute: Regex,
    name: Regex,
    missing_argument: String,
}

impl ParseContext {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            example: Regex::new(EXAMPLE_PATTERN)?,
            probe: Regex::new(PROBE_PATTERN)?,
            assertion: Regex::new(ASSERTION_PATTERN)?,
            attribute: Regex::new(ATTRIBUTE_PATTERN)?,
            name: Regex::new(NAME_PATTERN)?,
            missing_argument: DEFAULT_MISSING_ARGUMENT.to_string(),
        })
    }

    pub fn with_missing_argument(mut self, placeholder: impl Into<String>) -> Self {
        self.missing_argument = placeholder.into();
        self
    }

    /// `key=value` pairs of a tag, values verbatim (quotes kept).
    fn attributes<'t>(&self, text: &'t str) -> Vec<(&'t str, &'t str)> {
        self.attribute
            .captures_iter(text)
            .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
            .collect()
    }

    /// Classify one source line as a probe or assertion marker. Markers only
    /// count inside comments.
    pub fn classify_marker(&self, line: &str) -> Option<Marker> {
        let trimmed = line.trim_start();
        if !(trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')) {
            return None;
        }

        if let Some(caps) = self.probe.captures(line) {
            let attrs = self.attributes(caps.get(1).map_or("", |m| m.as_str()));
            let expression = lookup(&attrs, "expression").map(|v| unquote(v).to_string());
            return Some(Marker::Probe { expression });
        }

        let caps = self.assertion.captures(line)?;
        let attrs = self.attributes(caps.get(1).map_or("", |m| m.as_str()));
        let Some(example) = lookup(&attrs, "example") else {
            debug!(line, "assertion marker without an example");
            return None;
        };
        let payload = if let Some(expected) = lookup(&attrs, "expected") {
            AssertionPayload::Expected(Literal::parse(expected))
        } else if let Some(expression) = lookup(&attrs, "expression") {
            AssertionPayload::Expression(unquote(expression).to_string())
        } else {
            debug!(line, "assertion marker without expected value or expression");
            return None;
        };
        Some(Marker::Assertion {
            example: unquote(example).to_string(),
            payload,
        })
    }

    /// Examples declared in `text`, in directive order.
    pub fn parse_examples(
        &self,
        text: &str,
        declarations: &[FunctionDeclaration],
        uri: &str,
    ) -> Vec<Example> {
        let map = TextMap::new(text);
        let lines: Vec<&str> = (1..=map.line_count())
            .map(|n| map.line_text(text, n).unwrap_or(""))
            .collect();

        let mut examples: Vec<Example> = Vec::new();
        for caps in self.example.captures_iter(text) {
            let Some(directive) = caps.get(0) else {
                continue;
            };
            let attrs = self.attributes(caps.get(1).map_or("", |m| m.as_str()));
            let Some(name) = lookup(&attrs, ":name").map(unquote) else {
                debug!(directive = directive.as_str(), "example without :name, skipped");
                continue;
            };
            if !self.name.is_match(name) {
                debug!(name, "invalid example name, skipped");
                continue;
            }
            let probe_mode = lookup(&attrs, ":probe-mode")
                .map(|mode| ProbeMode::parse(unquote(mode)))
                .unwrap_or_default();
            let bindings: Vec<(&str, &str)> = attrs
                .iter()
                .copied()
                .filter(|(key, _)| !key.starts_with(':'))
                .collect();

            let Ok(definition_line) = map.offset_to_line(directive.start()) else {
                continue;
            };
            let definition_end_col = map
                .offset_to_col(directive.end().saturating_sub(1))
                .unwrap_or(1);
            let target_line = function_line(text, &map, &lines, definition_line, directive.end());
            let declaration =
                target_line.and_then(|line| declarations.iter().find(|d| d.start_line == line));

            let example = match declaration {
                Some(decl) => Example {
                    name: name.to_string(),
                    function_name: decl.name.clone(),
                    function_line: decl.start_line,
                    invocation: self.invocation(decl, &bindings),
                    definition_line,
                    definition_end_col,
                    probe_mode,
                    uri: uri.to_string(),
                    result: None,
                    probes: Vec::new(),
                    assertions: Vec::new(),
                    probe_sites: self.probe_sites(&lines, decl),
                    assertion_sites: self.assertion_sites(&lines, name),
                },
                None => {
                    debug!(name, "no function declared after example, invoking by name");
                    Example {
                        name: name.to_string(),
                        function_name: name.to_string(),
                        function_line: target_line.unwrap_or(definition_line),
                        invocation: format!("{}()", name),
                        definition_line,
                        definition_end_col,
                        probe_mode,
                        uri: uri.to_string(),
                        result: None,
                        probes: Vec::new(),
                        assertions: Vec::new(),
                        probe_sites: Vec::new(),
                        assertion_sites: self.assertion_sites(&lines, name),
                    }
                }
            };

            match examples.iter().position(|e| e.name == example.name) {
                Some(slot) => {
                    warn!(
                        name = %example.name,
                        first = examples[slot].definition_line,
                        line = definition_line,
                        "duplicate example name, the later definition wins"
                    );
                    examples[slot] = example;
                }
                None => examples.push(example),
            }
        }
        examples
    }

    fn invocation(&self, decl: &FunctionDeclaration, bindings: &[(&str, &str)]) -> String {
        let args: Vec<&str> = decl
            .arguments
            .iter()
            .map(|arg| {
                lookup(bindings, &arg.name)
                    .or(arg.default_value.as_deref())
                    .unwrap_or(self.missing_argument.as_str())
            })
            .collect();
        format!("{}({})", decl.name, args.join(", "))
    }

    fn probe_sites(&self, lines: &[&str], decl: &FunctionDeclaration) -> Vec<ProbeSite> {
        (decl.start_line..=decl.end_line)
            .filter_map(|line| match self.classify_marker(lines.get(line.checked_sub(1)?)?)? {
                Marker::Probe { expression } => Some(ProbeSite { line, expression }),
                Marker::Assertion { .. } => None,
            })
            .collect()
    }

    fn assertion_sites(&self, lines: &[&str], name: &str) -> Vec<AssertionSite> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(idx, text)| match self.classify_marker(text)? {
                Marker::Assertion { example, payload } if example == name => Some(AssertionSite {
                    line: idx + 1,
                    payload,
                }),
                _ => None,
            })
            .collect()
    }
}

fn lookup<'t>(attrs: &[(&str, &'t str)], key: &str) -> Option<&'t str> {
    attrs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// First 1-based line at or after `line` that is neither blank nor
/// comment. Block comments are skipped through their closing marker.
fn skip_comments(lines: &[&str], mut line: usize) -> usize {
    while let Some(text) = lines.get(line - 1) {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            line += 1;
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            if !rest.contains("*/") {
                line += 1;
                while lines.get(line - 1).is_some_and(|l| !l.contains("*/")) {
                    line += 1;
                }
            }
            line += 1;
        } else {
            break;
        }
    }
    line
}

/// First code line after the comment holding a directive.
fn function_line(
    text: &str,
    map: &TextMap,
    lines: &[&str],
    definition_line: usize,
    directive_end: usize,
) -> Option<usize> {
    let in_line_comment = lines
        .get(definition_line - 1)
        .is_some_and(|line| line.trim_start().starts_with("//"));

    let mut next = if in_line_comment {
        let mut line = definition_line + 1;
        while lines.get(line - 1).is_some_and(|l| l.trim_start().starts_with("//")) {
            line += 1;
        }
        line
    } else {
        let close = match text[directive_end..].find("*/") {
            Some(rel) => directive_end + rel,
            None => directive_end.saturating_sub(1),
        };
        map.offset_to_line(close).ok()? + 1
    };

    next = skip_comments(lines, next);
    (next <= lines.len()).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_runtime::ArgumentDeclaration;
    use pretty_assertions::assert_eq;

    fn decl(name: &str, start: usize, end: usize, args: &[(&str, Option<&str>)]) -> FunctionDeclaration {
        FunctionDeclaration {
            name: name.into(),
            start_line: start,
            end_line: end,
            arguments: args
                .iter()
                .map(|(n, d)| ArgumentDeclaration {
                    name: n.to_string(),
                    default_value: d.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn classify_markers() {
        let ctx = ParseContext::new().unwrap();
        assert_eq!(
            ctx.classify_marker("  // <Probe />"),
            Some(Marker::Probe { expression: None })
        );
        assert_eq!(
            ctx.classify_marker("/* <Probe expression=\"x > 1\" /> */"),
            Some(Marker::Probe {
                expression: Some("x > 1".into())
            })
        );
        assert_eq!(
            ctx.classify_marker("// <Assertion example=\"ex\" expected=4 />"),
            Some(Marker::Assertion {
                example: "ex".into(),
                payload: AssertionPayload::Expected(Literal::Int(4)),
            })
        );
        assert_eq!(ctx.classify_marker("let s = \"<Probe />\""), None);
        assert_eq!(ctx.classify_marker("// <Assertion example=\"ex\" />"), None);
    }

    #[test]
    fn invocation_from_bindings_and_defaults() {
        let src = "/* <Example :name=\"e\" b=\"x\" /> */\nfunction f(a, b, c = 3) {\n}\n";
        let decls = [decl("f", 2, 3, &[("a", None), ("b", None), ("c", Some("3"))])];
        let examples = ParseContext::new().unwrap().parse_examples(src, &decls, "file:///w/a.bab");
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].invocation, "f(null, \"x\", 3)");
        assert_eq!(examples[0].function_line, 2);
        assert_eq!(examples[0].definition_end_col, 30);

        let ctx = ParseContext::new().unwrap().with_missing_argument("0");
        assert_eq!(ctx.parse_examples(src, &decls, "a.bab")[0].invocation, "f(0, \"x\", 3)");
    }

    #[test]
    fn line_comment_directives() {
        let src = "// <Example :name=\"e\" :probe-mode=\"OFF\" n=2 />\n// more notes\n\nfunction g(n) {\n}\n";
        let decls = [decl("g", 4, 5, &[("n", None)])];
        let examples = ParseContext::new().unwrap().parse_examples(src, &decls, "a.bab");
        assert_eq!(examples[0].invocation, "g(2)");
        assert_eq!(examples[0].probe_mode, ProbeMode::Off);
    }

    #[test]
    fn block_comments_between_directive_and_function() {
        let src = "/* <Example :name=\"e\" n=1 /> */\n/* one-liner */\n/*\n * spans\n * lines\n */\n// trailing note\nfunction k(n) {\n}\n";
        let decls = [decl("k", 8, 9, &[("n", None)])];
        let examples = ParseContext::new().unwrap().parse_examples(src, &decls, "a.bab");
        assert_eq!(examples[0].function_line, 8);
        assert_eq!(examples[0].invocation, "k(1)");
    }

    #[test]
    fn unknown_function_invokes_by_name() {
        let src = "/* <Example :name=\"orphan\" x=1 /> */\nlet x = 1\n";
        let examples = ParseContext::new().unwrap().parse_examples(src, &[], "a.bab");
        assert_eq!(examples[0].invocation, "orphan()");
        assert_eq!(examples[0].function_name, "orphan");
    }

    #[test]
    fn duplicate_names_keep_first_slot() {
        let src = "/* <Example :name=\"a\" /> */\nfunction f() {\n}\n/* <Example :name=\"b\" /> */\nfunction g() {\n}\n/* <Example :name=\"a\" :probe-mode=\"all\" /> */\nfunction h() {\n}\n";
        let decls = [decl("f", 2, 3, &[]), decl("g", 5, 6, &[]), decl("h", 8, 9, &[])];
        let examples = ParseContext::new().unwrap().parse_examples(src, &decls, "a.bab");
        let names: Vec<_> = examples.iter().map(|e| (e.name.as_str(), e.function_name.as_str())).collect();
        assert_eq!(names, vec![("a", "h"), ("b", "g")]);
    }

    #[test]
    fn directives_without_name_are_skipped() {
        let src = "/* <Example x=1 /> */\nfunction f(x) {\n}\n/* <Example :name=\"bad-name\" /> */\nfunction g() {\n}\n";
        let decls = [decl("f", 2, 3, &[("x", None)]), decl("g", 5, 6, &[])];
        assert!(ParseContext::new().unwrap().parse_examples(src, &decls, "a.bab").is_empty());
    }
}
