// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for diagnostics.
//!
//! ```text
//! error[B0200]: runner path must not contain whitespace
//!   --> calc.bab:1:12
//!    |
//!  1 | // runner: my main.bab
//!    |            ^^^^^^^^^^^ runner reference
//!    |
//!    = help: name a single sibling file, e.g. `// runner: main.bab`
//! ```

use std::collections::BTreeMap;

use colored::Colorize;

use babylon_source::TextMap;

use crate::{line_col, Diagnostic, Help, LabelStyle, Severity};

pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    map: TextMap,
}

/// A source line with its labels.
struct AnnotatedLine {
    line_num: usize,
    text: String,
    annotations: Vec<Annotation>,
}

struct Annotation {
    col_start: usize,
    col_end: usize,
    style: LabelStyle,
    message: Option<String>,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            file_name: None,
            map: TextMap::new(source),
        }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.format_header(&mut out, diagnostic);

        let annotated = self.collect_annotated_lines(diagnostic);
        let (first, last) = match (annotated.first(), annotated.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                self.format_footer(&mut out, diagnostic);
                return out;
            }
        };

        let file = self.file_name.unwrap_or("<source>");
        let col = first
            .annotations
            .iter()
            .map(|a| a.col_start)
            .min()
            .unwrap_or(1);
        out.push_str(&format!("  {} {}:{}:{}\n", "-->".blue(), file, first.line_num, col));

        let gutter_width = last.line_num.to_string().len().max(2);

        let mut prev_line_num: Option<usize> = None;
        for annotated_line in &annotated {
            match prev_line_num {
                Some(prev) if annotated_line.line_num > prev + 1 => {
                    out.push_str(&format!("{} {}\n", " ".repeat(gutter_width), "...".blue()));
                }
                None => {
                    out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue()));
                }
                _ => {}
            }

            out.push_str(&format!(
                "{:>width$} {} {}\n",
                annotated_line.line_num.to_string().blue().bold(),
                "|".blue(),
                annotated_line.text,
                width = gutter_width + 1,
            ));

            self.format_annotations(&mut out, annotated_line, gutter_width);
            prev_line_num = Some(annotated_line.line_num);
        }

        self.format_footer(&mut out, diagnostic);
        out
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => diagnostic.severity.as_str().red().bold(),
            Severity::Warning => diagnostic.severity.as_str().yellow().bold(),
            Severity::Note => diagnostic.severity.as_str().blue().bold(),
        };

        match &diagnostic.code {
            Some(code) => out.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code.0.as_str().red().bold(),
                diagnostic.message.bold()
            )),
            None => out.push_str(&format!("{}: {}\n", severity, diagnostic.message.bold())),
        }
    }

    fn format_footer(&self, out: &mut String, diagnostic: &Diagnostic) {
        let gutter_width = 2;

        for note in &diagnostic.notes {
            out.push_str(&format!(
                "{} {} {}: {}\n",
                " ".repeat(gutter_width + 1),
                "=".cyan(),
                "note".cyan().bold(),
                note
            ));
        }

        if let Some(help) = &diagnostic.help {
            self.format_help(out, help, gutter_width);
        }
    }

    fn format_help(&self, out: &mut String, help: &Help, gutter_width: usize) {
        out.push_str(&format!(
            "{} {} {}: {}\n",
            " ".repeat(gutter_width + 1),
            "=".cyan(),
            "help".cyan().bold(),
            help.message
        ));

        let Some(suggestion) = &help.suggestion else {
            return;
        };
        let (line, col) = line_col(&self.map, suggestion.span.start);
        let Some(source_line) = self.map.line_text(self.source, line) else {
            return;
        };
        let prefix_end = (col - 1).min(source_line.len());
        let suffix_start = (prefix_end + suggestion.span.len()).min(source_line.len());
        let (Some(prefix), Some(suffix)) = (
            source_line.get(..prefix_end),
            source_line.get(suffix_start..),
        ) else {
            return;
        };

        out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue()));
        out.push_str(&format!(
            "{:>width$} {} {}{}{}\n",
            line.to_string().blue().bold(),
            "|".blue(),
            prefix,
            suggestion.replacement.green(),
            suffix,
            width = gutter_width + 1,
        ));
        out.push_str(&format!(
            "{} {} {}{}\n",
            " ".repeat(gutter_width + 1),
            "|".blue(),
            " ".repeat(prefix_end),
            "~".repeat(suggestion.replacement.chars().count()).green(),
        ));
    }

    fn collect_annotated_lines(&self, diagnostic: &Diagnostic) -> Vec<AnnotatedLine> {
        let mut lines: BTreeMap<usize, AnnotatedLine> = BTreeMap::new();

        for label in &diagnostic.labels {
            let (line_num, col_start) = line_col(&self.map, label.span.start);
            let (end_line, col_end) = line_col(&self.map, label.span.end);
            let text = self.map.line_text(self.source, line_num).unwrap_or("");

            // Multi-line spans are underlined to the end of their first line.
            let col_end = if end_line == line_num {
                col_end
            } else {
                text.len() + 1
            };

            let entry = lines.entry(line_num).or_insert_with(|| AnnotatedLine {
                line_num,
                text: text.to_string(),
                annotations: Vec::new(),
            });
            entry.annotations.push(Annotation {
                col_start,
                col_end: col_end.max(col_start + 1),
                style: label.style,
                message: label.message.clone(),
            });
        }

        lines.into_values().collect()
    }

    fn format_annotations(&self, out: &mut String, line: &AnnotatedLine, gutter_width: usize) {
        let mut sorted: Vec<&Annotation> = line.annotations.iter().collect();
        sorted.sort_by(|a, b| {
            a.style
                .priority()
                .cmp(&b.style.priority())
                .then(a.col_start.cmp(&b.col_start))
        });

        let width = line.text.len() + 10;
        let mut underline = vec![' '; width];
        let mut messages: Vec<(usize, LabelStyle, &str)> = Vec::new();

        for ann in &sorted {
            let ch = match ann.style {
                LabelStyle::Primary => '^',
                LabelStyle::Secondary => '-',
            };
            for slot in underline
                .iter_mut()
                .take(ann.col_end.saturating_sub(1).min(width))
                .skip(ann.col_start - 1)
            {
                *slot = ch;
            }
            if let Some(msg) = &ann.message {
                messages.push((ann.col_start, ann.style, msg));
            }
        }

        let underline: String = underline.iter().collect::<String>().trim_end().to_string();
        if underline.is_empty() {
            return;
        }
        let gutter = format!("{} {}", " ".repeat(gutter_width + 1), "|".blue());

        if messages.len() <= 1 {
            match messages.first() {
                Some((_, style, msg)) => out.push_str(&format!(
                    "{} {} {}\n",
                    gutter,
                    color_underline(&underline),
                    style.paint(msg)
                )),
                None => out.push_str(&format!("{} {}\n", gutter, color_underline(&underline))),
            }
            return;
        }

        out.push_str(&format!("{} {}\n", gutter, color_underline(&underline)));
        for (col, style, msg) in messages.iter().rev() {
            out.push_str(&format!(
                "{} {}{} {}\n",
                gutter,
                " ".repeat(col.saturating_sub(1)),
                style.paint("|"),
                style.paint(msg),
            ));
        }
    }
}

impl LabelStyle {
    fn priority(self) -> u8 {
        match self {
            LabelStyle::Primary => 0,
            LabelStyle::Secondary => 1,
        }
    }

    fn paint(self, text: &str) -> String {
        match self {
            LabelStyle::Primary => text.red().bold().to_string(),
            LabelStyle::Secondary => text.blue().to_string(),
        }
    }
}

/// Color runs of `^` red and runs of `-` blue.
fn color_underline(s: &str) -> String {
    let mut result = String::new();
    let mut run = String::new();
    let mut current = None;

    for ch in s.chars() {
        let kind = matches!(ch, '^' | '-').then_some(ch);
        if kind != current && !run.is_empty() {
            result.push_str(&flush_run(&run, current));
            run.clear();
        }
        run.push(ch);
        current = kind;
    }
    if !run.is_empty() {
        result.push_str(&flush_run(&run, current));
    }
    result
}

fn flush_run(run: &str, kind: Option<char>) -> String {
    match kind {
        Some('^') => run.red().bold().to_string(),
        Some('-') => run.blue().to_string(),
        _ => run.to_string(),
    }
}
