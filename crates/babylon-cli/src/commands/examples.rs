// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `babylon examples`: list parsed examples without running them.

use std::process::ExitCode;

use babylon_annotate::AssertionPayload;
use babylon_diagnostics::ToDiagnostic;

use super::{fail, print_json, report};
use crate::output;
use crate::session::Session;

pub fn cmd_examples(session: &Session, json: bool) -> ExitCode {
    let examples = match session.ctx.examples(&session.uri) {
        Ok(examples) => examples,
        Err(err) => return report(session, &err.to_diagnostic(), json),
    };
    if json {
        return match print_json(&examples) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => fail(&message),
        };
    }

    println!("{}", output::file_path(session.name()));
    for example in &examples {
        println!(
            "{} {}  {}  {}  mode={}",
            example.glyph(),
            output::example_name(&example.name),
            output::invocation(&example.invocation),
            output::location(session.name(), example.definition_line),
            example.probe_mode
        );
        for site in &example.probe_sites {
            match &site.expression {
                Some(expression) => println!("    {} line {}: {}", output::kind("probe"), site.line, expression),
                None => println!("    {} line {}", output::kind("probe"), site.line),
            }
        }
        for site in &example.assertion_sites {
            let payload = match &site.payload {
                AssertionPayload::Expected(literal) => format!("expected {}", literal),
                AssertionPayload::Expression(expression) => expression.clone(),
            };
            println!("    {} line {}: {}", output::kind("assertion"), site.line, payload);
        }
    }
    println!("{} example(s)", examples.len());
    ExitCode::SUCCESS
}
