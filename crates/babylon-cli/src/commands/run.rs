// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `babylon run`: trace every example and report what it observed.

use std::process::ExitCode;

use serde::Serialize;

use babylon_annotate::{Captured, Example};
use babylon_diagnostics::ToDiagnostic;
use babylon_source::file_name;
use babylon_trace::Tracer;

use super::{fail, print_json, report};
use crate::output;
use crate::session::Session;

#[derive(Serialize)]
struct RunReport<'a> {
    file: &'a str,
    passed: bool,
    examples: &'a [ExampleRun],
}

/// A traced example and what it printed.
#[derive(Serialize)]
struct ExampleRun {
    #[serde(flatten)]
    example: Example,
    output: String,
}

pub fn cmd_run(session: &Session, json: bool) -> ExitCode {
    let examples = match session.ctx.examples(&session.uri) {
        Ok(examples) => examples,
        Err(err) => return report(session, &err.to_diagnostic(), json),
    };
    let tracer = Tracer::new(&session.ctx);
    let traced: Vec<ExampleRun> = examples
        .into_iter()
        .map(|example| ExampleRun {
            example: tracer.trace(example),
            output: session.runtime.take_output(),
        })
        .collect();
    let passed = traced.iter().all(|run| run.example.passed());

    if json {
        let summary = RunReport {
            file: &session.uri,
            passed,
            examples: &traced,
        };
        if let Err(message) = print_json(&summary) {
            return fail(&message);
        }
    } else {
        print_report(session, &traced);
    }

    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_report(session: &Session, runs: &[ExampleRun]) {
    println!("{}", output::file_path(session.name()));
    if runs.is_empty() {
        println!("  no examples");
        return;
    }

    for ExampleRun { example, output: printed } in runs {
        let result = match &example.result {
            Some(Captured::Value(value)) => output::value(&value.repr()),
            Some(Captured::Failure(message)) => output::failure(message),
            None => output::failure("not run"),
        };
        println!(
            "{} {}  {} => {}",
            example.glyph(),
            output::example_name(&example.name),
            output::invocation(&example.invocation),
            result
        );
        for probe in &example.probes {
            let value = probe.value.to_string();
            let value = if probe.value.is_failure() {
                output::failure(&value)
            } else {
                output::value(&value)
            };
            println!(
                "    {}  {}  {}",
                output::kind("probe"),
                output::location(file_name(&probe.uri), probe.line),
                value
            );
        }
        for assertion in &example.assertions {
            let location = output::location(file_name(&assertion.uri), assertion.line);
            if assertion.passed() {
                println!("  {} {}  {}  {}", output::status_pass(), output::kind("assertion"), location, assertion.expected);
            } else {
                println!(
                    "  {} {}  {}  expected {}, got {}",
                    output::status_fail(),
                    output::kind("assertion"),
                    location,
                    assertion.expected,
                    output::failure(&assertion.actual.to_string())
                );
            }
        }
        for line in printed.lines() {
            println!("    {}  {}", output::kind("print"), line);
        }
    }

    let passed = runs.iter().filter(|run| run.example.passed()).count();
    println!();
    println!(
        "{}, {}",
        output::passed_count(passed),
        output::failed_count(runs.len() - passed)
    );
}
