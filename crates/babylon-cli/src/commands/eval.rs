// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `babylon eval`: the value of the expression at a position.

use std::process::ExitCode;

use babylon_diagnostics::ToDiagnostic;
use babylon_trace::{CoverageStore, Evaluation, Evaluator, Tracer};

use super::report;
use crate::output;
use crate::session::Session;

/// With `trace`, the document's examples run first and their coverage
/// answers before a fresh run to the position does.
pub fn cmd_eval(session: &Session, line: usize, col: usize, trace: bool) -> ExitCode {
    let mut coverage = CoverageStore::new();
    if trace {
        match session.ctx.examples(&session.uri) {
            Ok(examples) => {
                Tracer::new(&session.ctx).trace_all_with_coverage(examples, &mut coverage);
            }
            Err(err) => return report(session, &err.to_diagnostic(), false),
        }
    }

    let evaluation = Evaluator::new(&session.ctx)
        .with_coverage(&coverage)
        .evaluate(&session.uri, line, col);
    match evaluation {
        Ok(Evaluation::Value(value)) => {
            println!("{}", output::value(&value.repr()));
            ExitCode::SUCCESS
        }
        Ok(Evaluation::Error(message)) => {
            println!("{}: {}", output::error_label(), message);
            ExitCode::SUCCESS
        }
        Ok(Evaluation::Unknown) => {
            println!("unknown");
            ExitCode::SUCCESS
        }
        Err(err) => report(session, &err.to_diagnostic(), false),
    }
}
