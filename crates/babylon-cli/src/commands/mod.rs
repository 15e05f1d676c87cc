// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Subcommand implementations.

mod eval;
mod examples;
mod run;

pub use eval::cmd_eval;
pub use examples::cmd_examples;
pub use run::cmd_run;

use std::process::ExitCode;

use babylon_diagnostics::formatter::DiagnosticFormatter;
use babylon_diagnostics::json::to_json_report;
use babylon_diagnostics::Diagnostic;

use crate::output;
use crate::session::Session;

/// Print a diagnostic against the session's document and fail.
///
/// In JSON mode the diagnostic report goes to stdout instead.
fn report(session: &Session, diagnostic: &Diagnostic, json: bool) -> ExitCode {
    if json {
        let report = to_json_report(std::slice::from_ref(diagnostic), &session.text, &session.uri);
        if let Err(message) = print_json(&report) {
            return fail(&message);
        }
        return ExitCode::FAILURE;
    }
    let formatted = DiagnosticFormatter::new(&session.text)
        .with_file_name(session.name())
        .format(diagnostic);
    eprint!("{}", formatted);
    ExitCode::FAILURE
}

/// Print a plain error and fail.
pub fn fail(message: &str) -> ExitCode {
    eprintln!("{}: {}", output::error_label(), message);
    ExitCode::from(2)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| format!("cannot encode report: {}", err))?;
    println!("{}", json);
    Ok(())
}
