// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Babylon CLI: run and inspect annotated examples.

mod commands;
mod output;
mod session;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use babylon_config::Config;
use babylon_diagnostics::formatter::DiagnosticFormatter;
use babylon_diagnostics::{codes, Diagnostic};

use crate::session::Session;

#[derive(Parser)]
#[command(name = "babylon", author, version, about = "Live examples for annotated functions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to babylon.toml (default: nearest one at or above the file)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace every example and print probes and assertions
    Run {
        file: PathBuf,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the examples declared in a file without running them
    Examples {
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the expression at a 1-based line and column
    Eval {
        file: PathBuf,
        line: usize,
        col: usize,

        /// Run the file's examples first and answer from their coverage
        #[arg(long)]
        trace: bool,
    },
}

impl Commands {
    fn file(&self) -> &Path {
        match self {
            Commands::Run { file, .. } | Commands::Examples { file, .. } | Commands::Eval { file, .. } => file,
        }
    }
}

fn main() -> ExitCode {
    output::init();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(diagnostic) => {
            eprint!("{}", DiagnosticFormatter::new("").format(&diagnostic));
            return ExitCode::from(2);
        }
    };
    babylon_config::init_logging(&config.log.level, cli.verbose);
    debug!(?config, "configuration");

    let session = match Session::open(cli.command.file(), &config) {
        Ok(session) => session,
        Err(message) => return commands::fail(&message),
    };

    match &cli.command {
        Commands::Run { json, .. } => commands::cmd_run(&session, *json),
        Commands::Examples { json, .. } => commands::cmd_examples(&session, *json),
        Commands::Eval { line, col, trace, .. } => commands::cmd_eval(&session, *line, *col, *trace),
    }
}

fn load_config(cli: &Cli) -> Result<Config, Diagnostic> {
    babylon_config::load_or_default(cli.config.as_deref(), cli.command.file())
        .map_err(|err| Diagnostic::error(err.to_string()).with_code(codes::CONFIG))
}
