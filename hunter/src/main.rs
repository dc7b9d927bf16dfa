//! Bug-hunting iteration controller.
//!
//! Keeps one bug iteration in `.hunter/state/session.json` and advances it one
//! phase per `hunter turn`, talking to a reasoning backend and to the person
//! at the terminal.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use hunter::core::types::IterationStatus;
use hunter::exit_codes;
use hunter::handoff::{Handoff, apply_handoff};
use hunter::hunter::TurnOutcome;
use hunter::io::backend::CommandBackend;
use hunter::io::channel::TerminalChannel;
use hunter::io::config::load_config;
use hunter::io::init::{HunterPaths, InitOptions, init_hunter};
use hunter::io::session_store::load_session;
use hunter::logging;
use hunter::report::{BugReport, report_bug};
use hunter::turn::run_turn_in;
use hunter::validate::{SessionValidation, validate_hunter};

#[derive(Parser)]
#[command(name = "hunter", version, about = "Resumable bug-hunting iteration controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.hunter/` with a default config.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Report a bug and start a new iteration.
    Report {
        /// What went wrong, as the user saw it.
        #[arg(long)]
        feedback: String,
        /// Clarifying questions and answers about the report.
        #[arg(long)]
        qa: Option<String>,
        /// The task being worked on when the bug showed up.
        #[arg(long)]
        task: Option<String>,
        /// Command that starts the app under test.
        #[arg(long)]
        run_command: Option<String>,
        /// Files to hand to the backend as project docs.
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,
    },
    /// Advance the iteration by one phase.
    Turn,
    /// Print the iteration status.
    Status,
    /// Record that the logging or fix stage finished.
    Handoff {
        #[arg(value_enum)]
        stage: Handoff,
    },
    /// Check `.hunter/` layout, config, and session.
    Validate,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = Path::new(".");
    match cli.command {
        Command::Init { force } => {
            init_hunter(root, &InitOptions { force })?;
            Ok(exit_codes::OK)
        }
        Command::Report {
            feedback,
            qa,
            task,
            run_command,
            docs,
        } => {
            let session = report_bug(
                root,
                &BugReport {
                    feedback,
                    feedback_qa: qa,
                    current_task: task,
                    run_command,
                    docs,
                },
            )?;
            println!("{}", session.project.iteration.status);
            Ok(exit_codes::OK)
        }
        Command::Turn => cmd_turn(root),
        Command::Status => cmd_status(root),
        Command::Handoff { stage } => {
            let status = apply_handoff(root, stage)?;
            println!("{status}");
            Ok(exit_codes::OK)
        }
        Command::Validate => {
            match validate_hunter(root)? {
                SessionValidation::NoBugReported => println!("ok (no bug reported)"),
                SessionValidation::Ok { status, cycles } => {
                    println!("ok ({status}, {cycles} cycles)");
                }
            }
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_turn(root: &Path) -> Result<i32> {
    let paths = HunterPaths::new(root);
    let cfg = load_config(&paths.config_path)?;
    let backend = CommandBackend::new(cfg.backend);
    let channel = TerminalChannel::stdio();
    let report = run_turn_in(root, &backend, &channel)?;
    let status = match report.outcome {
        TurnOutcome::Advanced { to, .. } => to,
        TurnOutcome::Idle { status } => status,
    };
    println!("turn {}: {status}", report.turn);
    Ok(status_code(status))
}

fn cmd_status(root: &Path) -> Result<i32> {
    let paths = HunterPaths::new(root);
    if !paths.session_path.exists() {
        println!("no bug reported");
        return Ok(exit_codes::OK);
    }
    let session = load_session(&paths.session_path)?;
    let iteration = &session.project.iteration;
    println!("{}", iteration.status);
    println!("cycles: {}", iteration.cycles.len());
    if let Some(description) = &iteration.description {
        println!("\n{description}");
    }
    Ok(status_code(iteration.status))
}

fn status_code(status: IterationStatus) -> i32 {
    if status == IterationStatus::Complete {
        exit_codes::COMPLETE
    } else if status.is_handoff() {
        exit_codes::HANDOFF
    } else {
        exit_codes::OK
    }
}
