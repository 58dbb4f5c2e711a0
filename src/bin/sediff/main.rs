// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
use sediff::error::{LoadErrorItem, LoadErrors};
use sediff::{diff_policies, Report, SectionSelection};

mod args;
use args::Args;

use clap::Parser;
use is_terminal::IsTerminal;
use std::process::ExitCode;
use termcolor::ColorChoice;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug {
        Level::DEBUG
    } else if args.verbose {
        Level::INFO
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to initialize logging");
    }

    let diff = match diff_policies(&args.policy1, &args.policy2) {
        Ok(diff) => diff,
        Err(errors) => return print_errors(errors, args.debug),
    };

    let sections = SectionSelection::from_requested(args.sections());
    let report = Report::new(&diff, sections, args.stats);
    let stdout = std::io::stdout();
    match report.write(&mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_errors(errors: LoadErrors, debug: bool) -> ExitCode {
    // termcolor doesn't handle automatic terminal detection
    // https://docs.rs/termcolor/latest/termcolor/#detecting-presence-of-a-terminal
    let color = if std::io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    if debug {
        eprintln!("{:?}", backtrace::Backtrace::new());
    }
    for e in errors {
        if let LoadErrorItem::Parse(p) = e {
            p.print_diagnostic(color);
        } else {
            eprintln!("{}", e);
        }
    }
    ExitCode::FAILURE
}
