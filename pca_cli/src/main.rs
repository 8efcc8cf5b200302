#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `pca9685`: drive a PCA9685 PWM controller from the command line.

mod cli;
mod error_fmt;
mod logging;
mod run;

use clap::Parser;

use crate::cli::{Cli, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    // Install pretty panic/error reports; ignore a second install.
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let mut log_guard = None;
    if let Err(err) = run::run(cli, &mut log_guard) {
        tracing::error!(error = %err, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        let code = exit_code_for_error(&err);
        // exit() skips destructors; flush the log file first.
        drop(log_guard);
        std::process::exit(code);
    }
}
