// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Lints the templates named on the command line with the built-in rules.
//!
//! `cargo run -p microtmpl-lint --example lint_file -- page.html [config.json]`
use std::env;
use std::fs;
use std::process::ExitCode;

use microtmpl_lint::{builtin_rules, LintConfig, Linter};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: lint_file <template> [config.json]");
        return Ok(ExitCode::FAILURE);
    };
    let config = match args.next() {
        Some(config_path) => LintConfig::from_json(&fs::read_to_string(config_path)?)?,
        None => LintConfig::default(),
    };

    let linter = Linter::new(&builtin_rules(), &config)?;
    let report = linter.lint_path(&path)?;
    for diagnostic in &report.diagnostics {
        println!("{}:{diagnostic}", report.name);
    }
    println!(
        "{} errors, {} warnings",
        report.error_count(),
        report.warning_count()
    );
    Ok(if report.error_count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
