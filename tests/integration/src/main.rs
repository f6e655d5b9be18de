//! Integration Test Harness
//!
//! Runs the integration suites one after another and prints a summary.
//!
//! # Usage
//!
//! Run every suite:
//! ```text
//! cargo run -p integration-tests
//! ```
//!
//! Run some suites by name:
//! ```text
//! cargo run -p integration-tests -- compat_tests codegen_tests
//! ```
//!
//! Or a single suite directly:
//! ```text
//! cargo test -p integration-tests --test pipeline_tests
//! ```
//!
//! `RUST_LOG=idm=debug` shows the toolchain's own logging.

use std::process::{Command, ExitCode};
use std::time::{Duration, Instant};

/// One `[[test]]` target of this crate
struct Suite {
    target: &'static str,
    summary: &'static str,
}

const SUITES: &[Suite] = &[
    Suite {
        target: "pipeline_tests",
        summary: "IDL and XML front ends, lint rule files, path expansion",
    },
    Suite {
        target: "compat_tests",
        summary: "backwards compatibility between model revisions",
    },
    Suite {
        target: "codegen_tests",
        summary: "built-in generators, output storage, repeat runs",
    },
];

struct Outcome {
    target: &'static str,
    passed: bool,
    elapsed: Duration,
    detail: String,
}

fn run_suite(suite: &Suite) -> Outcome {
    println!("\n{}", "=".repeat(72));
    println!("{} ({})", suite.target, suite.summary);
    println!("{}", "=".repeat(72));

    let start = Instant::now();
    let result = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", suite.target, "--", "--nocapture"])
        .status();

    let (passed, detail) = match result {
        Ok(status) if status.success() => (true, "ok".to_string()),
        Ok(status) => (false, format!("exit code {:?}", status.code())),
        Err(e) => (false, format!("could not run cargo: {}", e)),
    };

    Outcome {
        target: suite.target,
        passed,
        elapsed: start.elapsed(),
        detail,
    }
}

fn main() -> ExitCode {
    let requested: Vec<String> = std::env::args().skip(1).collect();
    let selected: Vec<&Suite> = SUITES
        .iter()
        .filter(|s| requested.is_empty() || requested.iter().any(|r| r == s.target))
        .collect();

    if selected.is_empty() {
        eprintln!(
            "no suite matches {:?}; known suites: {}",
            requested,
            SUITES.iter().map(|s| s.target).collect::<Vec<_>>().join(", ")
        );
        return ExitCode::FAILURE;
    }

    println!("IDM toolchain integration tests: {} suite(s)", selected.len());

    let outcomes: Vec<Outcome> = selected.into_iter().map(run_suite).collect();

    println!("\n{}", "=".repeat(72));
    println!("{:<20} {:<6} {:<14} {}", "Suite", "Result", "Time", "Detail");
    println!("{}", "-".repeat(72));
    for outcome in &outcomes {
        println!(
            "{:<20} {:<6} {:<14?} {}",
            outcome.target,
            if outcome.passed { "PASS" } else { "FAIL" },
            outcome.elapsed,
            outcome.detail
        );
    }
    println!("{}", "=".repeat(72));

    let failed = outcomes.iter().filter(|o| !o.passed).count();
    if failed > 0 {
        println!("{} of {} suite(s) failed", failed, outcomes.len());
        ExitCode::FAILURE
    } else {
        println!("all suites passed");
        ExitCode::SUCCESS
    }
}
