//! Development automation tasks for the Waitline workspace.
//!
//! Run with: `cargo xtask <command>`
//!
//! This is a CLI tool for developers, so `println!` and `eprintln!` are
//! intentionally used for user-facing output rather than structured logging.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::Context;

mod features;

fn main() -> ExitCode {
    let task = env::args().nth(1);

    let result = match task.as_deref() {
        Some("ci") => run_ci(),
        Some("fmt") => run_fmt(),
        Some("clippy") => run_clippy(),
        Some("test") => run_test(),
        Some("bench") => run_bench_build(),
        Some("deny") => run_deny(),
        Some("audit") => run_audit(),
        Some("test-features") => features::test_feature_matrix(),
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(unknown) => {
            eprintln!("Unknown task: {unknown}");
            eprintln!();
            print_help();
            Err(anyhow::anyhow!("Unknown task"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Task failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("Waitline Development Tasks");
    println!();
    println!("USAGE:");
    println!("    cargo xtask <TASK>");
    println!();
    println!("TASKS:");
    println!("    ci             Run all CI checks (fmt, clippy, features, test, bench, deny, audit)");
    println!("    fmt            Check Rust code formatting");
    println!("    clippy         Run Clippy lints");
    println!("    test           Run all tests");
    println!("    bench          Compile benchmarks without running them");
    println!("    test-features  Verify waitline-common feature tiers compile");
    println!("    deny           Check dependencies with cargo-deny");
    println!("    audit          Audit dependencies for security vulnerabilities");
    println!("    help           Show this help message");
}

/// Run all CI checks in sequence
fn run_ci() -> anyhow::Result<()> {
    println!("==> Running CI checks...\n");

    println!("==> Step 1/7: Checking Rust format...");
    run_fmt()?;

    println!("\n==> Step 2/7: Running Clippy...");
    run_clippy()?;

    println!("\n==> Step 3/7: Checking feature tiers...");
    features::test_feature_matrix()?;

    println!("\n==> Step 4/7: Running tests...");
    run_test()?;

    println!("\n==> Step 5/7: Building benchmarks...");
    run_bench_build()?;

    println!("\n==> Step 6/7: Checking dependencies...");
    run_deny()?;

    println!("\n==> Step 7/7: Auditing dependencies...");
    run_audit()?;

    println!("\n✓ All CI checks passed!");
    Ok(())
}

/// Run a cargo subcommand, failing with `message` on a non-zero exit
fn cargo(args: &[&str], message: &str) -> anyhow::Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("{message}");
    }

    Ok(())
}

/// Ensure a cargo plugin is installed before running it
fn require_plugin(plugin: &str) -> anyhow::Result<()> {
    let check_installed = Command::new("cargo").args([plugin, "--version"]).output();

    if check_installed.is_err() || !check_installed.as_ref().is_ok_and(|o| o.status.success()) {
        eprintln!("cargo-{plugin} is not installed.");
        eprintln!("Install it with: cargo install cargo-{plugin}");
        anyhow::bail!("cargo-{plugin} not found");
    }

    Ok(())
}

/// Check Rust code formatting
fn run_fmt() -> anyhow::Result<()> {
    cargo(&["fmt", "--all", "--", "--check"], "Format check failed. Run 'cargo fmt --all' to fix.")
}

/// Run Clippy lints
fn run_clippy() -> anyhow::Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--all-features"], "Clippy run failed. See output above.")
}

/// Run all workspace tests
fn run_test() -> anyhow::Result<()> {
    cargo(&["test", "--workspace", "--all-features"], "Tests failed")
}

/// Compile criterion benchmarks so they cannot rot
fn run_bench_build() -> anyhow::Result<()> {
    cargo(&["bench", "--workspace", "--all-features", "--no-run"], "Benchmarks failed to compile")
}

/// Check dependencies with cargo-deny
fn run_deny() -> anyhow::Result<()> {
    require_plugin("deny")?;
    cargo(&["deny", "check"], "cargo-deny found issues")
}

/// Audit dependencies for security vulnerabilities
fn run_audit() -> anyhow::Result<()> {
    require_plugin("audit")?;
    cargo(&["audit"], "cargo-audit found vulnerabilities")
}
