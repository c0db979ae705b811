use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for starscape")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, deny, doc, smoke
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny check
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the star pool timing harness
    Bench,
    /// Mount a headless view, run frames, and tear it down
    Smoke {
        #[arg(short, long, default_value = "60")]
        frames: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_deny()?;
            run_doc()?;
            run_smoke(60)?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Deny => run_deny()?,
        Commands::Doc => run_doc()?,
        Commands::Build => run_build()?,
        Commands::Bench => run_bench()?,
        Commands::Smoke { frames } => run_smoke(frames)?,
    }

    Ok(())
}

/// Run `cargo <args>` and fail with `what` if it exits unsuccessfully.
fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("cargo fmt check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "cargo clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn run_tests() -> Result<()> {
    cargo("cargo test", &["test", "--workspace"])
}

fn run_deny() -> Result<()> {
    cargo(
        "cargo deny check",
        &["deny", "check", "licenses", "bans", "sources"],
    )
}

fn run_doc() -> Result<()> {
    cargo("cargo doc", &["doc", "--workspace", "--no-deps"])
}

fn run_build() -> Result<()> {
    cargo("cargo build", &["build", "--workspace"])
}

fn run_bench() -> Result<()> {
    cargo(
        "star pool bench",
        &["bench", "-p", "starscape-view", "--bench", "bench_star_pool"],
    )
}

fn run_smoke(frames: u64) -> Result<()> {
    let frames = frames.to_string();
    cargo(
        "headless smoke run",
        &[
            "run",
            "-p",
            "starscape-cli",
            "--",
            "simulate",
            "--frames",
            &frames,
            "--seed",
            "7",
        ],
    )
}
