use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commit_buddy::client::{self, SessionOptions};
use commit_buddy::diff::DiffSource;

#[derive(Parser)]
#[command(name = "commit-buddy")]
#[command(about = "Generate commit messages from git diffs over MCP")]
#[command(
    long_about = "Spawns a commit-buddy MCP server as a child process, drives the \
initialize/tools-list/tools-call handshake over stdio, and prints the generated \
conventional commit message.\n\n\
When the server cannot be reached or does not answer in time, the diff is \
classified locally instead, so a message is always produced. Pass --no-fallback \
to surface the failure as text instead."
)]
struct Args {
    /// The diff to generate a commit message for
    #[arg(short, long)]
    diff: Option<String>,

    /// File containing the diff
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Get diff from git staged changes
    #[arg(short, long)]
    git: bool,

    /// Timeout in seconds for each server response
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    /// Path to the server executable
    #[arg(short, long, default_value = "commit-buddy-server")]
    server: String,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Disable the local classification fallback
    #[arg(long)]
    no_fallback: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.debug {
        "commit_buddy=debug"
    } else {
        "commit_buddy=warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let source = if let Some(text) = args.diff {
        DiffSource::Literal(text)
    } else if let Some(path) = args.file {
        DiffSource::File(path)
    } else if args.git {
        DiffSource::Staged
    } else {
        eprintln!("Error: No diff provided. Use --diff, --file, or --git");
        std::process::exit(1);
    };

    let diff = match source.load() {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let options = SessionOptions {
        server_command: args.server,
        timeout: Duration::from_secs(args.timeout),
        fallback: !args.no_fallback,
        ..SessionOptions::default()
    };

    let message = client::generate_commit_message(&diff, &options).await;
    println!("{message}");
}
