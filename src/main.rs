//! vault-dedupe - find and merge duplicate 1Password logins.
//!
//! Fetches login items through the `op` CLI, groups them by registrable
//! domain and username, and merges each group after confirmation.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use vault_dedupe::{group_duplicates_with_report, run_session, write_summary, OpCli, SessionOptions};

/// Command-line arguments for vault-dedupe
#[derive(Parser, Debug)]
#[command(name = "vault-dedupe")]
#[command(about = "Merge duplicate 1Password login entries")]
#[command(version)]
struct Args {
    /// Vault to scan (uses the default vault if not specified)
    #[arg(long, env = "VAULT_DEDUPE_VAULT")]
    vault: Option<String>,

    /// Print what would happen without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Merge every duplicate group without prompting
    #[arg(long)]
    auto: bool,

    /// Path to the 1Password CLI binary
    #[arg(long, default_value = "op", env = "OP_BIN")]
    op_bin: PathBuf,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the conversation
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vault_dedupe=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let options = SessionOptions {
        auto: args.auto,
        dry_run: args.dry_run,
    };

    if options.dry_run {
        println!("Dry Run Mode Enabled");
    }

    let mut client = OpCli::new(args.op_bin);
    client
        .verify_ready()
        .context("1Password CLI is not ready")?;

    let records = client
        .fetch_records(args.vault.as_deref())
        .context("Failed to fetch items from 1Password")?;
    println!("Found {} login items in vault", records.len());

    let grouping = group_duplicates_with_report(&records);
    for skipped in &grouping.skipped {
        debug!(record_id = %skipped.id, title = %skipped.title, reason = ?skipped.reason, "not grouped");
    }
    info!(
        scanned = grouping.stats.records_scanned,
        skipped = grouping.stats.records_skipped,
        groups = grouping.stats.groups_found,
        "grouping complete"
    );

    if grouping.groups.is_empty() {
        println!("No duplicate items found.");
        return Ok(());
    }
    println!("Found {} duplicate groups", grouping.groups.len());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();

    let summary = run_session(&grouping.groups, &mut client, options, &mut input, &mut output)
        .context("Session aborted")?;
    write_summary(&mut output, &summary, options)?;

    Ok(())
}
