//! Confirmation loop that walks duplicate groups and applies merges.
//!
//! Input and output are injected so the loop can run against a terminal or
//! against in-memory buffers.

use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::applier::{apply_merge, ApplyMode, ApplyOutcome, VaultClient};
use crate::error::VaultResult;
use crate::grouper::{split_group_key, DuplicateGroups};
use crate::models::Record;
use crate::record_merge::merge_keyed_group;

/// How the session should behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Merge every group without prompting
    pub auto: bool,
    /// Describe changes instead of applying them
    pub dry_run: bool,
}

impl SessionOptions {
    fn apply_mode(&self) -> ApplyMode {
        if self.dry_run {
            ApplyMode::DryRun
        } else {
            ApplyMode::Live
        }
    }
}

/// Totals reported at the end of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub processed_groups: usize,
    pub skipped_groups: usize,
    pub failed_groups: usize,
    /// Losers folded into a winner across all processed groups
    pub records_merged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    Quit,
    /// The answer could not be read; the group is skipped.
    Unreadable(String),
}

/// Walk `groups` in key order, asking before each merge unless `auto` is set.
///
/// A group that fails to merge or apply is counted and the session moves on,
/// as does a group whose answer cannot be read. Only failures to write to
/// the terminal end the session with an error.
pub fn run_session<C, R, W>(
    groups: &DuplicateGroups,
    client: &mut C,
    options: SessionOptions,
    input: &mut R,
    output: &mut W,
) -> VaultResult<SessionSummary>
where
    C: VaultClient + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut summary = SessionSummary::default();

    for (key, group) in groups {
        write_group(output, key, group)?;

        if options.auto {
            writeln!(output, "[AUTO MODE] Merging group automatically...")?;
        } else {
            match prompt(input, output)? {
                Answer::Quit => {
                    writeln!(output, "Exiting...")?;
                    break;
                }
                Answer::No => {
                    summary.skipped_groups += 1;
                    writeln!(output, "Skipped.")?;
                    continue;
                }
                Answer::Unreadable(e) => {
                    error!(group = %key, error = %e, "failed to read answer");
                    writeln!(output, "Error reading input: {}", e)?;
                    summary.skipped_groups += 1;
                    continue;
                }
                Answer::Yes => {}
            }
        }

        let plan = match merge_keyed_group(key, group) {
            Ok(plan) => plan,
            Err(e) => {
                error!(group = %key, error = %e, "merge failed");
                writeln!(output, "Error merging items: {}", e)?;
                summary.failed_groups += 1;
                continue;
            }
        };

        match apply_merge(client, &plan.merged, &plan.losers, options.apply_mode()) {
            Ok(ApplyOutcome::Simulated(preview)) => {
                write!(output, "{}", preview)?;
            }
            Ok(ApplyOutcome::Applied { winner_id, archived_ids }) => {
                writeln!(
                    output,
                    "Successfully merged {} items into {}",
                    archived_ids.len(),
                    winner_id
                )?;
            }
            Err(e) => {
                error!(group = %key, error = %e, "applying merge failed");
                writeln!(output, "Error applying merge: {}", e)?;
                summary.failed_groups += 1;
                continue;
            }
        }

        info!(group = %key, winner_id = %plan.winner_id, losers = plan.losers.len(), "group processed");
        summary.processed_groups += 1;
        summary.records_merged += plan.losers.len();
    }

    Ok(summary)
}

/// Print the end-of-session summary.
pub fn write_summary<W: Write>(
    output: &mut W,
    summary: &SessionSummary,
    options: SessionOptions,
) -> VaultResult<()> {
    writeln!(output)?;
    writeln!(output, "=== Summary ===")?;
    writeln!(output, "Processed groups: {}", summary.processed_groups)?;
    writeln!(output, "Skipped groups: {}", summary.skipped_groups)?;
    writeln!(output, "Failed groups: {}", summary.failed_groups)?;
    writeln!(output, "Total items merged: {}", summary.records_merged)?;
    if options.dry_run {
        writeln!(output, "(Dry run - no changes were made)")?;
    }
    Ok(())
}

fn write_group<W: Write>(output: &mut W, key: &str, group: &[Record]) -> VaultResult<()> {
    let (domain, username) = split_group_key(key);

    writeln!(output)?;
    writeln!(output, "=== Duplicate Group: {} | {} ===", domain, username)?;
    writeln!(output, "Found {} duplicate items:", group.len())?;
    for (i, record) in group.iter().enumerate() {
        writeln!(
            output,
            "  {}. {:?} (ID: {}...) - Updated: {}",
            i + 1,
            record.title,
            id_prefix(&record.id),
            format_timestamp(&record.updated_at)
        )?;
        if let Some(url) = record.urls.first() {
            writeln!(output, "     URL: {}", url.href)?;
        }
    }
    writeln!(output)?;
    Ok(())
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> VaultResult<Answer> {
    loop {
        write!(output, "Merge these items? (y/n/q): ")?;
        output.flush()?;

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => {
                warn!("input closed, ending session");
                return Ok(Answer::Quit);
            }
            Ok(_) => {}
            Err(e) => return Ok(Answer::Unreadable(e.to_string())),
        }

        match line.trim().to_lowercase().as_str() {
            "y" => return Ok(Answer::Yes),
            "n" => return Ok(Answer::No),
            "q" => return Ok(Answer::Quit),
            _ => writeln!(output, "Invalid input. Please enter 'y', 'n', or 'q'.")?,
        }
    }
}

/// First eight characters of an id, on a char boundary.
fn id_prefix(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
