//! Applies a merge plan to the external vault.
//!
//! The vault is reached through the narrow [`VaultClient`] capability so that
//! callers can plug in the `op` CLI or a test double. Failures halt the
//! sequence immediately; archives already issued are not rolled back.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info};

use crate::error::{VaultError, VaultOperation, VaultResult};
use crate::models::Record;

/// Operations the vault must support for a merge to be applied.
pub trait VaultClient {
    /// Replace the record with `id` using the full JSON body.
    fn edit_record(&mut self, id: &str, body_json: &str) -> VaultResult<()>;

    /// Move the record with `id` to the archive.
    fn archive_record(&mut self, id: &str) -> VaultResult<()>;
}

/// Whether to touch the vault or only describe what would happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    #[default]
    Live,
    DryRun,
}

/// Reference to a record in a dry-run preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: String,
    pub title: String,
}

impl From<&Record> for RecordRef {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
        }
    }
}

/// What a live apply would have done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRunPreview {
    pub winner: RecordRef,
    /// Pretty-printed JSON body that would be sent with the edit
    pub body: String,
    pub archived: Vec<RecordRef>,
}

impl fmt::Display for DryRunPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[DRY RUN] Would edit item: {} ({})",
            self.winner.id, self.winner.title
        )?;
        writeln!(f, "{}", self.body)?;
        for loser in &self.archived {
            writeln!(f, "[DRY RUN] Would archive item: {} ({})", loser.id, loser.title)?;
        }
        Ok(())
    }
}

/// Result of [`apply_merge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Applied {
        winner_id: String,
        archived_ids: Vec<String>,
    },
    Simulated(DryRunPreview),
}

/// Save the merged winner and archive every loser.
///
/// In [`ApplyMode::DryRun`] the client is never called.
pub fn apply_merge<C: VaultClient + ?Sized>(
    client: &mut C,
    winner: &Record,
    losers: &[Record],
    mode: ApplyMode,
) -> VaultResult<ApplyOutcome> {
    let body = serde_json::to_string_pretty(winner)?;

    if mode == ApplyMode::DryRun {
        return Ok(ApplyOutcome::Simulated(DryRunPreview {
            winner: RecordRef::from(winner),
            body,
            archived: losers.iter().map(RecordRef::from).collect(),
        }));
    }

    client.edit_record(&winner.id, &body).map_err(|e| {
        error!(record_id = %winner.id, error = %e, "edit failed");
        VaultError::ExternalOperation {
            operation: VaultOperation::Edit,
            record_id: winner.id.clone(),
            archived: Vec::new(),
            message: e.to_string(),
        }
    })?;
    info!(record_id = %winner.id, "saved merged record");

    let mut archived_ids: Vec<String> = Vec::with_capacity(losers.len());
    for loser in losers {
        if let Err(e) = client.archive_record(&loser.id) {
            error!(
                record_id = %loser.id,
                already_archived = archived_ids.len(),
                error = %e,
                "archive failed"
            );
            return Err(VaultError::ExternalOperation {
                operation: VaultOperation::Archive,
                record_id: loser.id.clone(),
                archived: archived_ids,
                message: e.to_string(),
            });
        }
        info!(record_id = %loser.id, "archived duplicate");
        archived_ids.push(loser.id.clone());
    }

    Ok(ApplyOutcome::Applied {
        winner_id: winner.id.clone(),
        archived_ids,
    })
}
