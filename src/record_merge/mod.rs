//! Record merge logic using a superset strategy with conflict archival.
//!
//! The newest record in a group survives. Every other record is folded into
//! it in group order: unique fields and URLs are added, identical ones are
//! dropped, and fields whose label collides with different content are kept
//! under the `archived_conflicts` section for manual review.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{VaultError, VaultResult};
use crate::models::{Field, Record, Section, UrlEntry};

/// Section id holding conflicting loser fields.
pub const ARCHIVED_CONFLICTS_SECTION_ID: &str = "archived_conflicts";

/// Statistics about what was merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Loser fields with a label the winner did not have
    pub fields_added: u32,
    /// Loser fields that collided with different content
    pub conflicts_archived: u32,
    /// Loser fields identical to an existing field
    pub duplicate_fields_dropped: u32,
    /// Loser URLs added to the winner
    pub urls_added: u32,
    /// Added URLs whose primary flag was cleared
    pub urls_demoted: u32,
    /// Loser URLs already present on the winner
    pub duplicate_urls_dropped: u32,
}

impl MergeStats {
    fn absorb(&mut self, other: &MergeStats) {
        self.fields_added += other.fields_added;
        self.conflicts_archived += other.conflicts_archived;
        self.duplicate_fields_dropped += other.duplicate_fields_dropped;
        self.urls_added += other.urls_added;
        self.urls_demoted += other.urls_demoted;
        self.duplicate_urls_dropped += other.duplicate_urls_dropped;
    }
}

/// The outcome of merging a whole duplicate group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMergePlan {
    /// `"domain|username"` key of the group, when merged through
    /// [`merge_keyed_group`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    /// Id of the surviving record
    pub winner_id: String,
    /// The winner with every loser folded in
    pub merged: Record,
    /// Records to archive once the merged winner is saved
    pub losers: Vec<Record>,
    /// Overall statistics
    pub stats: MergeStats,
}

/// Pick the most recently updated record.
///
/// Ties keep the earliest record, so callers should pass records in fetch
/// order. An empty group yields an empty record.
pub fn select_winner(group: &[Record]) -> Record {
    let mut iter = group.iter();
    let Some(first) = iter.next() else {
        return Record::default();
    };

    let mut winner = first;
    for candidate in iter {
        if candidate.updated_at > winner.updated_at {
            winner = candidate;
        }
    }

    winner.clone()
}

/// Merge `loser` into a copy of `winner`.
///
/// Neither input is modified. The result keeps the winner's identity and
/// scalar attributes.
pub fn calculate_merge(winner: &Record, loser: &Record) -> VaultResult<Record> {
    let mut stats = MergeStats::default();
    Ok(merge_records(winner, loser, &mut stats))
}

/// Select the winner of a group and fold every other record into it.
///
/// Losers are all records whose id differs from the winner's, in group order.
pub fn merge_group(group: &[Record]) -> VaultResult<GroupMergePlan> {
    if group.is_empty() {
        return Err(VaultError::InvalidInput("cannot merge an empty group".to_string()));
    }

    let winner = select_winner(group);
    let losers: Vec<Record> = group
        .iter()
        .filter(|record| record.id != winner.id)
        .cloned()
        .collect();

    let mut stats = MergeStats::default();
    let mut merged = winner;
    for loser in &losers {
        let mut step = MergeStats::default();
        merged = merge_records(&merged, loser, &mut step);
        debug!(
            winner_id = %merged.id,
            loser_id = %loser.id,
            fields_added = step.fields_added,
            conflicts_archived = step.conflicts_archived,
            urls_added = step.urls_added,
            "merged record"
        );
        stats.absorb(&step);
    }

    Ok(GroupMergePlan {
        group_key: None,
        winner_id: merged.id.clone(),
        merged,
        losers,
        stats,
    })
}

/// Same as [`merge_group`], with the group's key carried on the plan.
pub fn merge_keyed_group(key: &str, group: &[Record]) -> VaultResult<GroupMergePlan> {
    let mut plan = merge_group(group)?;
    plan.group_key = Some(key.to_string());
    Ok(plan)
}

/// Merge a JSON array of records (one group) and return a JSON [`GroupMergePlan`].
/// Convenience function for FFI.
pub fn merge_group_json(input_json: &str) -> VaultResult<String> {
    let group: Vec<Record> = serde_json::from_str(input_json)?;
    let plan = merge_group(&group)?;
    let plan_json = serde_json::to_string(&plan)?;
    Ok(plan_json)
}

fn merge_records(winner: &Record, loser: &Record, stats: &mut MergeStats) -> Record {
    // Clone is a deep copy: every field owns its section.
    let mut merged = winner.clone();
    let winner_has_primary = winner.urls.iter().any(|u| u.primary);

    for loser_field in &loser.fields {
        match find_field_by_label(&merged.fields, &loser_field.label) {
            None => {
                merged.fields.push(loser_field.clone());
                stats.fields_added += 1;
            }
            Some(existing) if fields_identical(existing, loser_field) => {
                stats.duplicate_fields_dropped += 1;
            }
            Some(_) => {
                let section = archived_conflicts_section(&merged.fields);
                merged.fields.push(Field {
                    section: Some(section),
                    ..loser_field.clone()
                });
                stats.conflicts_archived += 1;
            }
        }
    }

    for loser_url in &loser.urls {
        if url_exists(&merged.urls, &loser_url.href) {
            stats.duplicate_urls_dropped += 1;
            continue;
        }

        let demote = loser_url.primary && winner_has_primary;
        merged.urls.push(UrlEntry {
            primary: loser_url.primary && !demote,
            ..loser_url.clone()
        });
        stats.urls_added += 1;
        if demote {
            stats.urls_demoted += 1;
        }
    }

    merged
}

/// First field with exactly this label (case-sensitive).
fn find_field_by_label<'a>(fields: &'a [Field], label: &str) -> Option<&'a Field> {
    fields.iter().find(|field| field.label == label)
}

/// Same value, type and section id. Two absent sections are equal.
fn fields_identical(a: &Field, b: &Field) -> bool {
    let same_section = match (&a.section, &b.section) {
        (None, None) => true,
        (Some(x), Some(y)) => x.id == y.id,
        _ => false,
    };
    a.value == b.value && a.field_type == b.field_type && same_section
}

/// Exact href match, no normalization.
fn url_exists(urls: &[UrlEntry], href: &str) -> bool {
    urls.iter().any(|url| url.href == href)
}

/// Copy of an existing `archived_conflicts` section, or a fresh one.
fn archived_conflicts_section(fields: &[Field]) -> Section {
    fields
        .iter()
        .filter_map(|field| field.section.as_ref())
        .find(|section| section.id == ARCHIVED_CONFLICTS_SECTION_ID)
        .cloned()
        .unwrap_or_else(|| Section::new(ARCHIVED_CONFLICTS_SECTION_ID))
}
