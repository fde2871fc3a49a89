//! Duplicate detection: buckets records by registrable domain and username.
//!
//! Records that cannot be keyed (no username, no URL, or a URL that does not
//! normalize) are skipped rather than failing the batch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::normalize_domain;
use crate::error::VaultResult;
use crate::models::Record;

/// Duplicate groups keyed by `"domain|username"`, iterated in key order.
pub type DuplicateGroups = BTreeMap<String, Vec<Record>>;

/// Why a record was left out of grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingUsername,
    MissingUrl,
    InvalidUrl { message: String },
}

/// A record that could not be grouped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub id: String,
    pub title: String,
    pub reason: SkipReason,
}

/// Statistics about a grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingStats {
    /// Records inspected
    pub records_scanned: usize,
    /// Records that ended up in a duplicate group
    pub records_grouped: usize,
    /// Records with no usable username or URL
    pub records_skipped: usize,
    /// Groups with two or more members
    pub groups_found: usize,
}

/// Output of the grouping pass, including what was left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingOutput {
    pub groups: DuplicateGroups,
    pub skipped: Vec<SkippedRecord>,
    pub stats: GroupingStats,
}

/// Group records sharing registrable domain and username.
///
/// Only groups with at least two members are returned. Within a group the
/// input order is preserved.
pub fn group_duplicates(records: &[Record]) -> DuplicateGroups {
    group_duplicates_with_report(records).groups
}

/// Same as [`group_duplicates`], but also reports the records that were
/// skipped and why.
pub fn group_duplicates_with_report(records: &[Record]) -> GroupingOutput {
    let mut buckets: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    let mut skipped: Vec<SkippedRecord> = Vec::new();

    for record in records {
        match grouping_key(record) {
            Ok(key) => buckets.entry(key).or_default().push(record.clone()),
            Err(reason) => {
                debug!(record_id = %record.id, ?reason, "skipping record during grouping");
                skipped.push(SkippedRecord {
                    id: record.id.clone(),
                    title: record.title.clone(),
                    reason,
                });
            }
        }
    }

    // Single-item buckets are not duplicates
    buckets.retain(|_, group| group.len() >= 2);

    let stats = GroupingStats {
        records_scanned: records.len(),
        records_grouped: buckets.values().map(Vec::len).sum(),
        records_skipped: skipped.len(),
        groups_found: buckets.len(),
    };

    GroupingOutput {
        groups: buckets,
        skipped,
        stats,
    }
}

/// Build the `"domain|username"` key for a record.
pub fn grouping_key(record: &Record) -> Result<String, SkipReason> {
    let username = record
        .normalized_username()
        .ok_or(SkipReason::MissingUsername)?;

    let url = match record.primary_url() {
        Some(entry) if !entry.href.is_empty() => entry.href.as_str(),
        _ => return Err(SkipReason::MissingUrl),
    };

    let domain = normalize_domain(url).map_err(|e| SkipReason::InvalidUrl {
        message: e.to_string(),
    })?;

    Ok(format!("{}|{}", domain.to_lowercase(), username))
}

/// Split a grouping key back into its domain and username parts.
pub fn split_group_key(key: &str) -> (&str, &str) {
    key.split_once('|').unwrap_or((key, ""))
}

/// Group records from a JSON array and return a JSON [`GroupingOutput`].
/// Convenience function for FFI.
pub fn group_duplicates_json(input_json: &str) -> VaultResult<String> {
    let records: Vec<Record> = serde_json::from_str(input_json)?;
    let output = group_duplicates_with_report(&records);
    let output_json = serde_json::to_string(&output)?;
    Ok(output_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, UrlEntry};

    fn make_record(id: &str, username: &str, url: &str) -> Record {
        Record {
            id: id.to_string(),
            title: format!("Record {}", id),
            additional_information: username.to_string(),
            urls: if url.is_empty() {
                vec![]
            } else {
                vec![UrlEntry {
                    href: url.to_string(),
                    primary: true,
                    ..Default::default()
                }]
            },
            ..Default::default()
        }
    }

    fn ids(group: &[Record]) -> Vec<&str> {
        group.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_groups_across_subdomains() {
        let records = vec![
            make_record("1", "alice", "https://mail.google.com"),
            make_record("2", "alice", "https://accounts.google.com/signin"),
            make_record("3", "bob", "https://google.com"),
        ];

        let groups = group_duplicates(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups["google.com|alice"]), vec!["1", "2"]);
    }

    #[test]
    fn test_username_case_and_whitespace_normalized() {
        let records = vec![
            make_record("1", "Alice@Example.com", "https://example.com"),
            make_record("2", "  alice@example.com ", "https://www.example.com"),
        ];

        let groups = group_duplicates(&records);

        assert_eq!(ids(&groups["example.com|alice@example.com"]), vec!["1", "2"]);
    }

    #[test]
    fn test_username_from_fields_when_no_additional_information() {
        let mut with_field = make_record("1", "", "https://github.com");
        with_field.fields.push(Field {
            id: "username".into(),
            field_type: "username".into(),
            label: "username".into(),
            value: "Octocat".into(),
            section: None,
        });
        let records = vec![with_field, make_record("2", "octocat", "github.com")];

        let groups = group_duplicates(&records);

        assert_eq!(ids(&groups["github.com|octocat"]), vec!["1", "2"]);
    }

    #[test]
    fn test_group_preserves_input_order() {
        let records = vec![
            make_record("c", "u", "https://x.com"),
            make_record("a", "u", "https://x.com"),
            make_record("b", "u", "https://x.com"),
        ];

        let groups = group_duplicates(&records);

        assert_eq!(ids(&groups["x.com|u"]), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_singletons_never_returned() {
        let records = vec![
            make_record("1", "alice", "https://a.com"),
            make_record("2", "alice", "https://b.com"),
            make_record("3", "bob", "https://a.com"),
            make_record("4", "bob", "https://a.com"),
        ];

        let groups = group_duplicates(&records);

        assert_eq!(groups.len(), 1);
        assert!(groups.values().all(|g| g.len() >= 2));
    }

    #[test]
    fn test_malformed_record_does_not_abort_batch() {
        let records = vec![
            make_record("1", "alice", "https://example.com"),
            make_record("bad", "alice", "http://[invalid"),
            make_record("2", "alice", "https://login.example.com"),
        ];

        let output = group_duplicates_with_report(&records);

        assert_eq!(ids(&output.groups["example.com|alice"]), vec!["1", "2"]);
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].id, "bad");
        assert!(matches!(output.skipped[0].reason, SkipReason::InvalidUrl { .. }));
    }

    #[test]
    fn test_records_without_username_or_url_skipped() {
        let records = vec![
            make_record("no-user", "", "https://example.com"),
            make_record("no-url", "alice", ""),
            make_record("1", "alice", "https://example.com"),
        ];

        let output = group_duplicates_with_report(&records);

        assert!(output.groups.is_empty());
        assert_eq!(output.skipped[0].reason, SkipReason::MissingUsername);
        assert_eq!(output.skipped[1].reason, SkipReason::MissingUrl);
        assert_eq!(
            output.stats,
            GroupingStats {
                records_scanned: 3,
                records_grouped: 0,
                records_skipped: 2,
                groups_found: 0,
            }
        );
    }

    #[test]
    fn test_empty_href_counts_as_missing_url() {
        let record = make_record("1", "alice", "");
        let mut with_blank = record.clone();
        with_blank.urls.push(UrlEntry::default());

        assert_eq!(grouping_key(&with_blank), Err(SkipReason::MissingUrl));
    }

    #[test]
    fn test_ip_and_localhost_keys_are_exact() {
        let records = vec![
            make_record("1", "admin", "http://192.168.1.1:8080"),
            make_record("2", "admin", "192.168.1.1"),
            make_record("3", "admin", "http://192.168.1.2"),
            make_record("4", "dev", "http://localhost:3000"),
            make_record("5", "dev", "localhost:8080"),
        ];

        let groups = group_duplicates(&records);

        assert_eq!(ids(&groups["192.168.1.1|admin"]), vec!["1", "2"]);
        assert_eq!(ids(&groups["localhost|dev"]), vec!["4", "5"]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_split_group_key() {
        assert_eq!(split_group_key("example.com|alice"), ("example.com", "alice"));
        assert_eq!(split_group_key("example.com"), ("example.com", ""));
    }

    #[test]
    fn test_group_duplicates_json() {
        let input = r#"[
            {"id": "1", "additional_information": "alice", "urls": [{"href": "https://a.example.com", "primary": true}]},
            {"id": "2", "additional_information": "alice", "urls": [{"href": "https://b.example.com", "primary": false}]},
            {"id": "3"}
        ]"#;

        let output_json = group_duplicates_json(input).unwrap();
        let output: GroupingOutput = serde_json::from_str(&output_json).unwrap();

        assert_eq!(output.stats.groups_found, 1);
        assert_eq!(output.stats.records_grouped, 2);
        assert_eq!(output.stats.records_skipped, 1);
        assert_eq!(ids(&output.groups["example.com|alice"]), vec!["1", "2"]);
    }
}
