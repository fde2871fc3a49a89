//! Record types shared by every stage of the pipeline.
//!
//! The JSON shape matches what the `op` CLI emits for login items. All
//! attributes default when missing, so the sparse `op item list` output and
//! the full `op item get` output deserialize into the same type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single credential entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub urls: Vec<UrlEntry>,
    #[serde(default)]
    pub vault: VaultRef,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Listing output carries the username here.
    #[serde(default)]
    pub additional_information: String,
}

/// A URL associated with a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub primary: bool,
}

/// A field within a record.
///
/// `label` is the conflict-matching key during merge and is compared
/// case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
}

/// Section tag referenced by a field. Each field owns its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
}

impl Section {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Vault the record lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Record {
    /// The URL used for grouping: first primary entry, else the first entry.
    pub fn primary_url(&self) -> Option<&UrlEntry> {
        self.urls
            .iter()
            .find(|u| u.primary)
            .or_else(|| self.urls.first())
    }

    /// Normalized username, or `None` when the record has none.
    ///
    /// Listing output puts the username in `additional_information`; full
    /// item output has it as a field of type `username`. When
    /// `additional_information` is present it wins, even if it trims to
    /// nothing.
    pub fn normalized_username(&self) -> Option<String> {
        let raw = if !self.additional_information.is_empty() {
            self.additional_information.as_str()
        } else {
            self.fields
                .iter()
                .find(|f| f.field_type == "username")
                .map(|f| f.value.as_str())?
        };

        let username = raw.trim().to_lowercase();
        if username.is_empty() {
            None
        } else {
            Some(username)
        }
    }
}

/// Parse a timestamp in the formats the vault tools emit.
/// Handles both RFC3339 format (2025-12-11T06:50:10.674Z) and
/// SQLite format (2025-12-11 06:50:10.674).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(DateTime::<Utc>::default()),
        Some(s) if s.is_empty() => Ok(DateTime::<Utc>::default()),
        Some(s) => parse_timestamp(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_list_output() {
        let json = r#"[{
            "id": "abc123",
            "title": "GitHub",
            "version": 4,
            "vault": {"id": "v1", "name": "Private"},
            "category": "LOGIN",
            "updated_at": "2024-03-01T10:00:00Z",
            "additional_information": "octocat",
            "urls": [{"label": "website", "primary": true, "href": "https://github.com"}]
        }]"#;

        let records: Vec<Record> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "abc123");
        assert_eq!(records[0].vault.name, "Private");
        assert!(records[0].fields.is_empty());
        assert_eq!(
            records[0].updated_at,
            parse_timestamp("2024-03-01T10:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_field_wire_names() {
        let json = r#"{"id":"f1","type":"STRING","label":"pin","value":"1234","section":{"id":"extra"}}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type, "STRING");
        assert_eq!(field.section, Some(Section::new("extra")));

        let out = serde_json::to_value(&field).unwrap();
        assert_eq!(out["type"], "STRING");
        assert_eq!(out["section"]["id"], "extra");
    }

    #[test]
    fn test_absent_section_and_label_omitted() {
        let field = Field {
            id: "f1".to_string(),
            field_type: "STRING".to_string(),
            label: "notes".to_string(),
            value: "x".to_string(),
            section: None,
        };
        let out = serde_json::to_value(&field).unwrap();
        assert!(out.get("section").is_none());

        let url = UrlEntry {
            label: String::new(),
            href: "https://x.com".to_string(),
            primary: true,
        };
        let out = serde_json::to_value(&url).unwrap();
        assert!(out.get("label").is_none());
    }

    #[test]
    fn test_sqlite_timestamp_and_missing_timestamp() {
        let with_sqlite: Record =
            serde_json::from_str(r#"{"id":"1","updated_at":"2025-12-11 06:50:10.674"}"#).unwrap();
        assert_eq!(
            with_sqlite.updated_at,
            parse_timestamp("2025-12-11T06:50:10.674Z").unwrap()
        );

        let missing: Record = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
        assert_eq!(missing.updated_at, DateTime::<Utc>::default());

        let bad = serde_json::from_str::<Record>(r#"{"id":"1","updated_at":"yesterday"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_primary_url_prefers_flagged_entry() {
        let record = Record {
            urls: vec![
                UrlEntry { href: "https://a.com".into(), ..Default::default() },
                UrlEntry { href: "https://b.com".into(), primary: true, ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(record.primary_url().unwrap().href, "https://b.com");

        let unflagged = Record {
            urls: vec![
                UrlEntry { href: "https://a.com".into(), ..Default::default() },
                UrlEntry { href: "https://b.com".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(unflagged.primary_url().unwrap().href, "https://a.com");
        assert!(Record::default().primary_url().is_none());
    }

    #[test]
    fn test_normalized_username_sources() {
        let from_info = Record {
            additional_information: "  User@Example.com ".into(),
            fields: vec![Field {
                field_type: "username".into(),
                value: "other".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(from_info.normalized_username().as_deref(), Some("user@example.com"));

        let from_field = Record {
            fields: vec![
                Field { field_type: "password".into(), value: "secret".into(), ..Default::default() },
                Field { field_type: "username".into(), value: " Alice ".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(from_field.normalized_username().as_deref(), Some("alice"));

        let blank_info = Record {
            additional_information: "   ".into(),
            fields: vec![Field {
                field_type: "username".into(),
                value: "alice".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(blank_info.normalized_username(), None);

        assert_eq!(Record::default().normalized_username(), None);
    }
}
