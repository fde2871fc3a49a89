//! vault-dedupe Core Library
//!
//! Duplicate detection and merging for password-manager logins:
//! - **domain**: Registrable-domain extraction (public suffix list)
//! - **grouper**: Buckets records by domain and username
//! - **record_merge**: Winner selection and superset merge with conflict archival
//! - **applier**: Saves the merged winner and archives the losers through a `VaultClient`
//! - **session**: Confirmation loop over duplicate groups
//!
//! Core operations accept typed records and also have JSON-in/JSON-out
//! twins, so any platform can fetch records itself and call this library
//! for the decision logic.
//!
//! # Example (conceptual)
//! ```ignore
//! let records: Vec<Record> = fetch_login_items();
//! let groups = group_duplicates(&records);
//! for group in groups.values() {
//!     let plan = merge_group(group)?;
//!     apply_merge(&mut client, &plan.merged, &plan.losers, ApplyMode::DryRun)?;
//! }
//! ```

pub mod applier;
pub mod domain;
pub mod error;
pub mod grouper;
pub mod models;
pub mod record_merge;
pub mod session;

pub use applier::{apply_merge, ApplyMode, ApplyOutcome, DryRunPreview, RecordRef, VaultClient};
pub use domain::normalize_domain;
pub use error::{VaultError, VaultOperation, VaultResult};
pub use grouper::{
    group_duplicates, group_duplicates_json, group_duplicates_with_report, DuplicateGroups,
    GroupingOutput, GroupingStats, SkipReason, SkippedRecord,
};
pub use models::{Field, Record, Section, UrlEntry, VaultRef};
pub use record_merge::{
    calculate_merge, merge_group, merge_group_json, merge_keyed_group, select_winner,
    GroupMergePlan, MergeStats, ARCHIVED_CONFLICTS_SECTION_ID,
};
pub use session::{run_session, write_summary, SessionOptions, SessionSummary};

// 1Password CLI client
#[cfg(feature = "cli")]
pub mod op_cli;

#[cfg(feature = "cli")]
pub use op_cli::OpCli;

// WASM bindings
#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::*;

// C FFI exports for .NET P/Invoke
#[cfg(feature = "ffi")]
pub mod ffi;
