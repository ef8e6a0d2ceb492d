use serde::{Deserialize, Serialize};

/// Provenance sentinel for a blob the metadata store has no row for.
pub const UNKNOWN_SUBMITTER: &str = "Unknown Student";
/// Timestamp sentinel for a blob the metadata store has no row for.
pub const UNKNOWN_TIME: &str = "Unknown Time";

/// Timestamp format written to metadata rows.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical view of one submitted file, merged from both stores.
///
/// Keyed by `file_name`; the external stores stay authoritative and a
/// record may be partial when only one store knows the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub submitter_name: String,
    pub file_name: String,
    pub submitted_at: String,
    pub blob_url: String,
    /// Store-internal identifier; absent when the file is known only from
    /// the metadata store.
    pub blob_id: Option<String>,
    pub mime_type: Option<String>,
    /// Routing target committed at submit time, when known.
    pub route_target: Option<i64>,
    /// Metadata row with no matching blob entry.
    pub missing_blob: bool,
}

impl Submission {
    /// The blob side of this record exists. Dedup checks key off this:
    /// a name whose payload is already stored cannot be resubmitted,
    /// whatever the metadata store says.
    pub fn has_blob(&self) -> bool {
        !self.missing_blob && self.blob_id.is_some()
    }

    /// Both stores know this file: a payload exists and a metadata row
    /// supplied real provenance.
    pub fn is_complete(&self) -> bool {
        self.has_blob() && self.submitter_name != UNKNOWN_SUBMITTER
    }
}
