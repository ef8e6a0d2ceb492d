use common::storage::StorageError;
use thiserror::Error;

/// Longest error text returned to a submitter.
pub const MAX_USER_ERROR_LEN: usize = 200;

/// Failures scoped to a single submission event. Nothing here is fatal to
/// the process; internal store conditions (a failed metadata append, a
/// failed snapshot read) are logged and degraded instead of surfacing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The file name is already taken by a stored submission.
    #[error("{file_name} already exists in submissions")]
    DuplicateSubmission { file_name: String },

    /// Upload or publish of the payload failed; nothing was recorded.
    #[error("upload failed: {0}")]
    UploadFailed(#[source] StorageError),

    #[error("no routing targets configured; contact an admin")]
    NoRoutingTargets,

    /// Selection arrived for a submitter with nothing pending.
    #[error("submission expired, please resubmit")]
    ExpiredSelection,

    /// Selection referenced a target that is not registered.
    #[error("routing target {target_id} is not registered")]
    UnknownTarget { target_id: i64 },

    #[error("permission denied")]
    PermissionDenied,

    #[error("routing target {target_id} is already registered")]
    TargetExists { target_id: i64 },

    #[error("{0}")]
    InvalidRequest(String),
}

impl EngineError {
    /// Error text bounded for display to the submitter.
    pub fn user_message(&self) -> String {
        truncate_message(&self.to_string(), MAX_USER_ERROR_LEN)
    }
}

/// Truncate to at most `max_len` bytes on a char boundary.
pub fn truncate_message(msg: &str, max_len: usize) -> String {
    if msg.len() <= max_len {
        return msg.to_string();
    }
    let mut end = max_len;
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    msg[..end].to_string()
}
