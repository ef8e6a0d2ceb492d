//! Merging the blob listing and metadata rows into canonical records.

use std::collections::HashMap;

use common::records::RecordRow;
use common::storage::BlobEntry;

use crate::submission::{Submission, UNKNOWN_SUBMITTER, UNKNOWN_TIME};

/// Merge the two store snapshots into one record per file name.
///
/// The blob listing decides which files exist; metadata rows supply
/// provenance and routing, and win on conflict since they are written at
/// submit time. Blob entries without a row get sentinel provenance. Rows
/// without a blob are retained with `missing_blob` set so listings can
/// surface them; dedup ignores those. Rows that fail to parse are
/// skipped. Pure and side-effect-free; neither store is mutated.
pub fn merge(blobs: &[BlobEntry], raw_rows: &[Vec<String>]) -> HashMap<String, Submission> {
    let rows: HashMap<String, RecordRow> = raw_rows
        .iter()
        .filter_map(|cells| RecordRow::from_cells(cells))
        .map(|row| (row.file_name.clone(), row))
        .collect();

    let mut merged = HashMap::with_capacity(blobs.len());

    for blob in blobs {
        let row = rows.get(&blob.name);
        merged.insert(
            blob.name.clone(),
            Submission {
                submitter_name: row
                    .map(|r| r.submitter_name.clone())
                    .unwrap_or_else(|| UNKNOWN_SUBMITTER.to_string()),
                file_name: blob.name.clone(),
                submitted_at: row
                    .map(|r| r.submitted_at.clone())
                    .unwrap_or_else(|| UNKNOWN_TIME.to_string()),
                blob_url: blob.url.clone(),
                blob_id: Some(blob.blob_id.clone()),
                mime_type: blob.mime_type.clone(),
                route_target: row.and_then(|r| r.route_target),
                missing_blob: false,
            },
        );
    }

    for (name, row) in rows {
        merged.entry(name).or_insert_with(|| Submission {
            submitter_name: row.submitter_name,
            file_name: row.file_name,
            submitted_at: row.submitted_at,
            blob_url: row.blob_url,
            blob_id: None,
            mime_type: None,
            route_target: row.route_target,
            missing_blob: true,
        });
    }

    merged
}
