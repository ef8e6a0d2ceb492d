use serde::{Deserialize, Serialize};

/// Number of cells in a well-formed metadata row.
pub const COLUMNS: usize = 5;

/// One metadata row in the tabular store.
///
/// Cell order is fixed: submitter name, file name, submission time,
/// blob URL, route target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub submitter_name: String,
    pub file_name: String,
    pub submitted_at: String,
    pub blob_url: String,
    pub route_target: Option<i64>,
}

impl RecordRow {
    /// Parse a raw cell row.
    ///
    /// Rows with too few cells are malformed and yield `None`; read paths
    /// skip them instead of failing the whole read. An empty or
    /// unparseable route-target cell parses to `None`.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        if cells.len() < COLUMNS {
            return None;
        }
        let route_target = match cells[4].trim() {
            "" => None,
            raw => raw.parse().ok(),
        };
        Some(Self {
            submitter_name: cells[0].clone(),
            file_name: cells[1].clone(),
            submitted_at: cells[2].clone(),
            blob_url: cells[3].clone(),
            route_target,
        })
    }

    /// Render the row in fixed cell order for appending.
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.submitter_name.clone(),
            self.file_name.clone(),
            self.submitted_at.clone(),
            self.blob_url.clone(),
            self.route_target.map(|t| t.to_string()).unwrap_or_default(),
        ]
    }
}
