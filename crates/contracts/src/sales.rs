use serde::{Deserialize, Serialize};

use crate::reports::AnalysisReport;

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Response of `POST /api/upload-sales`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSalesResponse {
    pub message: String,
    /// Rows written to storage in this upload.
    pub inserted: usize,
    /// Inserted rows whose product name was blank in the source file.
    pub ignored_empty_rows: usize,
    /// Total row count in storage after the insert.
    pub total_rows_in_db: u64,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Paths of the CSV artifacts written by one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvArtifacts {
    pub revenue_by_product: String,
    pub profit_by_product: String,
    pub sales_per_day: String,
}

/// Artifacts produced by one analysis run. Absent keys mean the
/// corresponding output was disabled for the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<CsvArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_report_id: Option<i64>,
    /// `"queued"` when a report email was dispatched in the background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Response of `POST /api/run-analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAnalysisResponse {
    pub report: AnalysisReport,
    pub saved_files: SavedFiles,
}
