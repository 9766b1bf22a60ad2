use axum::extract::{Multipart, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use contracts::sales::{RunAnalysisResponse, UploadSalesResponse};

use crate::domain::sales::csv_import::parse_sales_csv;
use crate::domain::sales::repository;
use crate::services::{analysis, mailer, report_sink};

fn bad_request(detail: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail })))
}

fn server_error(detail: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": detail })),
    )
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Smart Dashboard API is running" }))
}

/// POST /api/upload-sales
///
/// Multipart upload, field `file`, must end in `.csv`. The whole batch is
/// inserted in one transaction: the upload either fully succeeds (with
/// possibly-defaulted fields) or fully fails with a clear reason.
pub async fn upload_sales(
    mut multipart: Multipart,
) -> Result<Json<UploadSalesResponse>, (StatusCode, Json<Value>)> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart body."))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| bad_request("Failed to read uploaded file."))?;
            file = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let Some((filename, bytes)) = file else {
        return Err(bad_request("Multipart field 'file' is required."));
    };

    let rows = parse_sales_csv(&filename, &bytes).map_err(|e| bad_request(&e.to_string()))?;
    let ignored_empty_rows = rows.iter().filter(|r| r.product_name.is_empty()).count();

    let inserted = repository::insert_batch(rows).await.map_err(|e| {
        tracing::error!("Failed to insert sales batch: {}", e);
        server_error("Failed to store uploaded rows.")
    })?;

    let total_rows_in_db = repository::count_all().await.map_err(|e| {
        tracing::error!("Failed to count sales rows: {}", e);
        server_error("Failed to count stored rows.")
    })?;

    Ok(Json(UploadSalesResponse {
        message: "Upload successful".to_string(),
        inserted,
        ignored_empty_rows,
        total_rows_in_db,
    }))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AnalysisParams {
    #[serde(default = "default_true")]
    pub save_json: bool,
    #[serde(default = "default_true")]
    pub save_csv: bool,
    #[serde(default = "default_true")]
    pub save_db: bool,
    /// Optional recipient; when set, the report is emailed in the background.
    #[serde(default)]
    pub email_to: Option<String>,
}

/// POST /api/run-analysis?save_json=&save_csv=&save_db=&email_to=
pub async fn run_analysis(
    Query(params): Query<AnalysisParams>,
) -> Result<Json<RunAnalysisResponse>, StatusCode> {
    let report = analysis::build_report().await.map_err(|e| {
        tracing::error!("Analysis failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let out_dir = std::env::current_dir().map_err(|e| {
        tracing::error!("Cannot resolve working directory: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut saved_files = report_sink::persist_report(
        &out_dir,
        &report,
        params.save_json,
        params.save_csv,
        params.save_db,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to persist analysis report: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if let Some(to) = params.email_to {
        let mut attachments: Vec<PathBuf> = Vec::new();
        if let Some(json) = &saved_files.json {
            attachments.push(PathBuf::from(json));
        }
        if let Some(csv) = &saved_files.csv {
            attachments.push(PathBuf::from(&csv.revenue_by_product));
            attachments.push(PathBuf::from(&csv.profit_by_product));
            attachments.push(PathBuf::from(&csv.sales_per_day));
        }
        mailer::spawn_report_email(
            "Sales Analysis Report".to_string(),
            to,
            report.clone(),
            attachments,
        );
        saved_files.email = Some("queued".to_string());
    }

    Ok(Json(RunAnalysisResponse {
        report,
        saved_files,
    }))
}
