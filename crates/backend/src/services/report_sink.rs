use anyhow::Result;
use contracts::reports::AnalysisReport;
use contracts::sales::{CsvArtifacts, SavedFiles};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use std::path::{Path, PathBuf};

use crate::shared::data::db::{ensure_reports_table, get_connection};

// ---------------------------------------------------------------------------
// File artifacts
// ---------------------------------------------------------------------------
//
// File names carry the report's generation timestamp, so runs never
// overwrite each other's artifacts (second granularity).

/// Write the full report as pretty-printed JSON. Returns the file path.
pub fn write_json_report(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    let path = dir.join(format!("sales_analysis_{}.json", report.generated_at));
    let payload = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, payload)?;
    Ok(path)
}

// Header is written explicitly so an empty table still produces a file
// with its fixed column header.
fn write_csv_table<T: serde::Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the three tabular breakdowns as CSV files. Returns their paths.
pub fn write_csv_reports(dir: &Path, report: &AnalysisReport) -> Result<CsvArtifacts> {
    let ts = &report.generated_at;

    let revenue_path = dir.join(format!("revenue_per_product_{}.csv", ts));
    write_csv_table(
        &revenue_path,
        &["product_name", "revenue", "units_sold"],
        &report.revenue_per_product,
    )?;

    let profit_path = dir.join(format!("profit_per_product_{}.csv", ts));
    write_csv_table(
        &profit_path,
        &["product_name", "profit", "units_sold"],
        &report.profit_per_product,
    )?;

    let daily_path = dir.join(format!("sales_per_day_{}.csv", ts));
    write_csv_table(
        &daily_path,
        &["date", "revenue", "units_sold"],
        &report.sales_per_day,
    )?;

    Ok(CsvArtifacts {
        revenue_by_product: revenue_path.to_string_lossy().into_owned(),
        profit_by_product: profit_path.to_string_lossy().into_owned(),
        sales_per_day: daily_path.to_string_lossy().into_owned(),
    })
}

// ---------------------------------------------------------------------------
// Database artifact
// ---------------------------------------------------------------------------

/// Insert the report JSON into analysis_reports and return the assigned id.
pub async fn save_report_to_db(name: &str, report: &AnalysisReport) -> Result<i64> {
    let db = get_connection();
    ensure_reports_table(db).await?;

    let summary_json = serde_json::to_string(report)?;
    let insert = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO analysis_reports (name, summary) VALUES (?, ?)",
        [name.into(), summary_json.into()],
    );
    let result = db.execute(insert).await?;
    Ok(result.last_insert_id() as i64)
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Produce the artifacts enabled by the flags, writing files under `dir`.
pub async fn persist_report(
    dir: &Path,
    report: &AnalysisReport,
    save_json: bool,
    save_csv: bool,
    save_db: bool,
) -> Result<SavedFiles> {
    let mut saved = SavedFiles::default();

    if save_json {
        let path = write_json_report(dir, report)?;
        saved.json = Some(path.to_string_lossy().into_owned());
    }

    if save_csv {
        saved.csv = Some(write_csv_reports(dir, report)?);
    }

    if save_db {
        let name = format!("analysis_{}", report.generated_at);
        let id = save_report_to_db(&name, report).await?;
        tracing::info!("Saved analysis report to db, id={}", id);
        saved.db_report_id = Some(id);
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::reports::{DailySales, ProductProfit, ProductRevenue, ReportSummary};

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            generated_at: "20250102T120000Z".to_string(),
            summary: ReportSummary {
                total_revenue: 45.0,
                total_cost: 30.0,
                total_profit: 15.0,
                transactions: 2,
                profit_margin_percent: 33.33,
            },
            revenue_per_product: vec![ProductRevenue {
                product_name: "Soap".to_string(),
                revenue: 45.0,
                units_sold: 3,
            }],
            profit_per_product: vec![ProductProfit {
                product_name: "Soap".to_string(),
                profit: 15.0,
                units_sold: 3,
            }],
            best_selling_product: None,
            most_profitable_product: None,
            sales_per_day: vec![DailySales {
                date: "2025-01-02".to_string(),
                revenue: 45.0,
                units_sold: 3,
            }],
            payment_methods: vec![],
            mpesa_transaction_count: 1,
        }
    }

    #[test]
    fn test_write_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json_report(dir.path(), &sample_report()).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("sales_analysis_20250102T120000Z"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, sample_report());
    }

    #[test]
    fn test_write_csv_reports() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write_csv_reports(dir.path(), &sample_report()).unwrap();

        let revenue = std::fs::read_to_string(&artifacts.revenue_by_product).unwrap();
        let mut lines = revenue.lines();
        assert_eq!(lines.next(), Some("product_name,revenue,units_sold"));
        assert_eq!(lines.next(), Some("Soap,45.0,3"));

        let profit = std::fs::read_to_string(&artifacts.profit_by_product).unwrap();
        assert!(profit.starts_with("product_name,profit,units_sold"));

        let daily = std::fs::read_to_string(&artifacts.sales_per_day).unwrap();
        assert!(daily.starts_with("date,revenue,units_sold"));
        assert!(daily.contains("2025-01-02"));
    }
}
