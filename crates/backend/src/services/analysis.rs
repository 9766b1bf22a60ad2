use anyhow::Result;
use chrono::Utc;
use contracts::reports::{
    AnalysisReport, DailySales, PaymentMethodStat, ProductProfit, ProductRevenue, ReportSummary,
};
use sea_orm::{DatabaseBackend, FromQueryResult, Statement};

use crate::shared::data::db::get_connection;

// ---------------------------------------------------------------------------
// Internal aggregation rows
// ---------------------------------------------------------------------------

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    total_revenue: f64,
    total_cost: f64,
    total_profit: f64,
    transactions: i64,
}

#[derive(Debug, FromQueryResult)]
struct ProductRevenueRow {
    product_name: String,
    revenue: f64,
    units_sold: i64,
}

#[derive(Debug, FromQueryResult)]
struct ProductProfitRow {
    product_name: String,
    profit: f64,
    units_sold: i64,
}

#[derive(Debug, FromQueryResult)]
struct DailyRow {
    date: String,
    revenue: f64,
    units_sold: i64,
}

#[derive(Debug, FromQueryResult)]
struct PaymentRow {
    payment_method: String,
    transactions: i64,
    revenue: f64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    cnt: i64,
}

fn stmt(sql: &str) -> Statement {
    Statement::from_string(DatabaseBackend::Sqlite, sql.to_string())
}

// ---------------------------------------------------------------------------
// KPI queries
// ---------------------------------------------------------------------------

/// Total revenue, cost, profit, transactions, profit margin.
pub async fn compute_summary() -> Result<ReportSummary> {
    let db = get_connection();

    let sql = r#"
        SELECT
            CAST(COALESCE(SUM(s.quantity * s.selling_price), 0) AS REAL)                     AS total_revenue,
            CAST(COALESCE(SUM(s.quantity * s.cost_price), 0) AS REAL)                       AS total_cost,
            CAST(COALESCE(SUM(s.quantity * (s.selling_price - s.cost_price)), 0) AS REAL)   AS total_profit,
            CAST(COUNT(s.id) AS INTEGER)                                                    AS transactions
        FROM sales s
    "#;

    let row = SummaryRow::find_by_statement(stmt(sql))
        .one(db)
        .await?
        .unwrap_or(SummaryRow {
            total_revenue: 0.0,
            total_cost: 0.0,
            total_profit: 0.0,
            transactions: 0,
        });

    // Guard the division: an empty store has zero revenue
    let margin = if row.total_revenue != 0.0 {
        row.total_profit / row.total_revenue * 100.0
    } else {
        0.0
    };

    Ok(ReportSummary {
        total_revenue: row.total_revenue,
        total_cost: row.total_cost,
        total_profit: row.total_profit,
        transactions: row.transactions,
        profit_margin_percent: (margin * 100.0).round() / 100.0,
    })
}

pub async fn revenue_per_product() -> Result<Vec<ProductRevenue>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            s.product_name                                                   AS product_name,
            CAST(COALESCE(SUM(s.quantity * s.selling_price), 0) AS REAL)    AS revenue,
            CAST(COALESCE(SUM(s.quantity), 0) AS INTEGER)                   AS units_sold
        FROM sales s
        GROUP BY s.product_name
        ORDER BY SUM(s.quantity * s.selling_price) DESC
    "#;

    let rows = ProductRevenueRow::find_by_statement(stmt(sql)).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|r| ProductRevenue {
            product_name: r.product_name,
            revenue: r.revenue,
            units_sold: r.units_sold,
        })
        .collect())
}

pub async fn profit_per_product() -> Result<Vec<ProductProfit>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            s.product_name                                                                  AS product_name,
            CAST(COALESCE(SUM(s.quantity * (s.selling_price - s.cost_price)), 0) AS REAL)   AS profit,
            CAST(COALESCE(SUM(s.quantity), 0) AS INTEGER)                                   AS units_sold
        FROM sales s
        GROUP BY s.product_name
        ORDER BY SUM(s.quantity * (s.selling_price - s.cost_price)) DESC
    "#;

    let rows = ProductProfitRow::find_by_statement(stmt(sql)).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|r| ProductProfit {
            product_name: r.product_name,
            profit: r.profit,
            units_sold: r.units_sold,
        })
        .collect())
}

/// Revenue and units per calendar day, ascending. Rows whose date failed
/// to parse at ingestion group under the "unknown" bucket.
pub async fn sales_per_day() -> Result<Vec<DailySales>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            COALESCE(s.date, 'unknown')                                     AS date,
            CAST(COALESCE(SUM(s.quantity * s.selling_price), 0) AS REAL)    AS revenue,
            CAST(COALESCE(SUM(s.quantity), 0) AS INTEGER)                   AS units_sold
        FROM sales s
        GROUP BY s.date
        ORDER BY s.date ASC
    "#;

    let rows = DailyRow::find_by_statement(stmt(sql)).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|r| DailySales {
            date: r.date,
            revenue: r.revenue,
            units_sold: r.units_sold,
        })
        .collect())
}

/// Transactions and revenue per payment method, most used first. The empty
/// method is reported as "unknown".
pub async fn payment_method_breakdown() -> Result<Vec<PaymentMethodStat>> {
    let db = get_connection();

    let sql = r#"
        SELECT
            CASE WHEN s.payment_method = '' THEN 'unknown' ELSE s.payment_method END AS payment_method,
            CAST(COUNT(s.id) AS INTEGER)                                             AS transactions,
            CAST(COALESCE(SUM(s.quantity * s.selling_price), 0) AS REAL)             AS revenue
        FROM sales s
        GROUP BY CASE WHEN s.payment_method = '' THEN 'unknown' ELSE s.payment_method END
        ORDER BY COUNT(s.id) DESC
    "#;

    let rows = PaymentRow::find_by_statement(stmt(sql)).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|r| PaymentMethodStat {
            payment_method: r.payment_method,
            transactions: r.transactions,
            revenue: r.revenue,
        })
        .collect())
}

/// Count of sales carrying a non-empty M-Pesa transaction reference.
pub async fn mpesa_transaction_count() -> Result<i64> {
    let db = get_connection();

    let sql = r#"
        SELECT CAST(COUNT(s.id) AS INTEGER) AS cnt
        FROM sales s
        WHERE s.mpesa_transaction_id != ''
    "#;

    let row = CountRow::find_by_statement(stmt(sql)).one(db).await?;
    Ok(row.map(|r| r.cnt).unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run every aggregation over the current store and assemble one report.
pub async fn build_report() -> Result<AnalysisReport> {
    let summary = compute_summary().await?;
    let revenue = revenue_per_product().await?;
    let profit = profit_per_product().await?;
    let daily = sales_per_day().await?;
    let payment = payment_method_breakdown().await?;
    let mpesa_count = mpesa_transaction_count().await?;

    let best_selling_product = revenue.first().cloned();
    let most_profitable_product = profit.first().cloned();

    Ok(AnalysisReport {
        generated_at: Utc::now().format("%Y%m%dT%H%M%SZ").to_string(),
        summary,
        revenue_per_product: revenue,
        profit_per_product: profit,
        best_selling_product,
        most_profitable_product,
        sales_per_day: daily,
        payment_methods: payment,
        mpesa_transaction_count: mpesa_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::csv_import::parse_sales_csv;
    use crate::domain::sales::repository;
    use crate::services::report_sink;
    use crate::shared::data::db::initialize_database;

    // One test owns the process-wide database connection, so the whole
    // upload -> analyze -> persist flow runs in a single sequence.
    #[tokio::test]
    async fn test_upload_then_analysis_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        initialize_database(Some(db_path.to_str().unwrap()))
            .await
            .unwrap();

        // Empty store: zeros everywhere, no division by zero
        let empty = build_report().await.unwrap();
        assert_eq!(empty.summary.transactions, 0);
        assert_eq!(empty.summary.total_revenue, 0.0);
        assert_eq!(empty.summary.profit_margin_percent, 0.0);
        assert!(empty.best_selling_product.is_none());
        assert!(empty.most_profitable_product.is_none());
        assert!(empty.revenue_per_product.is_empty());
        assert!(empty.sales_per_day.is_empty());

        let rows = parse_sales_csv(
            "sales.csv",
            b"date,product_name,quantity,cost_price,selling_price,payment_method,mpesa_transaction_id\n\
              2025-01-02,Soap,2,10.0,15.0,cash,\n\
              2025-01-02,Soap,1,10.0,15.0,mpesa,TX1\n",
        )
        .unwrap();
        let inserted = repository::insert_batch(rows).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(repository::count_all().await.unwrap(), 2);

        let report = build_report().await.unwrap();
        assert_eq!(report.summary.total_revenue, 45.0);
        assert_eq!(report.summary.total_cost, 30.0);
        assert_eq!(report.summary.total_profit, 15.0);
        assert_eq!(report.summary.transactions, 2);
        // 15 / 45 * 100, rounded to 2 decimals
        assert_eq!(report.summary.profit_margin_percent, 33.33);

        assert_eq!(report.best_selling_product.as_ref().unwrap().product_name, "Soap");
        assert_eq!(
            report.most_profitable_product.as_ref().unwrap().product_name,
            "Soap"
        );
        assert_eq!(report.mpesa_transaction_count, 1);

        assert_eq!(report.sales_per_day.len(), 1);
        assert_eq!(report.sales_per_day[0].date, "2025-01-02");
        assert_eq!(report.sales_per_day[0].revenue, 45.0);
        assert_eq!(report.sales_per_day[0].units_sold, 3);

        assert_eq!(report.payment_methods.len(), 2);
        for pm in &report.payment_methods {
            assert_eq!(pm.transactions, 1);
        }

        // Persisting the report returns a storage-assigned id
        let id = report_sink::save_report_to_db("analysis_test", &report)
            .await
            .unwrap();
        assert!(id >= 1);
        let second = report_sink::save_report_to_db("analysis_test_2", &report)
            .await
            .unwrap();
        assert!(second > id);
    }
}
