use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Aggregated report shapes
// ---------------------------------------------------------------------------

/// Totals over every stored sale.
///
/// `profit_margin_percent` is the only rounded value (2 decimal places);
/// the sums stay as raw floating-point accumulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub transactions: i64,
    pub profit_margin_percent: f64,
}

/// One product ranked by revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub product_name: String,
    pub revenue: f64,
    pub units_sold: i64,
}

/// One product ranked by profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProfit {
    pub product_name: String,
    pub profit: f64,
    pub units_sold: i64,
}

/// Revenue and units for a single calendar day.
///
/// Sales whose date could not be parsed at ingestion time are grouped
/// under the literal bucket `"unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: String,
    pub revenue: f64,
    pub units_sold: i64,
}

/// Transaction count and revenue for one payment method.
///
/// An empty payment method is reported as `"unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodStat {
    pub payment_method: String,
    pub transactions: i64,
    pub revenue: f64,
}

/// Immutable point-in-time snapshot of all sales metrics.
///
/// A new report is produced on every analysis run; reports are never
/// updated after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// UTC generation timestamp, `%Y%m%dT%H%M%SZ`.
    pub generated_at: String,
    pub summary: ReportSummary,
    pub revenue_per_product: Vec<ProductRevenue>,
    pub profit_per_product: Vec<ProductProfit>,
    pub best_selling_product: Option<ProductRevenue>,
    pub most_profitable_product: Option<ProductProfit>,
    pub sales_per_day: Vec<DailySales>,
    pub payment_methods: Vec<PaymentMethodStat>,
    pub mpesa_transaction_count: i64,
}
