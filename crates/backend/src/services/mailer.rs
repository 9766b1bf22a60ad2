use anyhow::Result;
use contracts::reports::AnalysisReport;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::shared::config::{get_config, MailConfig};

// ---------------------------------------------------------------------------
// Report rendering
// ---------------------------------------------------------------------------

/// Plain-text rendition of a report for the email body.
pub fn build_text_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str("SALES ANALYSIS REPORT\n\n");
    let _ = writeln!(out, "Generated at: {}\n", report.generated_at);

    out.push_str("-- SUMMARY --\n");
    let _ = writeln!(out, "Total Revenue: {}", report.summary.total_revenue);
    let _ = writeln!(out, "Total Cost: {}", report.summary.total_cost);
    let _ = writeln!(out, "Total Profit: {}", report.summary.total_profit);
    let _ = writeln!(out, "Transactions: {}", report.summary.transactions);
    let _ = writeln!(
        out,
        "Profit Margin: {}%",
        report.summary.profit_margin_percent
    );

    out.push_str("\n-- TOP PRODUCTS (Revenue) --\n");
    for p in &report.revenue_per_product {
        let _ = writeln!(out, "{}: {} ({} units)", p.product_name, p.revenue, p.units_sold);
    }

    out.push_str("\n-- TOP PRODUCTS (Profit) --\n");
    for p in &report.profit_per_product {
        let _ = writeln!(out, "{}: {} ({} units)", p.product_name, p.profit, p.units_sold);
    }

    out.push_str("\n-- SALES PER DAY --\n");
    for d in &report.sales_per_day {
        let _ = writeln!(out, "{}: {} ({} units)", d.date, d.revenue, d.units_sold);
    }

    out.push_str("\n-- PAYMENT METHODS --\n");
    for pm in &report.payment_methods {
        let _ = writeln!(
            out,
            "{}: {} transactions, revenue {}",
            pm.payment_method, pm.transactions, pm.revenue
        );
    }

    out
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

async fn send_report(
    cfg: &MailConfig,
    subject: &str,
    to: &str,
    report: &AnalysisReport,
    attachments: &[PathBuf],
) -> Result<()> {
    let readable = build_text_report(report);
    let json_part = serde_json::to_string_pretty(report)?;
    let body = format!("{}\n\n--- RAW JSON SUMMARY ---\n{}", readable, json_part);

    let mut content = MultiPart::mixed().singlepart(SinglePart::plain(body));

    for path in attachments {
        if !path.exists() {
            tracing::warn!("Attachment not found, skipping: {}", path.display());
            continue;
        }
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        content = content.singlepart(
            Attachment::new(filename)
                .body(bytes, ContentType::parse("application/octet-stream")?),
        );
    }

    let message = Message::builder()
        .from(cfg.username.parse()?)
        .to(to.parse()?)
        .subject(subject)
        .multipart(content)?;

    // Implicit TLS (SMTPS), matching port 465 style submission
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
        .port(cfg.port)
        .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
        .build();

    mailer.send(message).await?;
    Ok(())
}

/// Dispatch a report email as a background task.
///
/// The caller gets no delivery confirmation; success and failure are
/// observable in the logs only. A transport or authentication failure
/// never propagates and never affects the analysis that produced the
/// report.
pub fn spawn_report_email(
    subject: String,
    to: String,
    report: AnalysisReport,
    attachments: Vec<PathBuf>,
) {
    let Some(cfg) = get_config().and_then(|c| c.mail.clone()) else {
        tracing::warn!("Mail is not configured; skipping report email to {}", to);
        return;
    };

    tokio::spawn(async move {
        match send_report(&cfg, &subject, &to, &report, &attachments).await {
            Ok(()) => tracing::info!("Report email sent to {}", to),
            Err(e) => tracing::error!("Failed to send report email to {}: {}", to, e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::reports::{PaymentMethodStat, ProductRevenue, ReportSummary};

    #[test]
    fn test_build_text_report() {
        let report = AnalysisReport {
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
            profit_per_product: vec![],
            best_selling_product: None,
            most_profitable_product: None,
            sales_per_day: vec![],
            payment_methods: vec![PaymentMethodStat {
                payment_method: "cash".to_string(),
                transactions: 1,
                revenue: 30.0,
            }],
            mpesa_transaction_count: 1,
        };

        let text = build_text_report(&report);
        assert!(text.starts_with("SALES ANALYSIS REPORT"));
        assert!(text.contains("Generated at: 20250102T120000Z"));
        assert!(text.contains("Total Revenue: 45"));
        assert!(text.contains("Profit Margin: 33.33%"));
        assert!(text.contains("Soap: 45 (3 units)"));
        assert!(text.contains("cash: 1 transactions, revenue 30"));
    }
}
