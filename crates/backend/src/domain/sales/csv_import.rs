use thiserror::Error;

use super::repository::NewSale;
use crate::shared::casts::{to_date, to_float, to_int, to_str};

/// Columns the sales schema expects. Columns absent from the uploaded file
/// behave as present-but-always-null for every row.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "date",
    "product_name",
    "quantity",
    "cost_price",
    "selling_price",
    "payment_method",
    "mpesa_transaction_id",
];

/// Client-side upload rejections. Storage failures are not represented
/// here; they propagate as `anyhow` errors from the repository.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Must upload a CSV file.")]
    NotCsv,
    #[error("CSV file is empty or malformed.")]
    EmptyHeader,
}

/// Parse an uploaded CSV into a typed batch of sales.
///
/// Headers are matched after trimming and lowercasing. Field values go
/// through the best-effort casts: a malformed field becomes a default,
/// never an error. A row is skipped only when both its date and its
/// product name are blank.
pub fn parse_sales_csv(filename: &str, bytes: &[u8]) -> Result<Vec<NewSale>, ImportError> {
    if !filename.ends_with(".csv") {
        return Err(ImportError::NotCsv);
    }

    // Tolerate the UTF-8 BOM Excel prepends
    let decoded = String::from_utf8_lossy(bytes).into_owned();
    let text = decoded.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|h| h.trim().to_lowercase()).collect(),
        Err(_) => return Err(ImportError::EmptyHeader),
    };
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::EmptyHeader);
    }

    // Column position per required field; None when the column is missing
    let positions: Vec<Option<usize>> = REQUIRED_FIELDS
        .iter()
        .map(|field| headers.iter().position(|h| h == field))
        .collect();

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Skipping malformed CSV record: {}", e);
                continue;
            }
        };

        let get = |field_idx: usize| -> Option<&str> {
            positions[field_idx].and_then(|i| record.get(i))
        };

        let date_raw = get(0);
        let product_raw = get(1);

        // Skip completely empty rows
        let date_blank = date_raw.map_or(true, |v| v.trim().is_empty());
        let product_blank = product_raw.map_or(true, |v| v.trim().is_empty());
        if date_blank && product_blank {
            continue;
        }

        rows.push(NewSale {
            date: to_date(date_raw),
            product_name: to_str(product_raw),
            quantity: to_int(get(2)),
            cost_price: to_float(get(3)),
            selling_price: to_float(get(4)),
            payment_method: to_str(get(5)),
            mpesa_transaction_id: to_str(get(6)),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(text: &str) -> Vec<NewSale> {
        parse_sales_csv("sales.csv", text.as_bytes()).unwrap()
    }

    #[test]
    fn test_rejects_non_csv_filename() {
        assert_eq!(
            parse_sales_csv("sales.xlsx", b"date\n").unwrap_err(),
            ImportError::NotCsv
        );
    }

    #[test]
    fn test_rejects_empty_file() {
        assert_eq!(
            parse_sales_csv("sales.csv", b"").unwrap_err(),
            ImportError::EmptyHeader
        );
    }

    #[test]
    fn test_parses_well_formed_rows() {
        let rows = parse(
            "date,product_name,quantity,cost_price,selling_price,payment_method,mpesa_transaction_id\n\
             2025-01-02,Soap,2,10.0,15.0,cash,\n\
             2025-01-02,Soap,1,10.0,15.0,mpesa,TX1\n",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(rows[0].product_name, "Soap");
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[0].selling_price, 15.0);
        assert_eq!(rows[0].mpesa_transaction_id, "");
        assert_eq!(rows[1].mpesa_transaction_id, "TX1");
    }

    #[test]
    fn test_header_only_file_yields_no_rows() {
        let rows = parse("date,product_name,quantity\n");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_headers_are_case_insensitive_and_trimmed() {
        let rows = parse(" Date ,PRODUCT_NAME,Quantity\n2025-03-01,Bread,4\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_name, "Bread");
        assert_eq!(rows[0].quantity, 4);
        // Columns missing entirely default per field
        assert_eq!(rows[0].cost_price, 0.0);
        assert_eq!(rows[0].payment_method, "");
    }

    #[test]
    fn test_missing_mpesa_column_defaults_to_empty() {
        let rows = parse(
            "date,product_name,quantity,cost_price,selling_price,payment_method\n\
             2025-01-02,Soap,2,10.0,15.0,cash\n",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mpesa_transaction_id, "");
    }

    #[test]
    fn test_skips_rows_with_blank_date_and_product() {
        let rows = parse(
            "date,product_name,quantity\n\
             ,,3\n\
             2025-01-02,,3\n\
             ,Soap,1\n",
        );
        // Only the fully blank row is dropped
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_name, "");
        assert_eq!(rows[1].product_name, "Soap");
        assert_eq!(rows[1].date, None);
    }

    #[test]
    fn test_malformed_fields_default_instead_of_failing() {
        let rows = parse(
            "date,product_name,quantity,cost_price,selling_price\n\
             02/01/2025,Soap,ten,N/A,12.3.4\n",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, None);
        assert_eq!(rows[0].quantity, 0);
        assert_eq!(rows[0].cost_price, 0.0);
        assert_eq!(rows[0].selling_price, 0.0);
    }

    #[test]
    fn test_tolerates_utf8_bom() {
        let text = "\u{FEFF}date,product_name,quantity\n2025-01-02,Soap,2\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 1, 2));
    }
}
