//! CSV ingest for the daily sales table.
//!
//! The loader is strict: any malformed row aborts the load with the line number
//! and the offending value, since every view reads the whole table and there is
//! no sensible partial dashboard.
//!
//! Expected columns (case-insensitive, extra columns ignored):
//!
//! | column     | meaning                | type            |
//! |------------|------------------------|-----------------|
//! | `data`     | business day           | date            |
//! | `vendas`   | sales for the day      | float           |
//! | `clientes` | customers served       | integer >= 0    |
//! | `promocao` | promotion running flag | `0` / `1`       |

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{Dataset, SalesRecord};
use crate::error::AppError;

pub const COL_DATE: &str = "data";
pub const COL_SALES: &str = "vendas";
pub const COL_CUSTOMERS: &str = "clientes";
pub const COL_PROMOTION: &str = "promocao";

const REQUIRED_COLUMNS: [&str; 4] = [COL_DATE, COL_SALES, COL_CUSTOMERS, COL_PROMOTION];

/// Load the sales table from a CSV file.
pub fn load_sales(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let dataset = read_sales(file)?;
    info!(
        path = %path.display(),
        rows = dataset.stats.n_rows,
        first = %dataset.stats.first_date,
        last = %dataset.stats.last_date,
        total_sales = dataset.stats.total_sales,
        "loaded sales table"
    );
    Ok(dataset)
}

/// Parse the sales table from any CSV source.
pub fn read_sales<R: Read>(reader: R) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;

        let record = result.map_err(|e| AppError::input(format!("Line {line}: CSV parse error: {e}")))?;

        // Blank trailing lines are common in hand-edited files.
        if record.iter().all(|field| field.is_empty()) {
            debug!(line, "skipping blank row");
            continue;
        }

        let row = parse_row(&record, &header_map).map_err(|e| AppError::input(format!("Line {line}: {e}")))?;

        if !seen.insert(row.date) {
            return Err(AppError::input(format!(
                "Line {line}: duplicate date {} (one row per day is expected).",
                row.date
            )));
        }
        records.push(row);
    }

    Dataset::from_records(records).ok_or_else(|| AppError::no_data("The CSV contains no data rows."))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !header_map.contains_key(*col))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let names = missing.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ");
    Err(AppError::input(format!("Missing required column(s): {names}")))
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<SalesRecord, String> {
    let date = parse_date(get_required(record, header_map, COL_DATE)?)?;
    let sales = parse_sales(get_required(record, header_map, COL_SALES)?)?;
    let customers = parse_customers(get_required(record, header_map, COL_CUSTOMERS)?)?;
    let promotion = parse_promotion(get_required(record, header_map, COL_PROMOTION)?)?;

    Ok(SalesRecord {
        date,
        sales,
        customers,
        promotion,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Ambiguous slash/dash dates are month-first; day-first only matches when
    // the leading number cannot be a month.
    const DATE_FMTS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y", "%d-%m-%Y"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY, DD/MM/YYYY."
    ))
}

fn parse_sales(s: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{COL_SALES}` value '{s}' (expected a number)."))?;
    if !v.is_finite() {
        return Err(format!("Non-finite `{COL_SALES}` value '{s}'."));
    }
    Ok(v)
}

fn parse_customers(s: &str) -> Result<u32, String> {
    if let Ok(v) = s.parse::<u32>() {
        return Ok(v);
    }
    // Integral floats (`12.0`) show up when a column went through a spreadsheet.
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(format!(
            "Invalid `{COL_CUSTOMERS}` value '{s}' (expected a non-negative integer)."
        )),
    }
}

fn parse_promotion(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Ok(true),
        "0" | "0.0" | "false" => Ok(false),
        _ => Err(format!("Invalid `{COL_PROMOTION}` value '{s}' (expected 0 or 1).")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<Dataset, AppError> {
        read_sales(csv.as_bytes())
    }

    #[test]
    fn reads_typed_rows_sorted_by_date() {
        let ds = load(
            "data,vendas,clientes,promocao\n\
             2024-01-03,300.5,12,1\n\
             2024-01-01,100,4,0\n\
             2024-01-02,200,8.0,1\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(ds.records[1].customers, 8);
        assert!(ds.records[2].promotion);
        assert!((ds.stats.total_sales - 600.5).abs() < 1e-9);
    }

    #[test]
    fn headers_are_normalized() {
        let ds = load("\u{feff}Data, VENDAS ,Clientes,Promocao,extra\n2024-02-01,10,1,0,x\n").unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn missing_columns_are_listed() {
        let err = load("data,vendas\n2024-01-01,1\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("`clientes`"));
        assert!(err.message().contains("`promocao`"));
    }

    #[test]
    fn promotion_flag_outside_zero_one_is_rejected() {
        let err = load("data,vendas,clientes,promocao\n2024-01-01,1,1,2\n").unwrap_err();
        assert!(err.message().starts_with("Line 2:"), "{err}");
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let err = load(
            "data,vendas,clientes,promocao\n\
             2024-01-01,1,1,0\n\
             01/01/2024,2,1,0\n",
        )
        .unwrap_err();
        assert!(err.message().contains("duplicate date"), "{err}");
        assert!(err.message().starts_with("Line 3:"), "{err}");
    }

    #[test]
    fn non_numeric_sales_are_rejected() {
        let err = load("data,vendas,clientes,promocao\n2024-01-01,abc,1,0\n").unwrap_err();
        assert!(err.message().contains("`vendas`"));
    }

    #[test]
    fn empty_table_is_no_data() {
        let err = load("data,vendas,clientes,promocao\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        for s in ["2024-03-07", "2024/03/07", "03/07/2024", "03-07-2024", "2024-03-07 00:00:00"] {
            assert_eq!(parse_date(s).unwrap(), expected, "{s}");
        }
        assert!(parse_date("March 7").is_err());
        assert!(parse_date("13/13/2024").is_err());
    }

    #[test]
    fn ambiguous_dates_are_month_first() {
        assert_eq!(parse_date("03/07/2024").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(parse_date("13/01/2024").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
        assert_eq!(parse_date("25-12-2024").unwrap(), NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());

        let ds = load("data,vendas,clientes,promocao
03/07/2024,10,1,0
").unwrap();
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = load_sales(Path::new("definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
