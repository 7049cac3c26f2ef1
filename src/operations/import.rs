use crate::error::{AppError, Result};
use crate::operations::validate::{self, RawRecord, RawTransaction};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("json") => Ok(ImportFormat::Json),
            Some("csv") => Ok(ImportFormat::Csv),
            _ => Err(AppError::Validation(format!(
                "Unsupported import format for '{}'. Use a .json or .csv file",
                path.display()
            ))),
        }
    }
}

/// Load a transaction collection from disk without validating individual
/// records. Validation happens in the aggregator so bad rows are reported
/// instead of aborting the import.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    match ImportFormat::from_path(path)? {
        ImportFormat::Json => validate::parse_records(&fs::read_to_string(path)?),
        ImportFormat::Csv => import_csv(path),
    }
}

fn import_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::MalformedInput(format!("CSV header error: {}", e)))?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();

    let mut records = Vec::new();

    for (line_index, result) in reader.records().enumerate() {
        // header is line 1
        let row = result.map_err(|e| {
            AppError::MalformedInput(format!("CSV parse error on line {}: {}", line_index + 2, e))
        })?;

        // Empty cells count as missing. A repeated header keeps its first
        // non-empty cell.
        let mut fields = Map::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            if !value.is_empty() && !fields.contains_key(header) {
                fields.insert(header.clone(), Value::String(value.to_string()));
            }
        }
        records.push(RawRecord::Object(RawTransaction::from_fields(&fields)));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::validate::partition_records;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut tmp = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file");
        write!(tmp, "{}", contents).expect("Failed to write test data");
        tmp
    }

    #[test]
    fn test_import_csv_success() {
        let csv_data = "\
id,timestamp,category,type,amount,note
1,2025-11-10 08:00:00,income,Salary,1500.00,November
2,2025-11-11,expense,Groceries,3.50,
";
        let tmp = write_temp_file(".csv", csv_data);

        let records = load_records(tmp.path()).unwrap();
        assert_eq!(records.len(), 2);

        let (accepted, rejected) = partition_records(records);
        assert_eq!(accepted.len(), 2);
        assert!(rejected.is_empty());
        assert_eq!(accepted[1].note, None);
    }

    #[test]
    fn test_import_csv_keeps_bad_rows_for_rejection() {
        let csv_data = "\
id,timestamp,category,type,amount,note
1,bad-date,income,Salary,1500.00,
2,2025-11-11,expense,Groceries,,
";
        let tmp = write_temp_file(".csv", csv_data);

        let (accepted, rejected) = partition_records(load_records(tmp.path()).unwrap());
        assert!(accepted.is_empty());
        assert_eq!(rejected.len(), 2);
    }

    #[test]
    fn test_import_csv_with_both_date_columns() {
        let csv_data = "\
id,Timestamp,date,category,type,amount,notes
1,,2025-11-10,income,Salary,1500.00,
2,2025-11-11,2025-11-12,expense,Groceries,3.50,milk
";
        let tmp = write_temp_file(".csv", csv_data);

        let (accepted, rejected) = partition_records(load_records(tmp.path()).unwrap());
        assert!(rejected.is_empty());
        assert_eq!(accepted[0].date().to_string(), "2025-11-10");
        assert_eq!(accepted[1].date().to_string(), "2025-11-11");
        assert_eq!(accepted[1].note.as_deref(), Some("milk"));
    }

    #[test]
    fn test_import_json_rows() {
        let tmp = write_temp_file(
            ".json",
            r#"[[1, "2024-01-05", "income", "Salary", 1000, null]]"#,
        );
        let records = load_records(tmp.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_import_unsupported_extension() {
        let tmp = write_temp_file(".xml", "<transactions/>");
        let result = load_records(tmp.path());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = load_records(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
