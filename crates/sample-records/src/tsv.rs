//! Tab-separated text to [`SampleRecord`]s
//!
//! First line is the header. Blank lines are skipped. Malformed rows are
//! reported as warnings and never abort the parse.

use crate::{RecordError, Result, SampleRecord};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, warn};

/// A non-fatal problem found while reading one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// 1-based line number in the source text (0 if unknown)
    pub line: u64,
    pub message: String,
}

/// Parsed rows plus the warnings collected along the way
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub records: Vec<SampleRecord>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse TSV text.
///
/// Rows whose field count differs from the header are kept (missing
/// trailing columns are absent, surplus values are dropped) and reported.
/// Rows that cannot be decoded at all are skipped and reported.
pub fn parse_tsv(text: &str) -> Result<ParsedTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| RecordError::Header(e.to_string()))?
        .clone();
    let columns: Vec<String> = headers.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warnings.push(ParseWarning {
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != columns.len() {
            warnings.push(ParseWarning {
                line,
                message: format!(
                    "expected {} fields, found {}",
                    columns.len(),
                    record.len()
                ),
            });
        }

        records.push(SampleRecord::from_fields(columns.iter().zip(record.iter())));
    }

    if !warnings.is_empty() {
        warn!(
            "TSV parse produced {} warnings (first: line {}: {})",
            warnings.len(),
            warnings[0].line,
            warnings[0].message
        );
    }
    debug!("Parsed {} rows across {} columns", records.len(), columns.len());

    Ok(ParsedTable {
        columns,
        records,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_and_rows() {
        let text = "accessionVersion\tgeoLocCountry\tlineage\n\
                    PP_0001.1\tFrance\tB.1\n\
                    PP_0002.1\t\tB.2\n";

        let table = parse_tsv(text).unwrap();
        assert_eq!(table.columns, ["accessionVersion", "geoLocCountry", "lineage"]);
        assert_eq!(table.records.len(), 2);
        assert!(table.warnings.is_empty());

        assert_eq!(table.records[0].country(), Some("France"));
        assert_eq!(table.records[0].get("lineage"), Some("B.1"));
        assert_eq!(table.records[1].country(), None);
        assert_eq!(table.records[1].accession_version.as_deref(), Some("PP_0002.1"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let text = "geoLocCountry\nPeru\n\n\nChile\n\n";
        let table = parse_tsv(text).unwrap();
        assert_eq!(table.records.len(), 2);
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn test_short_and_long_rows_kept_with_warnings() {
        let text = "accessionVersion\tgeoLocCountry\tauthors\n\
                    A.1\tKenya\n\
                    B.1\tUganda\tDoe\textra\n\
                    C.1\tGhana\tRoe\n";

        let table = parse_tsv(text).unwrap();
        assert_eq!(table.records.len(), 3);
        assert_eq!(table.warnings.len(), 2);
        assert_eq!(table.warnings[0].line, 2);
        assert_eq!(table.warnings[1].line, 3);

        assert_eq!(table.records[0].authors, None);
        assert_eq!(table.records[1].authors.as_deref(), Some("Doe"));
        assert_eq!(table.records[2].country(), Some("Ghana"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "geoLocCountry\tauthors\r\nIndia\tRao\r\n";
        let table = parse_tsv(text).unwrap();
        assert_eq!(table.records[0].country(), Some("India"));
        assert_eq!(table.records[0].authors.as_deref(), Some("Rao"));
    }

    #[test]
    fn test_empty_text() {
        let table = parse_tsv("").unwrap();
        assert!(table.records.is_empty());
        assert!(table.columns.is_empty());
    }
}
