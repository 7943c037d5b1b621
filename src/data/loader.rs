//! CSV Data Loader Module
//! Fetches the remote case dataset and parses it with Polars.

use std::io::Cursor;

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::data::columns;

/// Date format of the source CSV, e.g. "13.05.25".
pub const DATE_FORMAT: &str = "%d.%m.%y";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("missing expected column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: invalid date '{value}' (expected dd.mm.yy)")]
    InvalidDate { row: usize, value: String },
}

/// Fetches and parses case records from a CSV resource.
///
/// One blocking fetch per call, no retries, no caching: a transient network
/// failure surfaces as a fatal [`LoaderError::Http`].
pub struct CaseLoader {
    url: String,
}

impl CaseLoader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Fetch the CSV and parse it into a record frame.
    pub fn load(&self) -> Result<DataFrame, LoaderError> {
        info!(url = %self.url, "fetching case data");
        let bytes = self.fetch()?;
        let df = parse_records(&bytes)?;
        info!(rows = df.height(), "loaded case records");
        Ok(df)
    }

    fn fetch(&self) -> Result<Vec<u8>, LoaderError> {
        let response = reqwest::blocking::get(&self.url)
            .and_then(|r| r.error_for_status())
            .map_err(|source| self.http_error(source))?;
        let bytes = response.bytes().map_err(|source| self.http_error(source))?;
        Ok(bytes.to_vec())
    }

    fn http_error(&self, source: reqwest::Error) -> LoaderError {
        LoaderError::Http {
            url: self.url.clone(),
            source,
        }
    }
}

/// Parse semicolon-delimited case records.
///
/// Row order and all original columns are preserved; the `Date` string column
/// is replaced with a proper date column. Any row whose date fails to parse is
/// a fatal error, the dataset is assumed well-formed.
pub fn parse_records(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .with_parse_options(CsvParseOptions::default().with_separator(b';'))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    for name in columns::REQUIRED {
        if df.column(name).is_err() {
            return Err(LoaderError::MissingColumn(name.to_string()));
        }
    }

    let dates = parse_date_column(&df)?;
    df.with_column(DateChunked::from_naive_date(columns::DATE.into(), dates).into_column())?;

    debug!(rows = df.height(), "parsed case records");
    Ok(df)
}

fn parse_date_column(df: &DataFrame) -> Result<Vec<NaiveDate>, LoaderError> {
    let raw = df.column(columns::DATE)?.str()?;
    raw.into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.ok_or_else(|| LoaderError::InvalidDate {
                row,
                value: String::new(),
            })?;
            NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
                LoaderError::InvalidDate {
                    row,
                    value: value.to_string(),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date;Ville;Positif;Negatif;Décédé;Guéri;Facteur;Source/Voyage;Age;Homme;Femme;Resident Senegal;Temps Hospitalisation (j)
02.03.20;Dakar;1;10;0;0;Importé;France;54;1;0;Oui;8
04.03.20;Touba;2;15;0;1;Contact;;33;0;1;Oui;
";

    #[test]
    fn parses_well_formed_records() {
        let df = parse_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column(columns::DATE).unwrap().dtype(), &DataType::Date);
        let positives: Vec<i64> = df
            .column(columns::POSITIVE)
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(positives, vec![1, 2]);
    }

    #[test]
    fn preserves_row_order() {
        let df = parse_records(SAMPLE.as_bytes()).unwrap();
        let cities: Vec<&str> = df
            .column(columns::CITY)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(cities, vec!["Dakar", "Touba"]);
    }

    #[test]
    fn rejects_malformed_date() {
        let csv = SAMPLE.replace("04.03.20", "not-a-date");
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn rejects_missing_column() {
        let csv = "Date;Positif\n02.03.20;1\n";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn(_)));
    }
}
