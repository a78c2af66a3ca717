use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Dataset, Record};

/// Public gapminder table used when nothing else is configured.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/plotly/datasets/master/gapminder_unfiltered.csv";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be reached or parsed.
    #[error("data unavailable from {origin}: {reason}")]
    DataUnavailable { origin: String, reason: String },
}

// ---------------------------------------------------------------------------
// Source description
// ---------------------------------------------------------------------------

/// Names of the identifying columns. Every other column is a measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub entity: String,
    pub category: String,
    pub year: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            entity: "country".into(),
            category: "continent".into(),
            year: "year".into(),
        }
    }
}

impl ColumnNames {
    fn is_key(&self, name: &str) -> bool {
        name == self.entity || name == self.category || name == self.year
    }
}

/// Where the raw table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    Path(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` locations are fetched, anything else is a file path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::Path(PathBuf::from(s))
        }
    }

    /// Format from the file suffix; anything unrecognised is read as CSV.
    fn format(&self) -> Format {
        let format = match self {
            DataSource::Path(path) => {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                Format::from_extension(ext)
            }
            DataSource::Url(url) => {
                let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
                let ext = path
                    .rsplit('/')
                    .next()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext)
                    .unwrap_or("");
                Format::from_extension(ext)
            }
        };
        format.unwrap_or(Format::Csv)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{url}"),
            DataSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
    Parquet,
}

impl Format {
    fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Format::Csv),
            "json" => Some(Format::Json),
            "parquet" | "pq" => Some(Format::Parquet),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the dataset with a single attempt. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one observation per line (also any other suffix)
/// * `.json`    – `[{ "country": ..., "continent": ..., "year": ..., ...measures }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load(source: &DataSource, columns: &ColumnNames) -> Result<Dataset, LoadError> {
    let format = source.format();
    let result = match source {
        DataSource::Path(path) => load_path(path, format, columns),
        DataSource::Url(url) => load_url(url, format, columns),
    };

    let dataset = result
        .and_then(|ds| {
            if ds.is_empty() {
                bail!("source contains no records");
            }
            Ok(ds)
        })
        .map_err(|e| LoadError::DataUnavailable {
            origin: source.to_string(),
            reason: format!("{e:#}"),
        })?;

    log::info!(
        "Loaded {} records for {} entities from {source}, years {:?}",
        dataset.len(),
        dataset.entities.len(),
        dataset.year_range()
    );
    Ok(dataset)
}

/// Like [`load`] but never fails: errors are logged and replaced by
/// [`Dataset::placeholder`].
pub fn load_or_fallback(source: &DataSource, columns: &ColumnNames) -> Dataset {
    match load(source, columns) {
        Ok(dataset) => dataset,
        Err(e) => {
            log::error!("Failed to load dataset, using placeholder: {e:#}");
            Dataset::placeholder()
        }
    }
}

fn load_path(path: &Path, format: Format, columns: &ColumnNames) -> Result<Dataset> {
    match format {
        Format::Csv => {
            let file = std::fs::File::open(path).context("opening CSV file")?;
            parse_csv(file, columns)
        }
        Format::Json => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text, columns)
        }
        Format::Parquet => {
            let file = std::fs::File::open(path).context("opening parquet file")?;
            parse_parquet(file, columns)
        }
    }
}

fn load_url(url: &str, format: Format, columns: &ColumnNames) -> Result<Dataset> {
    let body = reqwest::blocking::get(url)
        .context("requesting dataset")?
        .error_for_status()
        .context("dataset request rejected")?
        .bytes()
        .context("reading response body")?;

    match format {
        Format::Csv => parse_csv(&body[..], columns),
        Format::Json => {
            let text = std::str::from_utf8(&body).context("response is not UTF-8")?;
            parse_json(text, columns)
        }
        Format::Parquet => parse_parquet(body, columns),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names. The entity, category and
/// year columns are required; all other columns are read as measures.
fn parse_csv<R: Read>(input: R, columns: &ColumnNames) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let entity_idx = find(&columns.entity)?;
    let category_idx = find(&columns.category)?;
    let year_idx = find(&columns.year)?;

    let measure_cols: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !columns.is_key(h))
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let year = parse_year(row.get(year_idx).unwrap_or(""))
            .with_context(|| format!("CSV row {row_no}"))?;
        let mut record = Record::new(
            row.get(entity_idx).unwrap_or("").trim(),
            row.get(category_idx).unwrap_or("").trim(),
            year,
        );

        for (col_idx, name) in &measure_cols {
            let cell = row.get(*col_idx).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<f64>().ok().and_then(finite) {
                Some(v) => {
                    record.measures.insert((*name).clone(), v);
                }
                None => log::debug!("CSV row {row_no}: '{name}' value '{cell}' is not a finite number"),
            }
        }

        records.push(record);
    }

    Ok(Dataset::from_records(records))
}

/// `NaN` and infinities count as missing, like an empty cell.
fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

fn parse_year(s: &str) -> Result<i32> {
    let s = s.trim();
    if let Ok(year) = s.parse::<i32>() {
        return Ok(year);
    }
    // Some exports write integral columns as floats ("1952.0").
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 => Ok(f as i32),
        _ => bail!("'{s}' is not a valid year"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "country": "Chad", "continent": "Africa", "year": 1952, "pop": 2682462 },
///   ...
/// ]
/// ```
fn parse_json(text: &str, columns: &ColumnNames) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let entity = json_string(obj.get(&columns.entity), i, &columns.entity)?;
        let category = json_string(obj.get(&columns.category), i, &columns.category)?;
        let year = match obj.get(&columns.year) {
            Some(JsonValue::Number(n)) => parse_year(&n.to_string()),
            Some(JsonValue::String(s)) => parse_year(s),
            _ => bail!("Row {i}: missing or invalid '{}'", columns.year),
        }
        .with_context(|| format!("Row {i}"))?;

        let mut record = Record::new(entity, category, year);
        for (key, val) in obj {
            if columns.is_key(key) {
                continue;
            }
            match val.as_f64().and_then(finite) {
                Some(v) => {
                    record.measures.insert(key.clone(), v);
                }
                None => log::debug!("Row {i}: '{key}' is not numeric, skipped"),
            }
        }

        records.push(record);
    }

    Ok(Dataset::from_records(records))
}

fn json_string(val: Option<&JsonValue>, row: usize, col: &str) -> Result<String> {
    match val {
        Some(JsonValue::String(s)) => Ok(s.trim().to_string()),
        _ => bail!("Row {row}: missing or invalid '{col}' string"),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet table with one scalar column per field.
///
/// Expected schema:
/// - entity / category: Utf8 or LargeUtf8
/// - year: any integer or float column
/// - every other numeric column is a measure; other types are ignored
fn parse_parquet<T: ChunkReader + 'static>(input: T, columns: &ColumnNames) -> Result<Dataset> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(input)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let index_of = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let entity_col = batch.column(index_of(&columns.entity)?);
        let category_col = batch.column(index_of(&columns.category)?);
        let year_col = batch.column(index_of(&columns.year)?);

        let measure_cols: Vec<(&Arc<dyn Array>, &String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !columns.is_key(f.name()))
            .map(|(i, f)| (batch.column(i), f.name()))
            .collect();

        for row in 0..batch.num_rows() {
            let entity = extract_string(entity_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", columns.entity))?;
            let category = extract_string(category_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", columns.category))?;
            let year = extract_number(year_col, row)
                .and_then(|y| parse_year(&y.to_string()).ok())
                .with_context(|| format!("Row {row}: failed to read '{}'", columns.year))?;

            let mut record = Record::new(entity, category, year);
            for (col, name) in &measure_cols {
                if let Some(v) = extract_number(col, row).and_then(finite) {
                    record.measures.insert((*name).clone(), v);
                }
            }
            records.push(record);
        }
    }

    Ok(Dataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).trim().to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).trim().to_string()),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}

/// Numeric cell as `f64`; `None` for nulls and non-numeric columns.
fn extract_number(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(row) as f64),
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(row) as f64),
        _ => None,
    }
}
