//! I/O utilities for reading datasets and reference documents.
//!
//! All file reads in qc-report flow through this module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8, so
//!   legacy exports (for example `euc-kr`) load without conversion.
//! - **Spreadsheets**: `.xlsx`/`.xls` read through `calamine`, first sheet only.
//! - **Discovery**: every visible data file in a directory becomes a dataset
//!   named after its upper-cased file stem.

use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, DataType, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::{catalog::Document, dataset::Dataset};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    /// Let text columns whose every value parses as a date become temporal.
    /// Spreadsheet cells carry real dates and always allow it.
    pub infer_temporal: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            infer_temporal: false,
        }
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match extension(path).as_deref() {
        Some("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.') || name.starts_with("~$"))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn is_spreadsheet(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_supported_data_file(path: &Path) -> bool {
    is_spreadsheet(path)
        || extension(path).is_some_and(|ext| DELIMITED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Every row of a delimited file as decoded text, header included.
pub fn read_delimited_rows(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let mut reader = open_csv_reader(BufReader::new(file), delimiter);
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 1))?;
        let mut decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 1))?;
        if row_idx == 0
            && let Some(first) = decoded.first_mut()
            && let Some(stripped) = first.strip_prefix('\u{feff}')
        {
            *first = stripped.to_string();
        }
        rows.push(decoded);
    }
    Ok(rows)
}

/// Text for a spreadsheet cell. Whole floats drop their fraction so integer
/// columns stored as numbers still infer as integers.
pub fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::Error(e) => format!("#{e:?}"),
    }
}

pub fn read_spreadsheet_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| anyhow!("Opening workbook {path:?}: {e}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {path:?} has no worksheets"))?
        .map_err(|e| anyhow!("Reading first worksheet of {path:?}: {e}"))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_text).collect())
        .collect())
}

fn read_rows(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Vec<Vec<String>>> {
    if is_spreadsheet(path) {
        read_spreadsheet_rows(path)
    } else {
        let delimiter = resolve_input_delimiter(path, delimiter);
        read_delimited_rows(path, delimiter, encoding)
    }
}

/// Reads a reference document whose header sits on `header_row` (zero-based).
pub fn read_document(
    path: &Path,
    header_row: usize,
    encoding: &'static Encoding,
) -> Result<Document> {
    let mut rows = read_rows(path, None, encoding)?.into_iter().skip(header_row);
    let headers = rows
        .next()
        .ok_or_else(|| anyhow!("Document {path:?} has no header on row {}", header_row + 1))?;
    let rows = rows
        .map(|row| {
            row.into_iter()
                .map(|cell| if cell.is_empty() { None } else { Some(cell) })
                .collect()
        })
        .collect();
    Ok(Document::new(headers, rows))
}

/// File name in composed (NFC) form. Some file systems hand back Hangul
/// names decomposed into jamo.
pub fn composed_file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.nfc().collect())
}

pub fn dataset_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.nfc().collect::<String>().to_uppercase())
}

pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let name = dataset_name(path).ok_or_else(|| anyhow!("Cannot derive a table name from {path:?}"))?;
    let mut rows = read_rows(path, options.delimiter, options.encoding)?.into_iter();
    let Some(headers) = rows.next() else {
        bail!("Input file {path:?} is empty");
    };
    let rows = rows.collect::<Vec<_>>();
    let infer_temporal = options.infer_temporal || is_spreadsheet(path);
    let dataset = Dataset::from_records(name, &headers, &rows, infer_temporal)
        .with_context(|| format!("Building table from {path:?}"))?;
    debug!(
        "Loaded {:?}: {} row(s) x {} column(s)",
        path,
        dataset.row_count(),
        dataset.column_count()
    );
    Ok(dataset)
}

/// Loads every supported data file in `dir`, sorted by file name. A missing
/// directory yields no datasets.
pub fn discover_datasets(dir: &Path, options: &LoadOptions) -> Result<Vec<Dataset>> {
    if !dir.is_dir() {
        info!("Data directory {dir:?} not found");
        return Ok(Vec::new());
    }
    let mut files = fs::read_dir(dir)
        .with_context(|| format!("Listing data directory {dir:?}"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && !is_hidden(path) && is_supported_data_file(path))
        .collect::<Vec<PathBuf>>();
    files.sort();
    files
        .iter()
        .map(|path| load_dataset(path, options).with_context(|| format!("Loading {path:?}")))
        .collect()
}
