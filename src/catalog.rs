//! Reference documents (table, column, and code catalogs) and the lookups
//! that decorate a dataset's columns with declared metadata.
//!
//! Every catalog is optional. An absent catalog or a lookup miss is never an
//! error: it produces a record carrying only what the dataset itself knows.
//! A catalog that is present but lacks one of its required columns is a
//! [`CatalogError`] and aborts the run.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;

use crate::{error::CatalogError, io_utils};

pub const TABLE_CATALOG_KEYWORD: &str = "테이블정의서";
pub const COLUMN_CATALOG_KEYWORD: &str = "컬럼정의서";
pub const CODE_CATALOG_KEYWORD: &str = "코드정의서";

const TABLE_CATALOG: &str = "table catalog";
const COLUMN_CATALOG: &str = "column catalog";
const CODE_CATALOG: &str = "code catalog";

/// Zero-based row holding the header in a catalog file. Row 0 is a title banner.
pub const DOCUMENT_HEADER_ROW: usize = 1;

fn line_break_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\r\n|\r|\n").expect("valid line-break pattern"))
}

/// Header text with embedded line breaks replaced by a single space.
pub fn normalize_header(header: &str) -> String {
    line_break_pattern().replace_all(header, " ").into_owned()
}

/// A raw tabular reference document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Document {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let headers = headers.iter().map(|h| normalize_header(h)).collect();
        Self { headers, rows }
    }

    fn require(&self, catalog: &'static str, column: &'static str) -> Result<usize, CatalogError> {
        self.headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| CatalogError::MissingColumn {
                catalog,
                column,
                found: self.headers.clone(),
            })
    }

    fn cell(row: &[Option<String>], idx: usize) -> Option<String> {
        row.get(idx)
            .and_then(|cell| cell.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub schema: Option<String>,
    pub english_name: String,
    pub korean_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCatalog {
    pub entries: Vec<TableEntry>,
}

impl TableCatalog {
    pub fn from_document(doc: &Document) -> Result<Self, CatalogError> {
        let schema = doc.require(TABLE_CATALOG, "스키마명")?;
        let english = doc.require(TABLE_CATALOG, "테이블 영문명")?;
        let korean = doc.require(TABLE_CATALOG, "테이블 한글명")?;
        let entries = doc
            .rows
            .iter()
            .filter_map(|row| {
                Document::cell(row, english).map(|english_name| TableEntry {
                    schema: Document::cell(row, schema),
                    english_name,
                    korean_name: Document::cell(row, korean),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn find(&self, table_name: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.english_name == table_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    pub table: String,
    pub column: String,
    pub korean_name: Option<String>,
    pub data_type: Option<String>,
    pub code_group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCatalog {
    pub entries: Vec<ColumnEntry>,
}

impl ColumnCatalog {
    pub fn from_document(doc: &Document) -> Result<Self, CatalogError> {
        let table = doc.require(COLUMN_CATALOG, "테이블 영문명")?;
        let column = doc.require(COLUMN_CATALOG, "컬럼 영문명")?;
        let korean = doc.require(COLUMN_CATALOG, "컬럼 한글명")?;
        let data_type = doc.require(COLUMN_CATALOG, "데이터 타입")?;
        let code_group = doc.require(COLUMN_CATALOG, "코드대분류")?;
        let entries = doc
            .rows
            .iter()
            .filter_map(|row| {
                let table = Document::cell(row, table)?;
                let column = Document::cell(row, column)?;
                Some(ColumnEntry {
                    table,
                    column,
                    korean_name: Document::cell(row, korean),
                    data_type: Document::cell(row, data_type),
                    code_group: Document::cell(row, code_group),
                })
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn has_table(&self, table_name: &str) -> bool {
        self.entries.iter().any(|e| e.table == table_name)
    }

    /// Catalog keys are stored upper-case; the dataset's identifier is
    /// upper-cased before comparison.
    pub fn find(&self, table_name: &str, column_name: &str) -> Option<&ColumnEntry> {
        let key = column_name.to_uppercase();
        self.entries
            .iter()
            .find(|e| e.table == table_name && e.column == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeCatalog {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl CodeCatalog {
    pub fn from_document(doc: &Document) -> Result<Self, CatalogError> {
        let group = doc.require(CODE_CATALOG, "코드 대분류")?;
        let code = doc.require(CODE_CATALOG, "코드값")?;
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for row in &doc.rows {
            let Some(group) = Document::cell(row, group) else {
                continue;
            };
            let codes = groups.entry(group).or_default();
            if let Some(code) = Document::cell(row, code) {
                codes.insert(code);
            }
        }
        Ok(Self { groups })
    }

    pub fn codes(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(group)
    }
}

/// Raw documents as found on disk, each independently present or absent.
#[derive(Debug, Clone, Default)]
pub struct CatalogDocuments {
    pub table: Option<Document>,
    pub column: Option<Document>,
    pub code: Option<Document>,
}

/// Declared metadata for one dataset column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Always the dataset's own column name.
    pub english_name: String,
    pub korean_name: Option<String>,
    pub declared_type: Option<String>,
    pub code_group: Option<String>,
    pub defined_codes: Option<BTreeSet<String>>,
}

impl MetadataRecord {
    pub fn undocumented(column_name: &str) -> Self {
        Self {
            english_name: column_name.to_string(),
            korean_name: None,
            declared_type: None,
            code_group: None,
            defined_codes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableResolution {
    pub schema: Option<String>,
    pub korean_name: Option<String>,
    pub found: bool,
}

/// The reconciled catalog set.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub table: Option<TableCatalog>,
    pub column: Option<ColumnCatalog>,
    pub code: Option<CodeCatalog>,
}

impl Catalogs {
    pub fn load(documents: &CatalogDocuments) -> Result<Self, CatalogError> {
        let table = documents
            .table
            .as_ref()
            .map(TableCatalog::from_document)
            .transpose()?;
        let column = documents
            .column
            .as_ref()
            .map(ColumnCatalog::from_document)
            .transpose()?;
        let code = documents
            .code
            .as_ref()
            .map(CodeCatalog::from_document)
            .transpose()?;
        Ok(Self {
            table,
            column,
            code,
        })
    }

    pub fn resolve_table(&self, table_name: &str) -> TableResolution {
        let Some(catalog) = &self.table else {
            info!("[{table_name}] no table catalog; table metadata left empty");
            return TableResolution::default();
        };
        match catalog.find(table_name) {
            Some(entry) => {
                info!("[{table_name}] found in table catalog");
                TableResolution {
                    schema: entry.schema.clone(),
                    korean_name: entry.korean_name.clone(),
                    found: true,
                }
            }
            None => {
                info!("[{table_name}] not found in table catalog");
                TableResolution::default()
            }
        }
    }

    pub fn resolve_column(&self, table_name: &str, column_name: &str) -> MetadataRecord {
        let Some(catalog) = &self.column else {
            return MetadataRecord::undocumented(column_name);
        };
        match catalog.find(table_name, column_name) {
            Some(entry) => {
                debug!("[{table_name}] column '{column_name}' found in column catalog");
                MetadataRecord {
                    english_name: column_name.to_string(),
                    korean_name: entry.korean_name.clone(),
                    declared_type: entry.data_type.clone(),
                    code_group: entry.code_group.clone(),
                    defined_codes: self.resolve_codes(entry.code_group.as_deref()),
                }
            }
            None => {
                info!("[{table_name}] column '{column_name}' not found in column catalog");
                MetadataRecord::undocumented(column_name)
            }
        }
    }

    /// Declared code values for a group, or `None` when the group is unset
    /// or unknown to the code catalog.
    pub fn resolve_codes(&self, code_group: Option<&str>) -> Option<BTreeSet<String>> {
        let group = code_group?;
        self.code.as_ref()?.codes(group).cloned()
    }

    /// Per-column records for every column name, in order. Logs once when
    /// the column catalog has nothing for this table.
    pub fn resolve_columns(&self, table_name: &str, column_names: &[&str]) -> Vec<MetadataRecord> {
        match &self.column {
            None => info!("[{table_name}] no column catalog; columns reported undocumented"),
            Some(catalog) if !catalog.has_table(table_name) => {
                info!("[{table_name}] has no entries in the column catalog");
            }
            Some(_) => {}
        }
        column_names
            .iter()
            .map(|name| self.resolve_column(table_name, name))
            .collect()
    }
}

/// Finds catalog files in `dir` by keyword in the file name and loads them.
/// A missing directory means no catalogs.
pub fn discover_documents(dir: &Path, encoding: &'static encoding_rs::Encoding) -> Result<CatalogDocuments> {
    if !dir.is_dir() {
        info!("Document directory {dir:?} not found; profiling without catalogs");
        return Ok(CatalogDocuments::default());
    }
    let mut files = fs::read_dir(dir)
        .with_context(|| format!("Listing document directory {dir:?}"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && !io_utils::is_hidden(path))
        .collect::<Vec<PathBuf>>();
    files.sort();

    let load = |keyword: &str| -> Result<Option<Document>> {
        let found = files.iter().find(|path| {
            io_utils::composed_file_name(path).is_some_and(|name| name.contains(keyword))
        });
        match found {
            Some(path) => {
                info!("[{keyword}] reading {path:?}");
                io_utils::read_document(path, DOCUMENT_HEADER_ROW, encoding)
                    .with_context(|| format!("Reading {keyword} from {path:?}"))
                    .map(Some)
            }
            None => {
                info!("[{keyword}] no document found");
                Ok(None)
            }
        }
    };

    Ok(CatalogDocuments {
        table: load(TABLE_CATALOG_KEYWORD)?,
        column: load(COLUMN_CATALOG_KEYWORD)?,
        code: load(CODE_CATALOG_KEYWORD)?,
    })
}
