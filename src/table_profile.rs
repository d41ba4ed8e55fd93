use std::collections::BTreeSet;

use log::{debug, info};

use crate::{
    catalog::Catalogs,
    dataset::Dataset,
    profile::{Annotation, ColumnProfile, ColumnRequest, profile_column},
};

/// Worksheet names are capped at 31 characters; the `0000_` prefix takes 5.
pub const SHEET_NAME_BODY_LIMIT: usize = 26;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub schema: Option<String>,
    pub english_name: String,
    pub korean_name: Option<String>,
    pub row_count: usize,
    pub col_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIndexEntry {
    pub ordinal: usize,
    pub schema: Option<String>,
    pub english_name: String,
    pub korean_name: Option<String>,
}

impl TableIndexEntry {
    pub fn sheet_name(&self) -> String {
        sheet_name(self.ordinal, &self.english_name)
    }
}

pub fn sheet_name(ordinal: usize, english_name: &str) -> String {
    let body = english_name
        .chars()
        .take(SHEET_NAME_BODY_LIMIT)
        .collect::<String>();
    format!("{ordinal:04}_{body}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableProfile {
    /// 1-based position of the table in the run.
    pub ordinal: usize,
    pub meta: TableMeta,
    /// In dataset column order.
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    pub fn index_entry(&self) -> TableIndexEntry {
        TableIndexEntry {
            ordinal: self.ordinal,
            schema: self.meta.schema.clone(),
            english_name: self.meta.english_name.clone(),
            korean_name: self.meta.korean_name.clone(),
        }
    }

    pub fn sheet_name(&self) -> String {
        sheet_name(self.ordinal, &self.meta.english_name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns
            .iter()
            .find(|profile| profile.common.english_name == name)
    }

    /// Lookup by zero-padded ordinal key, e.g. `"002"`.
    pub fn by_ordinal(&self, key: &str) -> Option<&ColumnProfile> {
        self.columns
            .iter()
            .find(|profile| profile.common.ordinal_key() == key)
    }

    pub fn annotated(&self, annotation: Annotation) -> impl Iterator<Item = &ColumnProfile> {
        self.columns
            .iter()
            .filter(move |profile| profile.annotation == annotation)
    }
}

/// Profiles every column of `dataset`. `datetime_columns` names the columns
/// the caller marked as date/time for this table.
pub fn profile_table(
    dataset: &Dataset,
    catalogs: &Catalogs,
    datetime_columns: &BTreeSet<String>,
    ordinal: usize,
) -> TableProfile {
    info!("[{}] QC started", dataset.name);
    let resolution = catalogs.resolve_table(&dataset.name);
    let names = dataset.column_names();
    let records = catalogs.resolve_columns(&dataset.name, &names);

    let columns = dataset
        .columns
        .iter()
        .zip(records.iter())
        .enumerate()
        .map(|(idx, (column, metadata))| {
            profile_column(&ColumnRequest {
                table: &dataset.name,
                ordinal: idx + 1,
                column,
                metadata,
                datetime_override: datetime_columns.contains(&column.name),
            })
        })
        .collect::<Vec<_>>();

    let flagged = columns
        .iter()
        .filter(|profile| profile.annotation != Annotation::None)
        .count();
    if flagged > 0 {
        debug!("[{}] {} column(s) carry a remark", dataset.name, flagged);
    }
    info!("[{}] QC finished", dataset.name);

    TableProfile {
        ordinal,
        meta: TableMeta {
            schema: resolution.schema,
            english_name: dataset.name.clone(),
            korean_name: resolution.korean_name,
            row_count: dataset.row_count(),
            col_count: dataset.column_count(),
        },
        columns,
    }
}
