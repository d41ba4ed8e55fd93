//! Persisted run configuration (`config.json`).
//!
//! ```json
//! {
//!   "naList": ["?", "na", "null", "Null", "NULL", " ", "[NULL]"],
//!   "dateTimeColumns": { "ORDERS": ["ORDER_DT"] }
//! }
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{dataset::Dataset, missing::DEFAULT_SENTINELS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QcConfig {
    #[serde(default = "default_na_list")]
    pub na_list: Vec<String>,
    /// Table name to the columns that hold dates or timestamps.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub date_time_columns: BTreeMap<String, Vec<String>>,
}

fn default_na_list() -> Vec<String> {
    DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect()
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            na_list: default_na_list(),
            date_time_columns: BTreeMap::new(),
        }
    }
}

impl QcConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config JSON {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating config directory {parent:?}"))?;
        }
        let file = File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing config JSON")
    }

    /// Loads `path`, writing the default configuration first when it is absent.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::load(path)?;
            info!("Loaded configuration from {path:?}");
            return Ok(config);
        }
        let config = Self::default();
        config.save(path)?;
        info!("No configuration found; default written to {path:?}");
        Ok(config)
    }

    /// Appends sentinels not already listed, keeping order.
    pub fn add_sentinels<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for token in extra {
            let token = token.into();
            if !self.na_list.contains(&token) {
                self.na_list.push(token);
            }
        }
    }

    pub fn add_datetime_columns(&mut self, table: &str, columns: impl IntoIterator<Item = String>) {
        let entry = self.date_time_columns.entry(table.to_string()).or_default();
        for column in columns {
            if !entry.contains(&column) {
                entry.push(column);
            }
        }
    }

    /// Date/time columns declared for `dataset`. Every declared name must
    /// exist in the dataset.
    pub fn datetime_columns_for(&self, dataset: &Dataset) -> Result<BTreeSet<String>> {
        let Some(columns) = self.date_time_columns.get(&dataset.name) else {
            return Ok(BTreeSet::new());
        };
        let known = dataset.column_names();
        for column in columns {
            if !known.contains(&column.as_str()) {
                bail!(
                    "Date/time column '{}' is not a column of table '{}' (available: {})",
                    column,
                    dataset.name,
                    known.join(", ")
                );
            }
        }
        Ok(columns.iter().cloned().collect())
    }
}

/// Parses `TABLE=col1,col2` as given to `--datetime`.
pub fn parse_datetime_assignment(value: &str) -> Result<(String, Vec<String>)> {
    let (table, columns) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected TABLE=col1,col2 but got '{value}'"))?;
    let table = table.trim();
    if table.is_empty() {
        bail!("Missing table name in '{value}'");
    }
    let columns = columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if columns.is_empty() {
        bail!("No columns listed for table '{table}'");
    }
    Ok((table.to_uppercase(), columns))
}
