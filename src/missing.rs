use log::{debug, info};

use crate::{data::Value, dataset::Dataset};

pub const DEFAULT_SENTINELS: &[&str] = &["?", "na", "null", "Null", "NULL", " ", "[NULL]"];

/// Rewrites sentinel tokens to the missing marker across a whole dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValueNormalizer {
    sentinels: Vec<String>,
}

impl Default for MissingValueNormalizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MissingValueNormalizer {
    /// `None` selects [`DEFAULT_SENTINELS`]; an explicit list is used as is.
    pub fn new(sentinels: Option<Vec<String>>) -> Self {
        let sentinels = sentinels
            .unwrap_or_else(|| DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect());
        Self { sentinels }
    }

    pub fn sentinels(&self) -> &[String] {
        &self.sentinels
    }

    fn is_sentinel(&self, value: &Value) -> bool {
        match value {
            Value::String(text) => self.sentinels.iter().any(|s| s == text),
            _ => false,
        }
    }

    /// Returns the number of cells rewritten. Running it twice rewrites
    /// nothing the second time.
    pub fn normalize(&self, dataset: &mut Dataset) -> usize {
        let mut rewritten = 0usize;
        for column in &mut dataset.columns {
            let mut column_hits = 0usize;
            for cell in &mut column.values {
                if cell.as_ref().is_some_and(|value| self.is_sentinel(value)) {
                    *cell = None;
                    column_hits += 1;
                }
            }
            if column_hits > 0 {
                debug!(
                    "[{}] {} sentinel value(s) cleared in column '{}'",
                    dataset.name, column_hits, column.name
                );
                if column.reinfer() {
                    debug!(
                        "[{}] column '{}' re-typed as {}",
                        dataset.name, column.name, column.storage
                    );
                }
            }
            rewritten += column_hits;
        }
        info!(
            "[{}] missing-value normalisation rewrote {} cell(s)",
            dataset.name, rewritten
        );
        rewritten
    }
}
