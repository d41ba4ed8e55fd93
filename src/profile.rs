//! Per-column profiling.
//!
//! A column's resolved type label is classified into a [`ColumnKind`], and
//! the kind answers two independent capability questions: which continuous
//! statistics apply ([`ContinuousScope`]) and whether the column is
//! enumerable. Temporal columns answer yes to both.
//!
//! Statistic computation that meets values it cannot handle (text under a
//! numeric label, values that cannot be ordered against each other) stops
//! with [`ProfileError::TypeMismatch`]. The profiler catches it, keeps
//! whatever was computed before the failure, and tags the column with
//! [`Annotation::TypeMismatch`].

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use itertools::Itertools;
use log::{debug, error};

use crate::{
    catalog::MetadataRecord,
    data::Value,
    dataset::{Column, StorageType},
    error::ProfileError,
};

pub const ALL_MISSING_REMARK: &str = "결측값 100%";
pub const TYPE_MISMATCH_REMARK: &str = "컬럼 정의서 상의 데이터 타입과 실제 데이터 타입 불일치";
pub const ELLIPSIS: &str = "...";
pub const OTHER_BUCKET: &str = "그 외";
pub const DATETIME_LABEL: &str = "datetime";

/// Distinct values shown in full before the category list is truncated.
pub const CATEGORY_DISPLAY_LIMIT: usize = 5;
/// Leading/trailing categories kept around the ellipsis.
pub const CATEGORY_EDGE: usize = 2;
/// Modes listed in full before truncation.
pub const MODE_DISPLAY_LIMIT: usize = 3;

const NUMERIC_KEYWORDS: &[&str] = &["float", "int", "numeric"];
const TEMPORAL_KEYWORDS: &[&str] = &["datetime"];
const TEXTUAL_KEYWORDS: &[&str] = &["object", "char", "varchar"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Temporal,
    Textual,
    Unprofiled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuousScope {
    /// min, max, mean, standard deviation, median
    Full,
    /// min and max only
    Range,
}

impl ColumnKind {
    /// Case-insensitive keyword match on the type label; first match wins.
    pub fn classify(label: &str) -> Self {
        let lowered = label.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));
        if has(NUMERIC_KEYWORDS) {
            ColumnKind::Numeric
        } else if has(TEMPORAL_KEYWORDS) {
            ColumnKind::Temporal
        } else if has(TEXTUAL_KEYWORDS) {
            ColumnKind::Textual
        } else {
            ColumnKind::Unprofiled
        }
    }

    pub fn continuous_scope(self) -> Option<ContinuousScope> {
        match self {
            ColumnKind::Numeric => Some(ContinuousScope::Full),
            ColumnKind::Temporal => Some(ContinuousScope::Range),
            ColumnKind::Textual | ColumnKind::Unprofiled => None,
        }
    }

    pub fn is_enumerable(self) -> bool {
        match self {
            ColumnKind::Temporal | ColumnKind::Textual => true,
            ColumnKind::Numeric | ColumnKind::Unprofiled => false,
        }
    }
}

/// Why a column carries a remark. The renderer switches on this tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Annotation {
    #[default]
    None,
    AllMissing,
    TypeMismatch,
}

impl Annotation {
    pub fn remark(self) -> Option<&'static str> {
        match self {
            Annotation::None => None,
            Annotation::AllMissing => Some(ALL_MISSING_REMARK),
            Annotation::TypeMismatch => Some(TYPE_MISMATCH_REMARK),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommonSection {
    pub ordinal: usize,
    pub english_name: String,
    pub korean_name: Option<String>,
    pub resolved_type: String,
    pub null_count: usize,
    pub null_ratio: f64,
    pub loaded_count: usize,
    pub loaded_ratio: f64,
}

impl CommonSection {
    /// Zero-padded ordinal, e.g. `007`.
    pub fn ordinal_key(&self) -> String {
        format!("{:03}", self.ordinal)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuousSection {
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
}

/// Ordered `(label, value)` pairs; order is display order.
pub type Proportions = Vec<(String, f64)>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoricalSection {
    pub distinct_count: Option<usize>,
    pub sample_categories: Option<Vec<String>>,
    /// Ratios in `0..=1`, including [`OTHER_BUCKET`] when truncated.
    pub category_proportions: Option<Proportions>,
    pub out_of_definition_sample: Option<Vec<String>>,
    pub out_of_definition_count: Option<usize>,
    pub modes: Option<Vec<String>>,
    pub mode_counts: Option<Vec<(String, usize)>>,
    pub mode_proportions: Option<Proportions>,
}

impl CategoricalSection {
    pub fn proportion(&self, category: &str) -> Option<f64> {
        self.category_proportions
            .as_ref()?
            .iter()
            .find(|(label, _)| label == category)
            .map(|(_, ratio)| *ratio)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub common: CommonSection,
    pub kind: ColumnKind,
    pub continuous: ContinuousSection,
    pub categorical: CategoricalSection,
    pub annotation: Annotation,
}

impl ColumnProfile {
    pub fn remark(&self) -> Option<&'static str> {
        self.annotation.remark()
    }
}

/// Everything the profiler needs to know about one column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRequest<'a> {
    pub table: &'a str,
    /// 1-based position in the dataset.
    pub ordinal: usize,
    pub column: &'a Column,
    pub metadata: &'a MetadataRecord,
    /// Caller-supplied flag marking the column as date/time.
    pub datetime_override: bool,
}

/// Label that drives classification: the date/time override wins, then the
/// declared catalog type, then the storage type.
pub fn resolve_type_label(
    metadata: &MetadataRecord,
    storage: StorageType,
    datetime_override: bool,
) -> String {
    if datetime_override {
        DATETIME_LABEL.to_string()
    } else if let Some(declared) = &metadata.declared_type {
        declared.clone()
    } else {
        storage.dtype_name().to_string()
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub fn profile_column(request: &ColumnRequest<'_>) -> ColumnProfile {
    let column = request.column;
    let rows = column.len();
    let null_count = column.null_count();
    let loaded_count = rows - null_count;
    let resolved_type =
        resolve_type_label(request.metadata, column.storage, request.datetime_override);
    let kind = ColumnKind::classify(&resolved_type);

    let common = CommonSection {
        ordinal: request.ordinal,
        english_name: request.metadata.english_name.clone(),
        korean_name: request.metadata.korean_name.clone(),
        resolved_type,
        null_count,
        null_ratio: ratio(null_count, rows),
        loaded_count,
        loaded_ratio: ratio(loaded_count, rows),
    };

    let mut annotation = Annotation::None;
    if null_count == rows {
        annotation = Annotation::AllMissing;
    }

    let mut continuous = ContinuousSection::default();
    let mut categorical = CategoricalSection::default();
    let outcome = compute_sections(
        kind,
        column,
        request.metadata.defined_codes.as_ref(),
        &mut continuous,
        &mut categorical,
    );
    if let Err(err) = outcome {
        error!(
            "[{}] column '{}' ({}) failed: {err}",
            request.table, column.name, common.resolved_type
        );
        error!("{err:?}");
        annotation = Annotation::TypeMismatch;
    }
    debug!(
        "[{}] {} '{}' profiled as {:?}",
        request.table,
        common.ordinal_key(),
        column.name,
        kind
    );

    ColumnProfile {
        common,
        kind,
        continuous,
        categorical,
        annotation,
    }
}

/// Fills the sections in place so a failure keeps earlier results.
fn compute_sections(
    kind: ColumnKind,
    column: &Column,
    defined_codes: Option<&BTreeSet<String>>,
    continuous: &mut ContinuousSection,
    categorical: &mut CategoricalSection,
) -> Result<(), ProfileError> {
    if let Some(scope) = kind.continuous_scope() {
        profile_continuous(scope, column, continuous)?;
    }
    if kind.is_enumerable() {
        profile_categorical(column, defined_codes, categorical);
    }
    Ok(())
}

fn mismatch(column: &Column, detail: String) -> ProfileError {
    ProfileError::TypeMismatch {
        column: column.name.clone(),
        detail,
    }
}

fn extreme(column: &Column, wanted: Ordering) -> Result<Value, ProfileError> {
    let mut best: Option<&Value> = None;
    for value in column.present() {
        best = match best {
            None => Some(value),
            Some(current) => match value.try_cmp(current) {
                Some(ordering) if ordering == wanted => Some(value),
                Some(_) => Some(current),
                None => {
                    return Err(mismatch(
                        column,
                        format!(
                            "cannot compare {} value '{}' with {} value '{}'",
                            value.kind_name(),
                            value,
                            current.kind_name(),
                            current
                        ),
                    ));
                }
            },
        };
    }
    Ok(best.cloned().unwrap_or(Value::Float(f64::NAN)))
}

fn profile_continuous(
    scope: ContinuousScope,
    column: &Column,
    section: &mut ContinuousSection,
) -> Result<(), ProfileError> {
    section.min = Some(extreme(column, Ordering::Less)?);
    section.max = Some(extreme(column, Ordering::Greater)?);
    if scope == ContinuousScope::Range {
        return Ok(());
    }

    let numbers = column
        .present()
        .map(|value| {
            value.as_f64().ok_or_else(|| {
                mismatch(
                    column,
                    format!(
                        "{} value '{}' is not numeric",
                        value.kind_name(),
                        value
                    ),
                )
            })
        })
        .collect::<Result<Vec<f64>, ProfileError>>()?;

    section.mean = Some(mean(&numbers));
    section.stddev = Some(sample_std_dev(&numbers));
    section.median = Some(median(&numbers));
    Ok(())
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); NaN below two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = mean(values);
    let sum_squares = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    (sum_squares / (values.len() as f64 - 1.0)).sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// `head + ... + tail` of a list longer than `limit`, the list itself otherwise.
pub fn truncate_display(items: &[String], limit: usize) -> Vec<String> {
    if items.len() <= limit {
        return items.to_vec();
    }
    let mut shown = items[..CATEGORY_EDGE].to_vec();
    shown.push(ELLIPSIS.to_string());
    shown.extend_from_slice(&items[items.len() - CATEGORY_EDGE..]);
    shown
}

fn profile_categorical(
    column: &Column,
    defined_codes: Option<&BTreeSet<String>>,
    section: &mut CategoricalSection,
) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut representatives: HashMap<String, &Value> = HashMap::new();
    let mut total = 0usize;
    for value in column.present() {
        let key = value.as_display();
        *counts.entry(key.clone()).or_insert(0) += 1;
        representatives.entry(key).or_insert(value);
        total += 1;
    }
    let uniques = column
        .present()
        .map(Value::as_display)
        .unique()
        .collect::<Vec<_>>();
    let count_of = |key: &str| counts.get(key).copied().unwrap_or(0);

    section.distinct_count = Some(uniques.len());
    section.sample_categories = Some(truncate_display(&uniques, CATEGORY_DISPLAY_LIMIT));

    let mut proportions = uniques
        .iter()
        .take(CATEGORY_DISPLAY_LIMIT)
        .map(|key| (key.clone(), ratio(count_of(key), total)))
        .collect::<Proportions>();
    if uniques.len() > CATEGORY_DISPLAY_LIMIT {
        let shown = uniques
            .iter()
            .take(CATEGORY_DISPLAY_LIMIT)
            .map(|key| count_of(key))
            .sum::<usize>();
        proportions.push((OTHER_BUCKET.to_string(), ratio(total - shown, total)));
    }
    section.category_proportions = Some(proportions);

    if let Some(codes) = defined_codes {
        // Checked against the displayed list, ellipsis included, not every
        // distinct value.
        let undefined = section
            .sample_categories
            .iter()
            .flatten()
            .filter(|category| !codes.contains(*category))
            .cloned()
            .collect::<Vec<_>>();
        section.out_of_definition_count = Some(undefined.len());
        section.out_of_definition_sample = if undefined.is_empty() {
            None
        } else {
            Some(truncate_display(&undefined, CATEGORY_DISPLAY_LIMIT))
        };
    }

    let top = counts.values().copied().max().unwrap_or(0);
    let mut modes = counts
        .iter()
        .filter(|(_, count)| **count == top)
        .map(|(key, _)| key.clone())
        .collect::<Vec<_>>();
    modes.sort_by(|a, b| {
        match (representatives.get(a), representatives.get(b)) {
            (Some(left), Some(right)) => left.try_cmp(right),
            _ => None,
        }
        .unwrap_or_else(|| a.cmp(b))
    });

    let listed = if modes.len() <= MODE_DISPLAY_LIMIT {
        modes.clone()
    } else {
        modes[..CATEGORY_EDGE].to_vec()
    };
    section.mode_counts = Some(
        listed
            .iter()
            .map(|key| (key.clone(), count_of(key)))
            .collect(),
    );
    section.mode_proportions = Some(
        listed
            .iter()
            .map(|key| (key.clone(), ratio(count_of(key), total)))
            .collect(),
    );
    if modes.len() > MODE_DISPLAY_LIMIT {
        let mut shown = listed;
        shown.push(ELLIPSIS.to_string());
        section.modes = Some(shown);
    } else {
        section.modes = Some(modes);
    }
}
