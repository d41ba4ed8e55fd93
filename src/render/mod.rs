//! Report rendering.
//!
//! Rendering is two-phase. [`layout::raw_index_sheet`] and
//! [`layout::raw_table_sheet`] lay out plain content the way a dataframe
//! writer would, placeholder index row and column included. The layout pass
//! then deletes the placeholders, remaps merged ranges, and styles each
//! sheet. [`xlsx::write_workbook`] serialises the finished grids.
//!
//! A layout failure on one table sheet is logged and that sheet keeps its
//! raw content; the index sheet's layout and the final write are fatal.

pub mod grid;
pub mod layout;
pub mod xlsx;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use itertools::Itertools;
use log::{error, info};

use crate::{
    data::format_float,
    profile::ColumnProfile,
    table_profile::TableProfile,
};

use self::grid::SheetGrid;

pub const INDEX_SHEET_NAME: &str = "테이블 리스트";
pub const REPORT_FILE_PREFIX: &str = "QC결과서";

pub const GROUP_COMMON: &str = "공통";
pub const GROUP_CONTINUOUS: &str = "연속형";
pub const GROUP_CATEGORICAL: &str = "범주형";
pub const GROUP_REMARK: &str = "비고";

pub const COMMON_HEADERS: &[&str] = &[
    "No",
    "컬럼 영문명",
    "컬럼 한글명",
    "데이터 타입",
    "null 개수",
    "%null",
    "적재건수",
    "%적재건수",
];
pub const CONTINUOUS_HEADERS: &[&str] = &["최솟값", "최댓값", "평균", "표준편차", "중위수"];
pub const CATEGORICAL_HEADERS: &[&str] = &[
    "범주수",
    "범주",
    "%범주",
    "정의된 범주 외",
    "정의된 범주 외 수",
    "최빈값",
    "최빈값 수",
    "%최빈값",
];
pub const REMARK_HEADERS: &[&str] = &["비고"];

/// Result-matrix header groups in column order.
pub fn header_groups() -> [(&'static str, &'static [&'static str]); 4] {
    [
        (GROUP_COMMON, COMMON_HEADERS),
        (GROUP_CONTINUOUS, CONTINUOUS_HEADERS),
        (GROUP_CATEGORICAL, CATEGORICAL_HEADERS),
        (GROUP_REMARK, REMARK_HEADERS),
    ]
}

/// Flat `(group, header)` pairs, one per result column.
pub fn result_headers() -> Vec<(&'static str, &'static str)> {
    header_groups()
        .into_iter()
        .flat_map(|(group, headers)| headers.iter().map(move |header| (group, *header)))
        .collect()
}

pub fn report_file_name(created: NaiveDateTime) -> String {
    format!(
        "{REPORT_FILE_PREFIX}_{}.xlsx",
        created.format("%Y%m%d_%H%M%S")
    )
}

/// `1234567` -> `1,234,567`
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in bytes.iter().enumerate() {
        if idx > 0 && (bytes.len() - idx).is_multiple_of(3) {
            out.push(',');
        }
        out.push(char::from(*digit));
    }
    out
}

/// Ratio in `0..=1` as a percentage with `decimals` places, e.g. `12.50%`.
pub fn format_percent(ratio: f64, decimals: usize) -> String {
    if ratio.is_nan() {
        return "nan%".to_string();
    }
    format!("{:.*}%", decimals, ratio * 100.0)
}

/// A list cell: elements joined by a comma and a line break.
pub fn list_to_text<S: AsRef<str>>(items: &[S]) -> String {
    items.iter().map(AsRef::as_ref).join(",\n")
}

/// A mapping cell: one `key: value,` line per entry, trailing comma trimmed.
pub fn map_to_text<K: AsRef<str>, V: AsRef<str>>(entries: &[(K, V)]) -> String {
    let mut text = entries
        .iter()
        .map(|(key, value)| format!("{}: {},", key.as_ref(), value.as_ref()))
        .join("\n");
    text.pop();
    text
}

fn percent_map(entries: &[(String, f64)], decimals: usize) -> String {
    let formatted = entries
        .iter()
        .map(|(key, ratio)| (key.as_str(), format_percent(*ratio, decimals)))
        .collect::<Vec<_>>();
    map_to_text(&formatted)
}

/// Display text for every result column of one profile, in header order.
pub fn result_row(profile: &ColumnProfile) -> Vec<Option<String>> {
    let common = &profile.common;
    let continuous = &profile.continuous;
    let categorical = &profile.categorical;
    vec![
        Some(common.ordinal_key()),
        Some(common.english_name.clone()),
        common.korean_name.clone(),
        Some(common.resolved_type.clone()),
        Some(format_count(common.null_count)),
        Some(format_percent(common.null_ratio, 2)),
        Some(format_count(common.loaded_count)),
        Some(format_percent(common.loaded_ratio, 2)),
        continuous.min.as_ref().map(|v| v.as_display()),
        continuous.max.as_ref().map(|v| v.as_display()),
        continuous.mean.map(format_float),
        continuous.stddev.map(format_float),
        continuous.median.map(format_float),
        categorical.distinct_count.map(format_count),
        categorical.sample_categories.as_deref().map(list_to_text),
        categorical
            .category_proportions
            .as_deref()
            .map(|entries| percent_map(entries, 3)),
        categorical.out_of_definition_sample.as_deref().map(list_to_text),
        categorical.out_of_definition_count.map(format_count),
        categorical.modes.as_deref().map(list_to_text),
        categorical.mode_counts.as_deref().map(|entries| {
            let formatted = entries
                .iter()
                .map(|(key, count)| (key.as_str(), format_count(*count)))
                .collect::<Vec<_>>();
            map_to_text(&formatted)
        }),
        categorical
            .mode_proportions
            .as_deref()
            .map(|entries| percent_map(entries, 2)),
        profile.remark().map(str::to_string),
    ]
}

/// Builds every sheet: raw write for all, then the layout pass.
pub fn build_sheets(profiles: &[TableProfile]) -> Result<Vec<SheetGrid>> {
    let entries = profiles
        .iter()
        .map(TableProfile::index_entry)
        .collect::<Vec<_>>();
    let mut index = layout::raw_index_sheet(&entries);
    info!("Index sheet '{INDEX_SHEET_NAME}' written");
    let raw_tables = profiles
        .iter()
        .enumerate()
        .map(|(idx, profile)| {
            let grid = layout::raw_table_sheet(profile)
                .with_context(|| format!("Writing sheet '{}'", profile.sheet_name()))?;
            log_progress(idx, profiles.len(), "sheet(s) written");
            Ok(grid)
        })
        .collect::<Result<Vec<_>>>()?;

    layout::format_index_sheet(&mut index)
        .with_context(|| format!("Formatting sheet '{INDEX_SHEET_NAME}'"))?;
    info!("Index sheet formatted");

    let mut sheets = Vec::with_capacity(profiles.len() + 1);
    sheets.push(index);
    for (idx, (profile, raw)) in profiles.iter().zip(raw_tables).enumerate() {
        sheets.push(finish_table_sheet(raw, profile, idx, profiles.len()));
    }
    Ok(sheets)
}

/// Runs the layout pass on a copy of `raw`. On failure the error is logged
/// and `raw` is returned untouched.
pub fn finish_table_sheet(
    raw: SheetGrid,
    profile: &TableProfile,
    idx: usize,
    total: usize,
) -> SheetGrid {
    let mut formatted = raw.clone();
    match layout::format_table_sheet(&mut formatted, profile) {
        Ok(()) => {
            log_progress(idx, total, "sheet(s) formatted");
            formatted
        }
        Err(err) => {
            error!("{err:?}");
            error!(
                "{} / {} sheet formatting failed ('{}'); raw content kept",
                idx + 1,
                total,
                raw.name()
            );
            raw
        }
    }
}

fn log_progress(idx: usize, total: usize, what: &str) {
    if (idx + 1) % 10 == 0 || idx + 1 == total {
        info!("{} / {} {}", idx + 1, total, what);
    }
}

/// Renders the report into `output_dir` and returns the written path.
pub fn render_report(
    profiles: &[TableProfile],
    output_dir: &Path,
    created: NaiveDateTime,
) -> Result<PathBuf> {
    let sheets = build_sheets(profiles)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Creating output directory {output_dir:?}"))?;
    let path = output_dir.join(report_file_name(created));
    xlsx::write_workbook(&path, &sheets)
        .with_context(|| format!("Writing workbook {path:?}"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_use_thousands_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn percentages_follow_requested_precision() {
        assert_eq!(format_percent(0.5, 2), "50.00%");
        assert_eq!(format_percent(1.0 / 3.0, 3), "33.333%");
        assert_eq!(format_percent(f64::NAN, 2), "nan%");
    }

    #[test]
    fn rich_text_joins_lists_and_maps() {
        assert_eq!(list_to_text(&["a", "b", "..."]), "a,\nb,\n...");
        assert_eq!(
            map_to_text(&[("a", "50.000%"), ("b", "50.000%")]),
            "a: 50.000%,\nb: 50.000%"
        );
        assert_eq!(map_to_text::<&str, &str>(&[]), "");
    }

    #[test]
    fn result_headers_span_twenty_two_columns() {
        let headers = result_headers();
        assert_eq!(headers.len(), 22);
        assert_eq!(headers[0], ("공통", "No"));
        assert_eq!(headers[21], ("비고", "비고"));
    }

    fn orders_profile() -> TableProfile {
        let dataset = crate::dataset::Dataset::new(
            "ORDERS",
            vec![crate::dataset::Column::from_text("id", &["1", "2"], false)],
        )
        .unwrap();
        crate::table_profile::profile_table(
            &dataset,
            &crate::catalog::Catalogs::default(),
            &std::collections::BTreeSet::new(),
            1,
        )
    }

    #[test]
    fn failed_layout_keeps_the_raw_sheet() {
        let profile = orders_profile();
        // too small for the title merge
        let mut undersized = SheetGrid::new(profile.sheet_name());
        undersized.set_text(0, 0, Some("raw".to_string()));
        let kept = finish_table_sheet(undersized.clone(), &profile, 0, 2);
        assert_eq!(kept, undersized);

        let raw = layout::raw_table_sheet(&profile).unwrap();
        let formatted = finish_table_sheet(raw.clone(), &profile, 1, 2);
        assert_ne!(formatted, raw);
        assert_eq!(formatted.text(0, 0), Some(layout::TABLE_INFO_TITLE));
        assert_eq!(formatted.row_count(), raw.row_count() - 1);
    }

    #[test]
    fn report_file_name_carries_timestamp() {
        let created = chrono::NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(report_file_name(created), "QC결과서_20240506_070809.xlsx");
    }
}
