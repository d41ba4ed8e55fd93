use unicode_width::UnicodeWidthStr;

use crate::{
    error::RenderError,
    profile::Annotation,
    table_profile::{TableIndexEntry, TableProfile},
};

use super::{
    GROUP_CATEGORICAL, GROUP_COMMON, GROUP_CONTINUOUS, GROUP_REMARK, INDEX_SHEET_NAME,
    grid::{CellStyle, CellValue, MergeRange, SheetGrid},
    header_groups, result_row,
};

pub const TABLE_INFO_TITLE: &str = "테이블 정보";
pub const COLUMN_INFO_TITLE: &str = "컬럼 정보";

pub const INDEX_HEADERS: &[&str] = &["No.", "스키마명", "테이블 영문명", "테이블 한글명", "워크 시트명"];
const INDEX_LINK_COL: usize = 2;
const INDEX_SHEET_NAME_COL: usize = 4;
const INDEX_WIDTHS: &[f64] = &[13.67, 15.0, 24.33, 60.83];

const TOP_START_ROW: usize = 1;
const TOP_START_COL: usize = 1;
const TABLE_DETAIL: &str = "테이블 상세";

/// Header rows of the result matrix before the placeholder row is removed.
const BOTTOM_START_ROW: usize = 9;
const PLACEHOLDER_ROW: usize = BOTTOM_START_ROW + 2;
const PLACEHOLDER_COL: usize = 0;
/// First data row once the placeholder row is gone.
const DATA_START_ROW: usize = BOTTOM_START_ROW + 2;
const COLUMN_INFO_ROW: usize = BOTTOM_START_ROW - 1;

const TITLE_FILL: u32 = 0x000000;
const TITLE_FONT: u32 = 0xffffff;
const LABEL_FILL: u32 = 0xbfbfbf;
const DETAIL_FILL: u32 = 0xd9d9d9;
const INDEX_HEADER_FILL: u32 = 0xededed;
const INDEX_ORDINAL_FILL: u32 = 0xd8d8d8;
const MISMATCH_FILL: u32 = 0xf79645;
const ALL_MISSING_FILL: u32 = 0xffff00;
const ALERT_FONT: u32 = 0xff0000;

const MIN_WIDTH: usize = 8;
const MAX_WIDTH: usize = 60;

/// `(group fill, sub-header fill)` for a result group.
fn group_fills(group: &str) -> Option<(u32, u32)> {
    match group {
        GROUP_COMMON | GROUP_REMARK => Some((LABEL_FILL, DETAIL_FILL)),
        GROUP_CONTINUOUS => Some((0xf4b084, 0xf8cbad)),
        GROUP_CATEGORICAL => Some((0x9bc2e6, 0xbdd7ee)),
        _ => None,
    }
}

fn boxed(style: &mut CellStyle) {
    style.border = true;
    style.vcenter = true;
}

fn centered(style: &mut CellStyle) {
    boxed(style);
    style.center = true;
}

fn title(style: &mut CellStyle) {
    centered(style);
    style.bold = true;
    style.fill = Some(TITLE_FILL);
    style.font_color = Some(TITLE_FONT);
}

fn alert(style: &mut CellStyle, fill: u32) {
    boxed(style);
    style.wrap = true;
    style.bold = true;
    style.fill = Some(fill);
    style.font_color = Some(ALERT_FONT);
}

fn text(value: Option<&str>) -> Option<CellValue> {
    value.map(|v| CellValue::Text(v.to_string()))
}

pub fn raw_index_sheet(entries: &[TableIndexEntry]) -> SheetGrid {
    let mut grid = SheetGrid::new(INDEX_SHEET_NAME);
    for (col, header) in INDEX_HEADERS.iter().enumerate() {
        grid.set_text(0, col, Some(header.to_string()));
    }
    for (idx, entry) in entries.iter().enumerate() {
        let row = idx + 1;
        grid.set_number(row, 0, entry.ordinal as f64);
        grid.set_value(row, 1, text(entry.schema.as_deref()));
        grid.set_text(row, 2, Some(entry.english_name.clone()));
        grid.set_value(row, 3, text(entry.korean_name.as_deref()));
        grid.set_text(row, INDEX_SHEET_NAME_COL, Some(entry.sheet_name()));
    }
    grid
}

/// Styles the index sheet, links each table name to its sheet, and drops
/// the sheet-name helper column.
pub fn format_index_sheet(grid: &mut SheetGrid) -> Result<(), RenderError> {
    let last_col = INDEX_SHEET_NAME_COL - 1;
    grid.style_range(0, 0, 0, last_col, |style| {
        centered(style);
        style.bold = true;
        style.fill = Some(INDEX_HEADER_FILL);
    })?;
    for row in 1..grid.row_count() {
        grid.style_range(row, 0, row, 0, |style| {
            centered(style);
            style.bold = true;
            style.fill = Some(INDEX_ORDINAL_FILL);
        })?;
        grid.style_range(row, 1, row, last_col, centered)?;
        if let Some(target) = grid.text(row, INDEX_SHEET_NAME_COL).map(str::to_string) {
            grid.set_link(row, INDEX_LINK_COL, target)?;
            grid.cell_mut(row, INDEX_LINK_COL)?.style.hyperlink = true;
        }
    }
    for (col, width) in INDEX_WIDTHS.iter().enumerate() {
        grid.set_width(col, *width);
    }
    grid.delete_col(INDEX_SHEET_NAME_COL);
    Ok(())
}

/// Table metadata block followed by the two-level result matrix, with the
/// dataframe writer's index column and index-name row still in place.
pub fn raw_table_sheet(profile: &TableProfile) -> Result<SheetGrid, RenderError> {
    let mut grid = SheetGrid::new(profile.sheet_name());
    let meta = &profile.meta;

    let top: [(&str, &str, Option<CellValue>); 5] = [
        ("스키마명", "스키마명", text(meta.schema.as_deref())),
        ("테이블 영문명", "테이블 영문명", text(Some(&meta.english_name))),
        ("테이블 한글명", "테이블 한글명", text(meta.korean_name.as_deref())),
        (TABLE_DETAIL, "행 수", Some(CellValue::Number(meta.row_count as f64))),
        (TABLE_DETAIL, "열 수", Some(CellValue::Number(meta.col_count as f64))),
    ];
    for (offset, (label, sub_label, value)) in top.iter().enumerate() {
        let row = TOP_START_ROW + offset;
        // a repeated outer label is written once and merged down
        if offset == 0 || top[offset - 1].0 != *label {
            grid.set_text(row, TOP_START_COL, Some(label.to_string()));
        }
        grid.set_text(row, TOP_START_COL + 1, Some(sub_label.to_string()));
        grid.set_value(row, TOP_START_COL + 2, value.clone());
    }
    if let Some(first) = top.iter().position(|(label, _, _)| *label == TABLE_DETAIL) {
        grid.merge(MergeRange::new(
            TOP_START_ROW + first,
            TOP_START_COL,
            TOP_START_ROW + top.len() - 1,
            TOP_START_COL,
        ))?;
    }

    let mut col = 1;
    for (group, headers) in header_groups() {
        grid.set_text(BOTTOM_START_ROW, col, Some(group.to_string()));
        let last = col + headers.len() - 1;
        for (offset, header) in headers.iter().enumerate() {
            grid.set_text(BOTTOM_START_ROW + 1, col + offset, Some(header.to_string()));
        }
        if last > col {
            grid.merge(MergeRange::new(BOTTOM_START_ROW, col, BOTTOM_START_ROW, last))?;
        }
        col = last + 1;
    }
    grid.set_text(PLACEHOLDER_ROW, PLACEHOLDER_COL, None);

    for (idx, column) in profile.columns.iter().enumerate() {
        let row = PLACEHOLDER_ROW + 1 + idx;
        grid.set_number(row, 0, idx as f64);
        for (offset, value) in result_row(column).into_iter().enumerate() {
            grid.set_text(row, 1 + offset, value);
        }
    }
    Ok(grid)
}

/// Removes the placeholders and applies titles, bands, borders, remark
/// highlighting, and column widths.
pub fn format_table_sheet(grid: &mut SheetGrid, profile: &TableProfile) -> Result<(), RenderError> {
    grid.delete_row(PLACEHOLDER_ROW);
    grid.delete_col(PLACEHOLDER_COL);

    let label_last_row = TOP_START_ROW + 4;

    grid.set_text(0, 0, Some(TABLE_INFO_TITLE.to_string()));
    grid.merge(MergeRange::new(0, 0, 0, 1))?;
    grid.style_range(0, 0, 0, 1, title)?;
    for row in TOP_START_ROW..TOP_START_ROW + 3 {
        grid.merge(MergeRange::new(row, 0, row, 1))?;
    }

    grid.set_text(COLUMN_INFO_ROW, 0, Some(COLUMN_INFO_TITLE.to_string()));
    grid.merge(MergeRange::new(COLUMN_INFO_ROW, 0, COLUMN_INFO_ROW, 1))?;
    grid.style_range(COLUMN_INFO_ROW, 0, COLUMN_INFO_ROW, 1, title)?;

    grid.style_range(TOP_START_ROW, 0, label_last_row, 1, |style| {
        centered(style);
        style.fill = Some(LABEL_FILL);
    })?;
    grid.style_range(TOP_START_ROW + 3, 1, label_last_row, 1, |style| {
        style.fill = Some(DETAIL_FILL);
    })?;
    grid.style_range(TOP_START_ROW, 2, label_last_row, 2, boxed)?;

    let mut col = 0;
    for (group, headers) in header_groups() {
        let Some((group_fill, sub_fill)) = group_fills(group) else {
            continue;
        };
        let last = col + headers.len() - 1;
        grid.style_range(BOTTOM_START_ROW, col, BOTTOM_START_ROW, last, |style| {
            centered(style);
            style.fill = Some(group_fill);
        })?;
        grid.style_range(BOTTOM_START_ROW + 1, col, BOTTOM_START_ROW + 1, last, |style| {
            centered(style);
            style.fill = Some(sub_fill);
        })?;
        if group == GROUP_REMARK {
            grid.merge(MergeRange::new(BOTTOM_START_ROW, col, BOTTOM_START_ROW + 1, col))?;
        }
        col = last + 1;
    }
    let last_col = col - 1;

    for (idx, column) in profile.columns.iter().enumerate() {
        let row = DATA_START_ROW + idx;
        grid.style_range(row, 0, row, last_col, |style| {
            boxed(style);
            style.wrap = true;
        })?;
        match column.annotation {
            Annotation::None => {}
            Annotation::AllMissing => {
                grid.style_range(row, last_col, row, last_col, |s| alert(s, ALL_MISSING_FILL))?;
            }
            Annotation::TypeMismatch => {
                grid.style_range(row, last_col, row, last_col, |s| alert(s, MISMATCH_FILL))?;
            }
        }
    }

    autofit(grid);
    Ok(())
}

/// Sets each unset column width to fit its widest line of text.
pub fn autofit(grid: &mut SheetGrid) {
    let mut widest = vec![0usize; grid.col_count()];
    for ((row, col), cell) in grid.cells() {
        if grid.covering_merge(row, col).is_some()
            || grid.merges().iter().any(|m| m.first_row == row && m.first_col == col)
        {
            continue;
        }
        let Some(value) = &cell.value else {
            continue;
        };
        let width = value
            .display()
            .lines()
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0);
        widest[col] = widest[col].max(width);
    }
    for (col, width) in widest.into_iter().enumerate() {
        if grid.width(col).is_none() {
            grid.set_width(col, (width + 2).clamp(MIN_WIDTH, MAX_WIDTH) as f64);
        }
    }
}
