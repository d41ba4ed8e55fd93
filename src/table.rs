//! Plain-text tables for terminal output.

use std::{borrow::Cow, fmt::Write as _};

use unicode_width::UnicodeWidthChar;

use crate::{
    render::{format_count, result_headers, result_row},
    table_profile::TableProfile,
};

/// Cells wider than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 40;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| cell_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(cell_width(&sanitize_cell(cell)));
        }
    }
    for width in &mut widths {
        *width = (*width).clamp(1, MAX_CELL_WIDTH);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separators = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separators, &separator_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// Table header lines plus the result matrix of one profiled table.
pub fn render_profile(profile: &TableProfile) -> String {
    let meta = &profile.meta;
    let mut output = String::new();
    let _ = writeln!(
        output,
        "[{}] {} / schema: {} / korean: {} / rows: {} / columns: {}",
        profile.sheet_name(),
        meta.english_name,
        meta.schema.as_deref().unwrap_or("-"),
        meta.korean_name.as_deref().unwrap_or("-"),
        format_count(meta.row_count),
        format_count(meta.col_count)
    );
    let headers = result_headers()
        .into_iter()
        .map(|(_, header)| header.to_string())
        .collect::<Vec<_>>();
    let rows = profile
        .columns
        .iter()
        .map(|column| {
            result_row(column)
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect()
        })
        .collect::<Vec<Vec<String>>>();
    output.push_str(&render_table(&headers, &rows));
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let Some(width) = widths.get(idx).copied() else {
            break;
        };
        let mut cell = fit(&sanitize_cell(value), width);
        let padding = width.saturating_sub(cell_width(&cell));
        cell.push_str(&" ".repeat(padding));
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

/// Truncates to `width` display columns, ending with `…` when cut.
fn fit(value: &str, width: usize) -> String {
    if cell_width(value) <= width {
        return value.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in value.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Display columns, counting wide (e.g. Hangul) characters as two and
/// skipping ANSI colour sequences.
fn cell_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += ch.width().unwrap_or(0);
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(
            value
                .chars()
                .filter(|ch| *ch != '\r')
                .map(|ch| if ch == '\n' || ch == '\t' { ' ' } else { ch })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}
