use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, FormatUnderline, Url, Workbook,
    Worksheet,
};

use super::grid::{CellStyle, CellValue, SheetGrid};

const HYPERLINK_COLOR: u32 = 0x0563c1;

pub fn cell_format(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(fill) = style.fill {
        format = format
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(fill));
    }
    if let Some(color) = style.font_color {
        format = format.set_font_color(Color::RGB(color));
    }
    if style.hyperlink {
        format = format
            .set_font_color(Color::RGB(HYPERLINK_COLOR))
            .set_underline(FormatUnderline::Single);
    }
    if style.center {
        format = format.set_align(FormatAlign::Center);
    }
    if style.vcenter {
        format = format.set_align(FormatAlign::VerticalCenter);
    }
    if style.wrap {
        format = format.set_text_wrap();
    }
    if style.border {
        format = format
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::Black);
    }
    format
}

fn write_sheet(worksheet: &mut Worksheet, grid: &SheetGrid) -> Result<()> {
    worksheet
        .set_name(grid.name())
        .with_context(|| format!("Naming worksheet '{}'", grid.name()))?;

    for merge in grid.merges() {
        let anchor = grid.cell(merge.first_row, merge.first_col);
        let text = anchor
            .and_then(|cell| cell.value.as_ref())
            .map(CellValue::display)
            .unwrap_or_default();
        let format = anchor
            .map(|cell| cell_format(&cell.style))
            .unwrap_or_default();
        worksheet
            .merge_range(
                merge.first_row as u32,
                merge.first_col as u16,
                merge.last_row as u32,
                merge.last_col as u16,
                &text,
                &format,
            )
            .with_context(|| format!("Merging {merge} on '{}'", grid.name()))?;
    }

    for ((row, col), cell) in grid.cells() {
        let is_anchor = grid
            .merges()
            .iter()
            .any(|m| m.first_row == row && m.first_col == col);
        if grid.covering_merge(row, col).is_some() {
            continue;
        }
        // merged anchors already carry their text; only numbers need a rewrite
        if is_anchor && !matches!(cell.value, Some(CellValue::Number(_))) {
            continue;
        }
        let (r, c) = (row as u32, col as u16);
        let format = cell_format(&cell.style);
        match (&cell.link, &cell.value) {
            (Some(target), value) => {
                let label = value.as_ref().map(CellValue::display).unwrap_or_default();
                let url = Url::new(format!("internal:'{target}'!A1")).set_text(label);
                worksheet.write_url_with_format(r, c, url, &format)?;
            }
            (None, Some(CellValue::Text(text))) => {
                worksheet.write_string_with_format(r, c, text, &format)?;
            }
            (None, Some(CellValue::Number(number))) => {
                worksheet.write_number_with_format(r, c, *number, &format)?;
            }
            (None, None) if !cell.style.is_plain() => {
                worksheet.write_blank(r, c, &format)?;
            }
            (None, None) => {}
        }
    }

    for (col, width) in grid.widths() {
        worksheet.set_column_width(col as u16, width)?;
    }
    Ok(())
}

/// Serialises the grids, in order, into a single workbook at `path`.
pub fn write_workbook(path: &Path, sheets: &[SheetGrid]) -> Result<()> {
    let mut workbook = Workbook::new();
    for grid in sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, grid)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("Saving workbook to {path:?}"))?;
    Ok(())
}
