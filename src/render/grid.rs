//! In-memory worksheet used between the raw write and the layout pass.
//!
//! Coordinates are zero-based `(row, col)`. Deleting a row or column moves
//! every cell after it and remaps merged ranges: ranges past the deleted
//! index shift back by one, ranges spanning it shrink by one, and ranges
//! that collapse to a single cell are dropped.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt,
};

use crate::error::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            CellValue::Number(_) => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(n) => n.to_string(),
        }
    }
}

/// RGB colours are `0xRRGGBB`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellStyle {
    pub fill: Option<u32>,
    pub font_color: Option<u32>,
    pub bold: bool,
    pub center: bool,
    pub vcenter: bool,
    pub wrap: bool,
    pub border: bool,
    pub hyperlink: bool,
}

impl CellStyle {
    pub fn is_plain(&self) -> bool {
        *self == CellStyle::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: Option<CellValue>,
    pub style: CellStyle,
    /// Target sheet of an internal hyperlink.
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergeRange {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn overlaps(&self, other: &MergeRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }
}

/// `A1`-style column letters for a zero-based column index.
pub fn column_letters(col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl fmt::Display for MergeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letters(self.first_col),
            self.first_row + 1,
            column_letters(self.last_col),
            self.last_row + 1
        )
    }
}

/// Shifts an inclusive span past a deleted index. `None` when the span was
/// exactly the deleted index.
fn remap_span(first: usize, last: usize, deleted: usize) -> Option<(usize, usize)> {
    if last < deleted {
        Some((first, last))
    } else if first > deleted {
        Some((first - 1, last - 1))
    } else if first == last {
        None
    } else {
        Some((first, last - 1))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    name: String,
    cells: BTreeMap<(usize, usize), Cell>,
    rows: usize,
    cols: usize,
    merges: Vec<MergeRange>,
    widths: BTreeMap<usize, f64>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    fn grow(&mut self, row: usize, col: usize) {
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
    }

    /// Writes a value, growing the sheet as needed. `None` leaves the cell
    /// empty but still extends the sheet.
    pub fn set_value(&mut self, row: usize, col: usize, value: Option<CellValue>) {
        self.grow(row, col);
        match (self.cells.entry((row, col)), value) {
            (Entry::Occupied(mut slot), value) => slot.get_mut().value = value,
            (Entry::Vacant(slot), Some(value)) => {
                slot.insert(Cell {
                    value: Some(value),
                    ..Cell::default()
                });
            }
            (Entry::Vacant(_), None) => {}
        }
    }

    pub fn set_text(&mut self, row: usize, col: usize, text: Option<String>) {
        self.set_value(row, col, text.map(CellValue::Text));
    }

    pub fn set_number(&mut self, row: usize, col: usize, number: f64) {
        self.set_value(row, col, Some(CellValue::Number(number)));
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cell(row, col)?.value.as_ref()
    }

    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.value(row, col)?.as_text()
    }

    /// Non-empty cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), RenderError> {
        if row >= self.rows || col >= self.cols {
            return Err(RenderError::OutOfBounds {
                sheet: self.name.clone(),
                row,
                col,
            });
        }
        Ok(())
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Result<&mut Cell, RenderError> {
        self.check_bounds(row, col)?;
        Ok(self.cells.entry((row, col)).or_default())
    }

    /// Applies `apply` to the style of every cell in the inclusive range.
    pub fn style_range<F>(
        &mut self,
        first_row: usize,
        first_col: usize,
        last_row: usize,
        last_col: usize,
        apply: F,
    ) -> Result<(), RenderError>
    where
        F: Fn(&mut CellStyle),
    {
        self.check_bounds(last_row, last_col)?;
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                apply(&mut self.cell_mut(row, col)?.style);
            }
        }
        Ok(())
    }

    pub fn set_link(&mut self, row: usize, col: usize, target: String) -> Result<(), RenderError> {
        self.cell_mut(row, col)?.link = Some(target);
        Ok(())
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    pub fn merge(&mut self, range: MergeRange) -> Result<(), RenderError> {
        self.check_bounds(range.last_row, range.last_col)?;
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&range)) {
            return Err(RenderError::OverlappingMerge {
                sheet: self.name.clone(),
                range: range.to_string(),
                existing: existing.to_string(),
            });
        }
        if !range.is_single_cell() {
            self.merges.push(range);
        }
        Ok(())
    }

    /// The merge this cell belongs to, if it is not the merge's anchor.
    pub fn covering_merge(&self, row: usize, col: usize) -> Option<&MergeRange> {
        self.merges.iter().find(|m| {
            m.contains(row, col) && !(m.first_row == row && m.first_col == col)
        })
    }

    pub fn delete_row(&mut self, row: usize) {
        if row >= self.rows {
            return;
        }
        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .filter(|((r, _), _)| *r != row)
            .map(|((r, c), cell)| (((if r > row { r - 1 } else { r }), c), cell))
            .collect();
        self.merges = self
            .merges
            .iter()
            .filter_map(|m| {
                remap_span(m.first_row, m.last_row, row).map(|(first, last)| MergeRange {
                    first_row: first,
                    last_row: last,
                    ..*m
                })
            })
            .filter(|m| !m.is_single_cell())
            .collect();
        self.rows -= 1;
    }

    pub fn delete_col(&mut self, col: usize) {
        if col >= self.cols {
            return;
        }
        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .filter(|((_, c), _)| *c != col)
            .map(|((r, c), cell)| ((r, if c > col { c - 1 } else { c }), cell))
            .collect();
        self.merges = self
            .merges
            .iter()
            .filter_map(|m| {
                remap_span(m.first_col, m.last_col, col).map(|(first, last)| MergeRange {
                    first_col: first,
                    last_col: last,
                    ..*m
                })
            })
            .filter(|m| !m.is_single_cell())
            .collect();
        self.widths = std::mem::take(&mut self.widths)
            .into_iter()
            .filter(|(c, _)| *c != col)
            .map(|(c, w)| (if c > col { c - 1 } else { c }, w))
            .collect();
        self.cols -= 1;
    }

    pub fn set_width(&mut self, col: usize, width: f64) {
        self.widths.insert(col, width);
    }

    pub fn width(&self, col: usize) -> Option<f64> {
        self.widths.get(&col).copied()
    }

    pub fn widths(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.widths.iter().map(|(col, width)| (*col, *width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_cover_multi_letter_columns() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(MergeRange::new(9, 1, 9, 8).to_string(), "B10:I10");
    }

    #[test]
    fn deleting_a_column_shifts_and_shrinks_merges() {
        let mut grid = SheetGrid::new("s");
        grid.set_text(5, 5, Some("x".into()));
        grid.merge(MergeRange::new(0, 0, 0, 2)).unwrap();
        grid.merge(MergeRange::new(2, 1, 3, 1)).unwrap();
        grid.merge(MergeRange::new(4, 0, 4, 1)).unwrap();
        grid.delete_col(0);
        assert_eq!(
            grid.merges(),
            &[MergeRange::new(0, 0, 0, 1), MergeRange::new(2, 0, 3, 0)]
        );
        assert_eq!(grid.text(5, 4), Some("x"));
        assert_eq!(grid.col_count(), 5);
    }

    #[test]
    fn deleting_a_row_moves_cells_up() {
        let mut grid = SheetGrid::new("s");
        grid.set_text(0, 0, Some("a".into()));
        grid.set_text(1, 0, Some("gone".into()));
        grid.set_text(2, 0, Some("b".into()));
        grid.merge(MergeRange::new(2, 0, 2, 1)).unwrap();
        grid.delete_row(1);
        assert_eq!(grid.text(1, 0), Some("b"));
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.merges(), &[MergeRange::new(1, 0, 1, 1)]);
    }

    #[test]
    fn overlapping_merge_is_rejected() {
        let mut grid = SheetGrid::new("s");
        grid.set_text(3, 3, None);
        grid.merge(MergeRange::new(0, 0, 1, 1)).unwrap();
        let err = grid.merge(MergeRange::new(1, 1, 2, 2)).unwrap_err();
        assert!(matches!(err, RenderError::OverlappingMerge { .. }));
    }

    #[test]
    fn styling_outside_the_sheet_fails() {
        let mut grid = SheetGrid::new("s");
        grid.set_text(1, 1, Some("x".into()));
        let err = grid.style_range(0, 0, 4, 0, |s| s.bold = true).unwrap_err();
        assert_eq!(
            err,
            RenderError::OutOfBounds {
                sheet: "s".into(),
                row: 4,
                col: 0
            }
        );
    }
}
