//! Structural fix-up after inserting columns or rows
//!
//! Inserted cells never move existing cells themselves; the engine renumbers
//! those while streaming rows. What this module keeps consistent is everything
//! that refers to cells by address: merged regions, defined names, table
//! ranges and manual row breaks.

use sheetfill_core::{is_range, CellRef, RangeRef};

use crate::table::TablePart;
use crate::xml::Element;

/// A defined name that refers to a cell or range
struct NameRef {
    range: RangeRef,
    is_range: bool,
}

impl NameRef {
    fn parse(element: &Element) -> Option<Self> {
        let text = element.text();
        match RangeRef::parse(&text) {
            Ok(range) => Some(Self {
                range,
                is_range: is_range(&text),
            }),
            Err(_) => {
                log::warn!(
                    "defined name '{}' is not a reference: {}",
                    element.attr("name").unwrap_or_default(),
                    text
                );
                None
            }
        }
    }

    fn write(&self, element: &mut Element) {
        if self.is_range {
            element.set_text(self.range.to_a1_string());
        } else {
            element.set_text(self.range.start.to_a1_string());
        }
    }
}

fn merge_ranges(sheet: &Element) -> Vec<RangeRef> {
    sheet
        .child("mergeCells")
        .into_iter()
        .flat_map(|m| m.children_named("mergeCell"))
        .filter_map(|m| m.attr("ref"))
        .filter_map(|r| RangeRef::parse(r).ok())
        .collect()
}

/// The merged region containing a cell, if any
pub fn merge_containing(sheet: &Element, cell: &CellRef) -> Option<RangeRef> {
    merge_ranges(sheet).into_iter().find(|m| m.contains(cell))
}

/// Shift merged regions and defined names that start on `anchor`'s row, right of it
///
/// Regions that only partially lie right of the anchor move as a whole.
pub fn shift_right<'a, I>(sheet: &mut Element, names: I, anchor: &CellRef, cols: i32)
where
    I: IntoIterator<Item = &'a mut Element>,
{
    if cols == 0 {
        return;
    }
    let cols = cols as i64;
    let to_the_right = |range: &RangeRef| range.start.row == anchor.row && range.start.col > anchor.col;

    if let Some(merges) = sheet.child_mut("mergeCells") {
        for merge in merges.children_named_mut("mergeCell") {
            let Some(range) = merge.attr("ref").and_then(|r| RangeRef::parse(r).ok()) else {
                continue;
            };
            if to_the_right(&range) {
                merge.set_attr("ref", range.offset(cols, 0).to_a1_string());
            }
        }
    }

    for name in names {
        let Some(mut name_ref) = NameRef::parse(name) else {
            continue;
        };
        if to_the_right(&name_ref.range) {
            name_ref.range = name_ref.range.offset(cols, 0);
            name_ref.write(name);
        }
    }
}

/// Parameters of a downward shift
#[derive(Debug, Clone, Copy)]
pub struct RowShift<'s> {
    /// Row that was expanded (final numbering)
    pub anchor_row: u32,
    /// Number of rows generated below it
    pub rows: u32,
    /// Also move range ends and manual row breaks below the anchor
    pub push_down_page_breaks: bool,
    /// Name of the sheet being processed, for matching name qualifiers
    pub sheet_name: &'s str,
}

/// Shift everything below an expanded row down by the number of generated rows
///
/// Merged regions that start exactly on the anchor row are cloned once per
/// generated row.
pub fn shift_down<'a, I>(sheet: &mut Element, tables: &mut [TablePart], names: I, shift: &RowShift<'_>)
where
    I: IntoIterator<Item = &'a mut Element>,
{
    if shift.rows == 0 {
        return;
    }
    let anchor = shift.anchor_row;
    let rows = shift.rows as i64;

    if let Some(merges) = sheet.child_mut("mergeCells") {
        let mut clones = Vec::new();
        for merge in merges.children_named_mut("mergeCell") {
            let Some(range) = merge.attr("ref").and_then(|r| RangeRef::parse(r).ok()) else {
                continue;
            };
            if range.start.row > anchor {
                merge.set_attr("ref", range.offset(0, rows).to_a1_string());
            } else if range.start.row == anchor {
                for k in 1..=rows {
                    clones.push(merge.shallow_clone().with_attr("ref", range.offset(0, k).to_a1_string()));
                }
            }
        }
        for clone in clones {
            merges.push(clone);
        }
        let count = merges.count_named("mergeCell");
        merges.set_attr("count", count.to_string());
    }

    for table in tables.iter_mut() {
        let Some(range) = table.range() else {
            continue;
        };
        if range.start.row > anchor {
            table.set_range(&range.offset(0, rows));
        }
    }

    for name in names {
        let Some(mut name_ref) = NameRef::parse(name) else {
            continue;
        };
        let range = name_ref.range.clone();
        if range.start.row > anchor {
            name_ref.range = range.offset(0, rows);
            name_ref.write(name);
        } else if shift.push_down_page_breaks
            && range.end.row > anchor
            && range.start.sheet_name().as_deref() == Some(shift.sheet_name)
        {
            name_ref.range.end = range.end.offset(0, rows);
            name_ref.write(name);
        }
    }

    if shift.push_down_page_breaks {
        if let Some(breaks) = sheet.child_mut("rowBreaks") {
            for brk in breaks.children_named_mut("brk") {
                let Some(id) = brk.attr("id").and_then(|id| id.parse::<u32>().ok()) else {
                    continue;
                };
                if id > anchor {
                    brk.set_attr("id", (id + shift.rows).to_string());
                }
            }
        }
    }
}
