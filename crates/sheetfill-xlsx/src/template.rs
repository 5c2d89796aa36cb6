//! The substitution engine
//!
//! A [`Template`] owns one package session: the archive, the workbook part, the
//! shared string table and the content types. Each [`Template::substitute`]
//! call runs one pass over one sheet and commits the touched parts back into
//! the package.
//!
//! A pass streams the sheet's rows in document order. Every row is renumbered
//! by the rows generated above it, and every cell by the columns generated to
//! its left on the same row. Whatever refers to cells by address (merged
//! regions, defined names, tables, row breaks, image anchors) is kept in step
//! by [`crate::fixup`] as insertions happen.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sheetfill_core::{
    date_serial, extract_placeholders, format_number, lookup, CellRef, Placeholder,
    PlaceholderKind, RangeRef, SharedStrings, Substitutions, TemplateValue,
};

use crate::content_types::{ContentTypes, CT_RELATIONSHIPS};
use crate::drawing::DrawingPart;
use crate::error::{XlsxError, XlsxResult};
use crate::fixup::{self, RowShift};
use crate::media::{self, ImageData};
use crate::options::TemplateOptions;
use crate::package::Package;
use crate::shared_strings::SharedStringsPart;
use crate::sheet::{self, SheetPart};
use crate::table::TablePart;
use crate::workbook::{SheetSelector, WorkbookPart};
use crate::xml::Element;

/// Characters kept verbatim when re-encoding hyperlink targets (URI semantics)
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

static EMPTY: TemplateValue = TemplateValue::Empty;

/// A template package being filled in
///
/// # Example
///
/// ```rust,no_run
/// use sheetfill_core::{Substitutions, TemplateValue};
/// use sheetfill_xlsx::Template;
///
/// let mut template = Template::open("report-template.xlsx")?;
/// let mut values = Substitutions::new();
/// values.insert("title".into(), "Quarterly report".into());
/// values.insert("items".into(), TemplateValue::list(vec![1, 2, 3]));
///
/// template.substitute("Summary", &values)?;
/// template.save("report.xlsx")?;
/// # Ok::<(), sheetfill_xlsx::XlsxError>(())
/// ```
#[derive(Debug)]
pub struct Template {
    package: Package,
    workbook: WorkbookPart,
    shared_strings: SharedStringsPart,
    content_types: ContentTypes,
    options: TemplateOptions,
}

impl Template {
    /// Open a template from raw package bytes
    pub fn from_bytes(bytes: &[u8]) -> XlsxResult<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Open a template file
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        Self::from_package(Package::read_file(path)?)
    }

    fn from_package(package: Package) -> XlsxResult<Self> {
        let workbook = WorkbookPart::load(&package)?;
        let shared_strings = SharedStringsPart::load(&package, workbook.shared_strings_path())?;
        let content_types = ContentTypes::load(&package)?;
        Ok(Self {
            package,
            workbook,
            shared_strings,
            content_types,
            options: TemplateOptions::default(),
        })
    }

    /// Replace the substitution options
    pub fn with_options(mut self, options: TemplateOptions) -> Self {
        self.options = options;
        self
    }

    /// Current substitution options
    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheets().iter().map(|s| s.name.as_str()).collect()
    }

    /// Every placeholder found in the shared string table
    pub fn placeholders(&self) -> Vec<Placeholder> {
        self.shared_strings
            .table
            .iter()
            .flat_map(extract_placeholders)
            .collect()
    }

    /// The shared string table of this session
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings.table
    }

    /// Run one substitution pass over a sheet
    ///
    /// A failed pass leaves the session as it was before the call.
    pub fn substitute<S: Into<SheetSelector>>(
        &mut self,
        sheet: S,
        values: &Substitutions,
    ) -> XlsxResult<()> {
        let selector = sheet.into();
        let info = self.workbook.find_sheet(&selector)?.clone();
        log::debug!("substituting sheet '{}' ({})", info.name, info.path);

        let sheet = SheetPart::load(&self.package, &info)?;
        let tables = TablePart::load_for_sheet(&self.package, &sheet)?;
        let drawing = DrawingPart::load(&self.package, &sheet)?;

        let snapshot = Snapshot {
            package: self.package.clone(),
            workbook: self.workbook.clone(),
            shared_strings: self.shared_strings.clone(),
            content_types: self.content_types.clone(),
        };

        let result = SheetPass {
            sheet,
            tables,
            drawing,
            strings: &mut self.shared_strings.table,
            workbook: &mut self.workbook,
            package: &mut self.package,
            content_types: &mut self.content_types,
            options: &self.options,
            values,
            rows: Vec::new(),
            original_heights: BTreeMap::new(),
            rows_inserted: 0,
            max_cols_inserted: 0,
        }
        .run();

        let result = result.and_then(|()| self.commit());
        if result.is_err() {
            log::debug!("pass over sheet '{}' failed; discarding its changes", info.name);
            self.restore(snapshot);
        }
        result
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.package = snapshot.package;
        self.workbook = snapshot.workbook;
        self.shared_strings = snapshot.shared_strings;
        self.content_types = snapshot.content_types;
    }

    /// Run a substitution pass over every sheet, in workbook order
    pub fn substitute_all(&mut self, values: &Substitutions) -> XlsxResult<()> {
        let names: Vec<String> = self
            .workbook
            .sheets()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        for name in names {
            self.substitute(SheetSelector::Name(name), values)?;
        }
        Ok(())
    }

    fn commit(&mut self) -> XlsxResult<()> {
        self.shared_strings
            .save(&mut self.package, &mut self.workbook.rels, &mut self.content_types)?;
        self.workbook
            .invalidate_calc_chain(&mut self.package, &mut self.content_types);
        self.workbook.save(&mut self.package)?;
        self.content_types.save(&mut self.package)
    }

    /// Serialize the package
    pub fn generate(&self) -> XlsxResult<Vec<u8>> {
        self.package.to_bytes()
    }

    /// Write the package to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        self.package.write(file)
    }
}

/// Session state taken before a pass
struct Snapshot {
    package: Package,
    workbook: WorkbookPart,
    shared_strings: SharedStringsPart,
    content_types: ContentTypes,
}

/// Per-row accumulator
#[derive(Debug, Default)]
struct RowState {
    /// Cells of the row in final form
    cells: Vec<Element>,
    /// Net cells added on this row (negative when an empty array removed one)
    cells_inserted: i32,
    /// Rows generated by table placeholders, shared by sibling placeholders
    new_rows: Vec<Element>,
    /// Columns holding table placeholders
    table_cols: Vec<u32>,
}

/// One substitution pass over one sheet
struct SheetPass<'t> {
    sheet: SheetPart,
    tables: Vec<TablePart>,
    drawing: Option<DrawingPart>,
    strings: &'t mut SharedStrings,
    workbook: &'t mut WorkbookPart,
    package: &'t mut Package,
    content_types: &'t mut ContentTypes,
    options: &'t TemplateOptions,
    values: &'t Substitutions,
    /// Rows already committed, in final numbering
    rows: Vec<Element>,
    /// Row heights of the source sheet by original row number
    original_heights: BTreeMap<u32, f64>,
    rows_inserted: u32,
    max_cols_inserted: i32,
}

impl<'t> SheetPass<'t> {
    fn run(mut self) -> XlsxResult<()> {
        let source_rows = match self.sheet.doc.root.child_mut("sheetData") {
            Some(data) => data.take_elements(),
            None => Vec::new(),
        };
        self.original_heights = source_rows
            .iter()
            .filter_map(|row| {
                let r = row.attr("r")?.parse::<u32>().ok()?;
                Some((r, sheet::row_height(row)?))
            })
            .collect();

        let mut previous = 0;
        for row in source_rows {
            previous = self.process_row(row, previous)?;
        }
        self.finish()
    }

    /// Process one source row; returns its original number
    fn process_row(&mut self, mut row: Element, previous: u32) -> XlsxResult<u32> {
        let original = row
            .attr("r")
            .and_then(|r| r.parse::<u32>().ok())
            .unwrap_or(previous + 1);
        let r = original + self.rows_inserted;
        row.set_attr("r", r.to_string());
        let anchors_before = self.drawing.as_ref().map_or(0, DrawingPart::anchor_count);

        let mut state = RowState::default();
        let mut last_col = 0;
        for cell in row.take_elements() {
            if cell.name != "c" {
                state.cells.push(cell);
                continue;
            }
            let original_col = cell
                .attr("r")
                .and_then(|a| CellRef::parse(a).ok())
                .map_or(last_col + 1, |c| c.col);
            last_col = original_col;
            let col = (original_col as i64 + state.cells_inserted as i64).max(1) as u32;
            self.process_cell(cell, CellRef::new(col, r), &row, &mut state)?;
        }

        state.cells.sort_by_key(cell_col);
        if self.options.substitute_all_table_rows {
            replicate_cells(&state.cells, &state.table_cols, &mut state.new_rows);
        }
        for cell in state.cells {
            row.push(cell);
        }
        if state.cells_inserted != 0 {
            widen_spans(&mut row, state.cells_inserted);
            self.max_cols_inserted = self.max_cols_inserted.max(state.cells_inserted);
        }
        self.rows.push(row);

        if state.new_rows.is_empty() {
            return Ok(original);
        }

        let count = state.new_rows.len() as u32;
        for mut new_row in state.new_rows {
            sort_cells(&mut new_row);
            self.rows.push(new_row);
        }

        let shift = RowShift {
            anchor_row: r,
            rows: count,
            push_down_page_breaks: self.options.push_down_page_breaks,
            sheet_name: &self.sheet.name,
        };
        fixup::shift_down(
            &mut self.sheet.doc.root,
            &mut self.tables,
            self.workbook.defined_names_mut(),
            &shift,
        );
        self.rows_inserted += count;

        if self.options.move_images {
            if let Some(drawing) = self.drawing.as_mut() {
                drawing.move_anchors(r, count, self.options.move_same_line_images, anchors_before);
            }
        }
        log::debug!("row {} of '{}' expanded into {} extra rows", r, self.sheet.name, count);

        Ok(original)
    }

    fn process_cell(
        &mut self,
        mut cell: Element,
        cref: CellRef,
        row: &Element,
        state: &mut RowState,
    ) -> XlsxResult<()> {
        cell.set_attr("r", cref.to_a1_string());

        let index = match cell.attr("t") {
            Some("s") => cell
                .child("v")
                .and_then(|v| v.text().trim().parse::<usize>().ok()),
            _ => None,
        };
        let Some(index) = index else {
            state.cells.push(cell);
            return Ok(());
        };
        let Some(text) = self.strings.get(index).map(str::to_string) else {
            log::debug!("cell {} refers to missing shared string {}", cref, index);
            state.cells.push(cell);
            return Ok(());
        };

        let tokens = extract_placeholders(&text);
        if tokens.is_empty() {
            state.cells.push(cell);
            return Ok(());
        }

        let values: &'t Substitutions = self.values;
        let mut string = text.clone();
        let mut partial = false;
        let mut append = true;

        for token in &tokens {
            log::trace!("cell {}: {} ({})", cref, token.text, token.kind);
            match (&token.kind, lookup(values, &token.name)) {
                (PlaceholderKind::Table, Some(TemplateValue::List(items))) if token.full => {
                    if token.is_image_subtype() {
                        self.ensure_drawing()?;
                    }
                    state.table_cols.push(cref.col);
                    if let Some(TemplateValue::List(_)) = items.first().map(|first| field(first, token)) {
                        append = false;
                    }
                    let inserted = self.expand_table(&mut cell, &cref, token, items, row, state)?;
                    if inserted != 0 {
                        state.cells_inserted += inserted;
                        self.shift_right(&cref, inserted);
                    }
                }
                (PlaceholderKind::Normal, Some(TemplateValue::List(items))) if token.full => {
                    append = false;
                    let inserted = expand_array(self.strings, &cell, &cref, items, &mut state.cells);
                    if inserted != 0 {
                        state.cells_inserted += inserted;
                        self.shift_right(&cref, inserted);
                    }
                }
                (PlaceholderKind::Image, _) if token.full => {
                    let value = lookup(values, &token.path()).unwrap_or(&EMPTY);
                    self.place_image(&mut cell, &cref, value)?;
                }
                _ => {
                    let value = lookup(values, &token.path()).unwrap_or(&EMPTY);
                    if token.full {
                        insert_value(&mut cell, value, self.strings);
                    } else {
                        string = string.replace(&token.text, &value.to_text());
                        partial = true;
                    }
                }
            }
        }

        if partial {
            insert_text(&mut cell, &string, self.strings);
        }
        if append {
            state.cells.push(cell);
        }
        Ok(())
    }

    /// Vertical expansion of a table placeholder; returns net cells added on the anchor row
    fn expand_table(
        &mut self,
        cell: &mut Element,
        cref: &CellRef,
        token: &Placeholder,
        items: &'t [TemplateValue],
        row: &Element,
        state: &mut RowState,
    ) -> XlsxResult<i32> {
        if items.is_empty() {
            cell.remove_attr("t");
            cell.children.clear();
            return Ok(0);
        }

        let template = cell.clone();
        let parents: Vec<usize> = self
            .tables
            .iter()
            .enumerate()
            .filter(|(_, table)| table.range().map_or(false, |range| range.contains(cref)))
            .map(|(i, _)| i)
            .collect();

        let mut inserted = 0;
        for (idx, element) in items.iter().enumerate() {
            let value = field(element, token);

            if idx == 0 {
                match value {
                    TemplateValue::List(list) => {
                        inserted = expand_array(self.strings, &template, cref, list, &mut state.cells);
                    }
                    v if token.is_image_subtype() && !v.is_empty() => {
                        self.place_image(cell, cref, v)?;
                    }
                    v => insert_value(cell, v, self.strings),
                }
                continue;
            }

            if idx > state.new_rows.len() {
                let mut new_row = row.shallow_clone();
                new_row.set_attr("r", (cref.row + state.new_rows.len() as u32 + 1).to_string());
                state.new_rows.push(new_row);
            }
            let new_ref = cref.with_row(cref.row + idx as u32);
            let mut new_cell = template.clone();
            new_cell.set_attr("r", new_ref.to_a1_string());

            match value {
                TemplateValue::List(list) => {
                    let mut cells = Vec::new();
                    let added = expand_array(self.strings, &new_cell, &new_ref, list, &mut cells);
                    let target = &mut state.new_rows[idx - 1];
                    for c in cells {
                        target.push(c);
                    }
                    if added != 0 {
                        widen_spans(target, added);
                    }
                }
                v if token.is_image_subtype() && !v.is_empty() => {
                    self.place_image(&mut new_cell, &new_ref, v)?;
                    state.new_rows[idx - 1].push(new_cell);
                }
                v => {
                    insert_value(&mut new_cell, v, self.strings);
                    state.new_rows[idx - 1].push(new_cell);
                }
            }

            for &t in &parents {
                let table = &mut self.tables[t];
                let Some(range) = table.range() else {
                    continue;
                };
                if !range.contains(&new_ref) {
                    log::trace!("extending table {:?} past row {}", table.name(), range.end.row);
                    table.set_range(&RangeRef::new(range.start.clone(), range.end.next_row()));
                }
            }
        }
        Ok(inserted)
    }

    fn shift_right(&mut self, anchor: &CellRef, cols: i32) {
        fixup::shift_right(
            &mut self.sheet.doc.root,
            self.workbook.defined_names_mut(),
            anchor,
            cols,
        );
    }

    /// Make sure the sheet has a drawing part; false when it cannot have one
    fn ensure_drawing(&mut self) -> XlsxResult<bool> {
        if self.drawing.is_some() {
            return Ok(true);
        }
        if self.sheet.acquire_rels(self.package).is_none() {
            if self.options.strict_relationships {
                return Err(XlsxError::MissingRelationships(self.sheet.name.clone()));
            }
            log::warn!(
                "sheet '{}' has no usable relationships part; images are skipped",
                self.sheet.name
            );
            return Ok(false);
        }
        self.content_types.ensure_default("rels", CT_RELATIONSHIPS);
        self.drawing = Some(DrawingPart::create(
            self.package,
            &mut self.sheet,
            self.content_types,
        )?);
        Ok(true)
    }

    /// Embed an image at a cell, clearing the cell's text
    fn place_image(&mut self, cell: &mut Element, cref: &CellRef, value: &TemplateValue) -> XlsxResult<()> {
        insert_value(cell, &EMPTY, self.strings);

        let options: &'t TemplateOptions = self.options;
        let root = options.image_root_path.as_deref();
        let Some(source) = media::source_from_value(value, root) else {
            return Ok(());
        };
        if !self.ensure_drawing()? {
            return Ok(());
        }

        let image = match ImageData::load(&source, root) {
            Ok(image) => image,
            Err(err) => match &options.image_error_handler {
                Some(hook) => {
                    log::warn!("skipping image at {}: {}", cref, err);
                    hook(&source, &err);
                    return Ok(());
                }
                None => return Err(err),
            },
        };

        let extent = match fixup::merge_containing(&self.sheet.doc.root, cref) {
            Some(merge) => media::fit_to_merge(
                image.extent(100),
                &merge,
                |c| self.sheet.column_width(c),
                |r| self.row_height(r),
            ),
            None => image.extent(options.effective_image_ratio()),
        };

        let Some(drawing) = self.drawing.as_mut() else {
            return Ok(());
        };
        let rel_id = drawing.embed(self.package, self.content_types, &image)?;
        drawing.add_picture(cref.zero_based(), extent, &rel_id);
        log::trace!("embedded {}x{} image at {}", image.width, image.height, cref);
        Ok(())
    }

    /// Height in points of a row in final numbering
    fn row_height(&self, r: u32) -> f64 {
        let emitted = self
            .rows
            .iter()
            .rev()
            .find(|row| row.attr("r").and_then(|v| v.parse::<u32>().ok()) == Some(r));
        let height = match emitted {
            Some(row) => sheet::row_height(row),
            None => r
                .checked_sub(self.rows_inserted)
                .and_then(|original| self.original_heights.get(&original).copied()),
        };
        height.unwrap_or_else(|| self.sheet.default_row_height())
    }

    fn finish(mut self) -> XlsxResult<()> {
        let rows = std::mem::take(&mut self.rows);
        if let Some(data) = self.sheet.doc.root.child_mut("sheetData") {
            for row in rows {
                data.push(row);
            }
        }

        self.update_dimension();
        invalidate_formulas(&mut self.sheet.doc.root);
        self.substitute_hyperlinks();
        self.substitute_table_headers();

        self.sheet.save(self.package)?;
        for table in &self.tables {
            table.save(self.package)?;
        }
        if let Some(drawing) = &self.drawing {
            drawing.save(self.package)?;
        }

        log::debug!(
            "sheet '{}' done: {} rows inserted, up to {} columns inserted",
            self.sheet.name,
            self.rows_inserted,
            self.max_cols_inserted
        );
        Ok(())
    }

    fn update_dimension(&mut self) {
        if self.rows_inserted == 0 && self.max_cols_inserted == 0 {
            return;
        }
        let Some(dimension) = self.sheet.doc.root.child_mut("dimension") else {
            return;
        };
        let Some(range) = dimension.attr("ref").and_then(|r| RangeRef::parse(r).ok()) else {
            return;
        };
        let end = range
            .end
            .offset(self.max_cols_inserted as i64, self.rows_inserted as i64);
        dimension.set_attr("ref", RangeRef::new(range.start, end).to_a1_string());
    }

    fn substitute_hyperlinks(&mut self) {
        let values = self.values;
        let Some(rels) = self.sheet.rels.as_mut() else {
            return;
        };
        for rel in rels.doc.root.children_named_mut("Relationship") {
            if !rel.attr("Type").map_or(false, |t| t.ends_with("/hyperlink")) {
                continue;
            }
            let Some(target) = rel.attr("Target") else {
                continue;
            };
            let decoded = percent_decode_str(target).decode_utf8_lossy().into_owned();
            let replaced = replace_placeholders(&decoded, values);
            if replaced != decoded {
                rel.set_attr("Target", utf8_percent_encode(&replaced, URI_ENCODE_SET).to_string());
            }
        }
    }

    fn substitute_table_headers(&mut self) {
        let values = self.values;
        for table in &mut self.tables {
            for column in table.columns_mut() {
                let Some(name) = column.attr("name") else {
                    continue;
                };
                let replaced = replace_placeholders(name, values);
                if replaced != name {
                    column.set_attr("name", replaced);
                }
            }
        }
    }
}

/// The value a table placeholder reads from one list element
fn field<'v>(element: &'v TemplateValue, token: &Placeholder) -> &'v TemplateValue {
    match &token.key {
        Some(key) => element.get(key).unwrap_or(&EMPTY),
        None => element,
    }
}

/// Horizontal expansion: one cell per item, starting at `cref`; returns net cells added
fn expand_array(
    strings: &mut SharedStrings,
    template: &Element,
    cref: &CellRef,
    items: &[TemplateValue],
    out: &mut Vec<Element>,
) -> i32 {
    for (i, item) in items.iter().enumerate() {
        let mut cell = template.clone();
        cell.set_attr("r", cref.offset(i as i64, 0).to_a1_string());
        insert_value(&mut cell, item, strings);
        out.push(cell);
    }
    items.len() as i32 - 1
}

/// Write a typed value into a cell
fn insert_value(cell: &mut Element, value: &TemplateValue, strings: &mut SharedStrings) {
    if let Some(formula) = value.formula() {
        cell.remove_attr("t");
        cell.remove_children_named("v");
        cell.remove_children_named("f");
        cell.insert(0, Element::new("f").with_text(formula));
        return;
    }
    match value {
        TemplateValue::Bool(b) => {
            cell.set_attr("t", "b");
            set_cell_value(cell, if *b { "1" } else { "0" });
        }
        TemplateValue::Number(n) => {
            cell.remove_attr("t");
            set_cell_value(cell, &format_number(*n));
        }
        TemplateValue::Date(d) => {
            cell.remove_attr("t");
            set_cell_value(cell, &format_number(date_serial(d)));
        }
        other => insert_text(cell, &other.to_text(), strings),
    }
}

fn insert_text(cell: &mut Element, text: &str, strings: &mut SharedStrings) {
    cell.set_attr("t", "s");
    let index = strings.index(text);
    set_cell_value(cell, &index.to_string());
}

fn set_cell_value(cell: &mut Element, text: &str) {
    match cell.child_mut("v") {
        Some(v) => v.set_text(text),
        None => cell.push(Element::new("v").with_text(text)),
    }
}

/// Substitute every placeholder in a string textually
fn replace_placeholders(text: &str, values: &Substitutions) -> String {
    let mut out = text.to_string();
    for token in extract_placeholders(text) {
        let value = lookup(values, &token.path()).map(TemplateValue::to_text).unwrap_or_default();
        out = out.replace(&token.text, &value);
    }
    out
}

fn cell_col(cell: &Element) -> u32 {
    if cell.name != "c" {
        return u32::MAX;
    }
    cell.attr("r")
        .and_then(|r| CellRef::parse(r).ok())
        .map_or(0, |c| c.col)
}

fn sort_cells(row: &mut Element) {
    let mut cells = row.take_elements();
    cells.sort_by_key(cell_col);
    for cell in cells {
        row.push(cell);
    }
}

/// Grow a row's `spans="a:b"` end by `n` columns
fn widen_spans(row: &mut Element, n: i32) {
    let updated = row.attr("spans").and_then(|spans| {
        let (start, end) = spans.split_once(':')?;
        let end: i64 = end.parse().ok()?;
        Some(format!("{}:{}", start, (end + n as i64).max(1)))
    });
    if let Some(updated) = updated {
        row.set_attr("spans", updated);
    }
}

/// Copy the anchor row's ordinary cells into generated rows that lack them
fn replicate_cells(cells: &[Element], table_cols: &[u32], new_rows: &mut [Element]) {
    for new_row in new_rows.iter_mut() {
        let Some(r) = new_row.attr("r").and_then(|r| r.parse::<u32>().ok()) else {
            continue;
        };
        let present: Vec<u32> = new_row.elements().map(cell_col).collect();
        for cell in cells.iter().filter(|c| c.name == "c") {
            let col = cell_col(cell);
            if table_cols.contains(&col) || present.contains(&col) {
                continue;
            }
            let mut copy = cell.clone();
            copy.set_attr("r", CellRef::new(col, r).to_a1_string());
            new_row.push(copy);
        }
    }
}

/// Drop cached values of every formula cell
fn invalidate_formulas(sheet: &mut Element) {
    let Some(data) = sheet.child_mut("sheetData") else {
        return;
    };
    for row in data.children_named_mut("row") {
        for cell in row.children_named_mut("c") {
            if cell.child("f").is_some() {
                cell.remove_children_named("v");
            }
        }
    }
}
