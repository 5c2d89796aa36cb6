//! # sheetfill
//!
//! Fill XLSX templates with data.
//!
//! Templates are ordinary workbooks with `${...}` placeholders in their cells:
//!
//! - `${name}` and `${name.key}` are replaced by a value. A list bound to a
//!   placeholder that fills the whole cell expands to the right, one cell per item.
//! - `${table:rows.key}` expands downwards, one row per list element, reading
//!   `key` from each element.
//! - `${image:logo}` and `${table:rows.photo:image}` embed pictures.
//!
//! Merged regions, defined names, table ranges, row breaks and image anchors
//! follow the rows and columns that expansion inserts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetfill::prelude::*;
//!
//! let mut template = Template::open("template.xlsx")?;
//!
//! let mut values = Substitutions::new();
//! values.insert("name".into(), "World".into());
//! values.insert(
//!     "rows".into(),
//!     TemplateValue::list(vec![
//!         TemplateValue::map([("name", "a")]),
//!         TemplateValue::map([("name", "b")]),
//!     ]),
//! );
//!
//! template.substitute("Sheet1", &values)?;
//! template.save("output.xlsx")?;
//! # Ok::<(), XlsxError>(())
//! ```

pub mod prelude;

// Re-export core types
pub use sheetfill_core::{
    col_to_num, date_serial, extract_placeholders, is_range, lookup, num_to_col, within, CellRef,
    Error, ImageSource, Placeholder, PlaceholderKind, RangeRef, Result, SharedStrings,
    Substitutions, TemplateValue, EPOCH_OFFSET_DAYS,
};

// Re-export the engine
pub use sheetfill_xlsx::{
    ImageErrorHook, Package, SheetInfo, SheetSelector, Template, TemplateOptions, XlsxError,
    XlsxResult,
};

/// Lower-level access to package parts and structural fix-up
pub use sheetfill_xlsx as xlsx;
