//! # sheetfill-core
//!
//! Core building blocks for the sheetfill template engine.
//!
//! This crate has no knowledge of the package format. It provides:
//! - [`CellRef`] and [`RangeRef`] - A1 reference algebra (1-based columns and rows)
//! - [`extract_placeholders`] - the `${[type:]name[.key][:subtype]}` grammar
//! - [`SharedStrings`] - the interned string pool cells refer to
//! - [`TemplateValue`] - the values placeholders are substituted with
//!
//! ## Example
//!
//! ```rust
//! use sheetfill_core::{extract_placeholders, CellRef, TemplateValue};
//!
//! let tokens = extract_placeholders("Hello ${name}");
//! assert_eq!(tokens[0].name, "name");
//! assert!(!tokens[0].full);
//!
//! let cell = CellRef::parse("AA10").unwrap();
//! assert_eq!(cell.col, 27);
//!
//! let value = TemplateValue::list(vec![1, 2, 3]);
//! assert_eq!(value.as_list().map(|l| l.len()), Some(3));
//! ```

pub mod error;
pub mod placeholder;
pub mod reference;
pub mod shared_strings;
pub mod value;

pub use error::{Error, Result};
pub use placeholder::{extract_placeholders, Placeholder, PlaceholderKind};
pub use reference::{col_to_num, is_range, num_to_col, within, CellRef, RangeRef};
pub use shared_strings::SharedStrings;
pub use value::{
    date_serial, format_number, lookup, ImageSource, Substitutions, TemplateValue,
    EPOCH_OFFSET_DAYS,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
