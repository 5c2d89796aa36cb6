//! # sheetfill-xlsx
//!
//! XLSX template substitution for sheetfill.
//!
//! A template is an ordinary workbook whose shared strings contain
//! `${...}` placeholders. [`Template`] loads the package, substitutes one
//! sheet at a time and writes the package back, keeping merged regions,
//! defined names, tables, drawings and row breaks consistent with the
//! rows and columns that expansion inserts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sheetfill_core::{Substitutions, TemplateValue};
//! use sheetfill_xlsx::{Template, TemplateOptions};
//!
//! let options = TemplateOptions {
//!     move_images: true,
//!     ..Default::default()
//! };
//! let mut template = Template::open("invoice.xlsx")?.with_options(options);
//!
//! let mut values = Substitutions::new();
//! values.insert("customer".into(), "ACME".into());
//! values.insert(
//!     "lines".into(),
//!     TemplateValue::list(vec![
//!         TemplateValue::map([("item", TemplateValue::from("Bolts")), ("qty", 12.into())]),
//!         TemplateValue::map([("item", TemplateValue::from("Nuts")), ("qty", 30.into())]),
//!     ]),
//! );
//!
//! template.substitute(1u32, &values)?;
//! std::fs::write("invoice-filled.xlsx", template.generate()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod content_types;
pub mod drawing;
pub mod error;
pub mod fixup;
pub mod media;
pub mod options;
pub mod package;
pub mod relationships;
pub mod shared_strings;
pub mod sheet;
pub mod table;
pub mod template;
pub mod workbook;
pub mod xml;

pub use error::{XlsxError, XlsxResult};
pub use options::{ImageErrorHook, TemplateOptions};
pub use package::Package;
pub use template::Template;
pub use workbook::{SheetInfo, SheetSelector};
