//! Prelude module - common imports for sheetfill users
//!
//! ```rust
//! use sheetfill::prelude::*;
//! ```

pub use crate::{
    // Values
    ImageSource,
    Substitutions,
    TemplateValue,

    // Engine
    SheetSelector,
    Template,
    TemplateOptions,

    // Errors
    XlsxError,
    XlsxResult,
};
