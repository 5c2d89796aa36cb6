//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while loading, substituting or writing a template
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A part was not valid UTF-8
    #[error("Invalid UTF-8 in part: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// No sheet matches the requested name, id or position
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// An existing id does not follow the expected numbering pattern
    #[error("Cannot determine next id for {0}")]
    CannotDetermineId(String),

    /// Image bytes could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Base64 image data could not be decoded
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// An image placeholder needs sheet relationships that could not be read
    #[error("Sheet '{0}' has no usable relationships part for embedded images")]
    MissingRelationships(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheetfill_core::Error),
}
