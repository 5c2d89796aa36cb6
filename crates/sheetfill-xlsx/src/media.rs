//! Image sources, probing and sizing
//!
//! Extents are expressed in EMUs (914400 per inch, 96 pixels per inch).

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use image::error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind};
use image::{ImageError, ImageFormat, ImageReader};
use sheetfill_core::{ImageSource, RangeRef, TemplateValue};

use crate::error::XlsxResult;

/// EMUs per inch
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Pixels per character of column width at the default font
pub const PIXELS_PER_CHAR: f64 = 7.625579987895905;

/// Convert pixels (96 dpi) to EMUs
pub fn pixels_to_emu(pixels: f64) -> i64 {
    (pixels * EMU_PER_INCH / 96.0).round() as i64
}

/// Convert a column width in characters to EMUs
pub fn col_width_to_emu(width: f64) -> i64 {
    pixels_to_emu(width * PIXELS_PER_CHAR)
}

/// Convert a row height in points to EMUs
pub fn row_height_to_emu(points: f64) -> i64 {
    (points / 72.0 * EMU_PER_INCH).round() as i64
}

/// The image source a template value denotes, if any
///
/// Text is a path when that file exists, otherwise base64. Empty values and
/// values of other kinds yield `None`.
pub fn source_from_value(value: &TemplateValue, root: Option<&Path>) -> Option<ImageSource> {
    match value {
        TemplateValue::Image(source) => Some(source.clone()),
        TemplateValue::Text(text) if !text.is_empty() => {
            if resolve_path(Path::new(text), root).is_file() {
                Some(ImageSource::Path(PathBuf::from(text)))
            } else {
                Some(ImageSource::Base64(text.clone()))
            }
        }
        _ => None,
    }
}

fn resolve_path(path: &Path, root: Option<&Path>) -> PathBuf {
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

/// Decoded image bytes with their detected format and pixel size
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Encoded bytes, embedded as-is
    pub bytes: Vec<u8>,
    /// Detected format
    pub format: ImageFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Read the bytes behind a source and probe them
    pub fn load(source: &ImageSource, root: Option<&Path>) -> XlsxResult<Self> {
        let bytes = match source {
            ImageSource::Bytes(bytes) => bytes.clone(),
            ImageSource::Base64(text) => {
                let payload = match text.split_once(";base64,") {
                    Some((prefix, data)) if prefix.starts_with("data:") => data,
                    _ => text.as_str(),
                };
                base64::engine::general_purpose::STANDARD.decode(payload.trim())?
            }
            ImageSource::Path(path) => std::fs::read(resolve_path(path, root))?,
        };
        Self::probe(bytes)
    }

    /// Detect format and dimensions of encoded image bytes
    pub fn probe(bytes: Vec<u8>) -> XlsxResult<Self> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            ImageError::Unsupported(UnsupportedError::from_format_and_kind(
                ImageFormatHint::Unknown,
                UnsupportedErrorKind::Format(ImageFormatHint::Unknown),
            ))
        })?;
        let (width, height) = reader.into_dimensions()?;
        Ok(Self {
            bytes,
            format,
            width,
            height,
        })
    }

    /// File extension for the media part
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    /// MIME type for the content-types default
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Natural extent in EMUs, scaled by a percentage
    pub fn extent(&self, ratio_percent: i32) -> (i64, i64) {
        let percent = if ratio_percent <= 0 { 100 } else { ratio_percent };
        let ratio = percent as f64 / 100.0;
        (
            (pixels_to_emu(self.width as f64) as f64 * ratio).floor() as i64,
            (pixels_to_emu(self.height as f64) as f64 * ratio).floor() as i64,
        )
    }
}

/// Scale an extent to fit a merged region, keeping its aspect ratio
///
/// `col_width` gives a 1-based column's width in characters and `row_height`
/// a row's height in points.
pub fn fit_to_merge<W, H>(extent: (i64, i64), merge: &RangeRef, col_width: W, row_height: H) -> (i64, i64)
where
    W: Fn(u32) -> f64,
    H: Fn(u32) -> f64,
{
    let merge_width: i64 = (merge.start.col..=merge.end.col)
        .map(|c| col_width_to_emu(col_width(c)))
        .sum();
    let merge_height: i64 = (merge.start.row..=merge.end.row)
        .map(|r| row_height_to_emu(row_height(r)))
        .sum();
    if merge_width <= 0 || merge_height <= 0 {
        return extent;
    }

    let width_rate = extent.0 as f64 / merge_width as f64;
    let height_rate = extent.1 as f64 / merge_height as f64;
    let rate = width_rate.max(height_rate);
    if rate <= 0.0 {
        return extent;
    }
    (
        (extent.0 as f64 / rate).floor() as i64,
        (extent.1 as f64 / rate).floor() as i64,
    )
}
