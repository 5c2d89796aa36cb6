//! Substitution options

use std::fmt;
use std::path::PathBuf;

use sheetfill_core::ImageSource;

use crate::error::XlsxError;

/// Callback invoked instead of failing when an image cannot be decoded
pub type ImageErrorHook = Box<dyn Fn(&ImageSource, &XlsxError) + Send + Sync>;

/// Options controlling a substitution pass
///
/// ```rust
/// use sheetfill_xlsx::TemplateOptions;
///
/// let options = TemplateOptions {
///     move_images: true,
///     image_ratio: 50,
///     ..Default::default()
/// };
/// assert_eq!(options.effective_image_ratio(), 50);
/// ```
pub struct TemplateOptions {
    /// Move images anchored below an expanded table row down with the new rows
    pub move_images: bool,
    /// Also move images anchored on the expanded row itself
    pub move_same_line_images: bool,
    /// Image scale in percent; values <= 0 mean 100
    pub image_ratio: i32,
    /// Copy non-placeholder cells of an expanded table row into every generated row
    pub substitute_all_table_rows: bool,
    /// Move range ends and manual row breaks below expanded table rows
    pub push_down_page_breaks: bool,
    /// Base directory for relative image paths
    pub image_root_path: Option<PathBuf>,
    /// Called with the source and error when an image fails to decode; the image is skipped
    pub image_error_handler: Option<ImageErrorHook>,
    /// Fail instead of skipping images on sheets whose relationships part is unreadable
    pub strict_relationships: bool,
}

impl TemplateOptions {
    /// Image ratio with non-positive values normalized to 100
    pub fn effective_image_ratio(&self) -> i32 {
        if self.image_ratio <= 0 {
            100
        } else {
            self.image_ratio
        }
    }

    /// Set the image error hook
    pub fn with_image_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ImageSource, &XlsxError) + Send + Sync + 'static,
    {
        self.image_error_handler = Some(Box::new(handler));
        self
    }
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            move_images: false,
            move_same_line_images: false,
            image_ratio: 100,
            substitute_all_table_rows: false,
            push_down_page_breaks: false,
            image_root_path: None,
            image_error_handler: None,
            strict_relationships: false,
        }
    }
}

impl fmt::Debug for TemplateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateOptions")
            .field("move_images", &self.move_images)
            .field("move_same_line_images", &self.move_same_line_images)
            .field("image_ratio", &self.image_ratio)
            .field("substitute_all_table_rows", &self.substitute_all_table_rows)
            .field("push_down_page_breaks", &self.push_down_page_breaks)
            .field("image_root_path", &self.image_root_path)
            .field(
                "image_error_handler",
                &self.image_error_handler.as_ref().map(|_| "<fn>"),
            )
            .field("strict_relationships", &self.strict_relationships)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TemplateOptions::default();
        assert_eq!(options.image_ratio, 100);
        assert!(!options.move_images);
        assert!(options.image_error_handler.is_none());
    }

    #[test]
    fn test_ratio_normalization() {
        let options = TemplateOptions {
            image_ratio: -5,
            ..Default::default()
        };
        assert_eq!(options.effective_image_ratio(), 100);
    }

    #[test]
    fn test_debug_hides_hook() {
        let options = TemplateOptions::default().with_image_error_handler(|_, _| {});
        let printed = format!("{:?}", options);
        assert!(printed.contains("image_error_handler: Some(\"<fn>\")"));
    }
}
