//! `[Content_Types].xml`

use crate::error::XlsxResult;
use crate::package::Package;
use crate::xml::{Element, XmlDocument};

/// Part name of the content types part
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Content type of a drawing part
pub const CT_DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
/// Content type of relationship parts
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
/// Content type of the shared strings part
pub const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

/// Parsed content types part
#[derive(Debug, Clone)]
pub struct ContentTypes {
    doc: XmlDocument,
}

impl ContentTypes {
    /// Load the content types part
    pub fn load(package: &Package) -> XlsxResult<Self> {
        Ok(Self {
            doc: package.require_xml(CONTENT_TYPES_PART)?,
        })
    }

    /// Write the part back into the package
    pub fn save(&self, package: &mut Package) -> XlsxResult<()> {
        package.set_xml(CONTENT_TYPES_PART, &self.doc)
    }

    /// Check for a `Default` entry for a file extension (case-insensitive)
    pub fn has_default(&self, extension: &str) -> bool {
        self.doc.root.children_named("Default").any(|d| {
            d.attr("Extension")
                .map_or(false, |e| e.eq_ignore_ascii_case(extension))
        })
    }

    /// Add a `Default` entry unless one exists; returns whether it was added
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) -> bool {
        if self.has_default(extension) {
            return false;
        }
        // Defaults precede overrides
        let pos = self
            .doc
            .root
            .position_of("Override")
            .unwrap_or(self.doc.root.children.len());
        self.doc.root.insert(
            pos,
            Element::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type),
        );
        true
    }

    /// Check for an `Override` entry for a part (`/xl/...`)
    pub fn has_override(&self, part_name: &str) -> bool {
        self.doc
            .root
            .children_named("Override")
            .any(|o| o.attr("PartName") == Some(part_name))
    }

    /// Add an `Override` entry unless one exists
    pub fn ensure_override(&mut self, part_name: &str, content_type: &str) {
        if !self.has_override(part_name) {
            self.doc.root.push(
                Element::new("Override")
                    .with_attr("PartName", part_name)
                    .with_attr("ContentType", content_type),
            );
        }
    }

    /// Remove the `Override` entry for a part
    pub fn remove_override(&mut self, part_name: &str) {
        self.doc
            .root
            .retain_elements(|e| !(e.name == "Override" && e.attr("PartName") == Some(part_name)));
    }
}
