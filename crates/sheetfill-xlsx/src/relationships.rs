//! Relationship parts (`*.rels`)

use lazy_regex::regex_captures;

use crate::error::{XlsxError, XlsxResult};
use crate::package::Package;
use crate::xml::{Element, XmlDocument};

/// Namespace of relationship parts
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of a drawing part
pub const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
/// Relationship type of an embedded image
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
/// Relationship type of the shared strings part
pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

/// A parsed relationships part
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Part name of the `.rels` file
    pub path: String,
    /// Parsed content
    pub doc: XmlDocument,
}

impl Relationships {
    /// An empty relationships part
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            doc: XmlDocument::new(Element::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS)),
        }
    }

    /// Load a relationships part, if present
    pub fn load(package: &Package, path: &str) -> XlsxResult<Option<Self>> {
        Ok(package.xml(path)?.map(|doc| Self {
            path: path.to_string(),
            doc,
        }))
    }

    /// Write the part back into the package
    pub fn save(&self, package: &mut Package) -> XlsxResult<()> {
        package.set_xml(&self.path, &self.doc)
    }

    /// Iterate over `Relationship` elements
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.doc.root.children_named("Relationship")
    }

    /// Relationship element with the given id
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.iter().find(|r| r.attr("Id") == Some(id))
    }

    /// Mutable relationship element with the given id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.doc
            .root
            .children_named_mut("Relationship")
            .find(|r| r.attr("Id") == Some(id))
    }

    /// Target of the relationship with the given id
    pub fn target(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|r| r.attr("Target"))
    }

    /// First relationship whose type ends with `/{suffix}`
    pub fn find_by_type(&self, suffix: &str) -> Option<&Element> {
        let wanted = format!("/{}", suffix);
        self.iter()
            .find(|r| r.attr("Type").map_or(false, |t| t.ends_with(&wanted)))
    }

    /// Next free `rIdN` id (max existing N + 1)
    ///
    /// Fails when an existing id does not follow the `rIdN` pattern, since a
    /// guessed id could collide.
    pub fn next_id(&self) -> XlsxResult<String> {
        let mut max = 0u32;
        for rel in self.iter() {
            let id = rel.attr("Id").unwrap_or_default();
            let (_, digits) = regex_captures!(r"rId(\d+)", id)
                .ok_or_else(|| XlsxError::CannotDetermineId(self.path.clone()))?;
            let n: u32 = digits
                .parse()
                .map_err(|_| XlsxError::CannotDetermineId(self.path.clone()))?;
            max = max.max(n);
        }
        Ok(format!("rId{}", max + 1))
    }

    /// Append a relationship with a fresh id and return that id
    pub fn add(&mut self, rel_type: &str, target: &str) -> XlsxResult<String> {
        let id = self.next_id()?;
        self.doc.root.push(
            Element::new("Relationship")
                .with_attr("Id", id.as_str())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        );
        Ok(id)
    }

    /// Remove every relationship whose type ends with `/{suffix}`
    pub fn remove_by_type(&mut self, suffix: &str) -> usize {
        let before = self.doc.root.count_named("Relationship");
        let wanted = format!("/{}", suffix);
        self.doc.root.retain_elements(|e| {
            !(e.name == "Relationship" && e.attr("Type").map_or(false, |t| t.ends_with(&wanted)))
        });
        before - self.doc.root.count_named("Relationship")
    }
}
