//! Worksheet part and its layout metrics

use crate::error::XlsxResult;
use crate::package::{rels_path_for, Package};
use crate::relationships::Relationships;
use crate::workbook::SheetInfo;
use crate::xml::{Element, Node, XmlDocument};

/// Column width used when neither `cols` nor `sheetFormatPr` give one
pub const DEFAULT_COL_WIDTH: f64 = 9.140625;

/// Row height in points used when neither the row nor `sheetFormatPr` give one
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Elements that must follow `<drawing>` in a worksheet
const AFTER_DRAWING: &[&str] = &[
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// A worksheet part plus its relationships
#[derive(Debug, Clone)]
pub struct SheetPart {
    /// Sheet name from the workbook
    pub name: String,
    /// Part name
    pub path: String,
    /// Parsed worksheet XML
    pub doc: XmlDocument,
    /// Sheet relationships, when the part has any
    pub rels: Option<Relationships>,
}

impl SheetPart {
    /// Load the worksheet described by a workbook entry
    pub fn load(package: &Package, info: &SheetInfo) -> XlsxResult<Self> {
        let doc = package.require_xml(&info.path)?;
        let rels_path = rels_path_for(&info.path);
        let rels = match Relationships::load(package, &rels_path) {
            Ok(rels) => rels,
            Err(err) => {
                log::warn!("sheet '{}': unreadable {}: {}", info.name, rels_path, err);
                None
            }
        };
        Ok(Self {
            name: info.name.clone(),
            path: info.path.clone(),
            doc,
            rels,
        })
    }

    /// Write the worksheet and its relationships back into the package
    pub fn save(&self, package: &mut Package) -> XlsxResult<()> {
        package.set_xml(&self.path, &self.doc)?;
        if let Some(rels) = &self.rels {
            rels.save(package)?;
        }
        Ok(())
    }

    /// The sheet's relationships, starting an empty part when the package has none
    ///
    /// `None` when a relationships part exists but could not be read; it is
    /// left untouched in the package.
    pub fn acquire_rels(&mut self, package: &Package) -> Option<&mut Relationships> {
        if self.rels.is_none() {
            let path = rels_path_for(&self.path);
            if package.contains(&path) {
                return None;
            }
            log::debug!("starting {} for sheet '{}'", path, self.name);
            self.rels = Some(Relationships::new(path));
        }
        self.rels.as_mut()
    }

    /// Relationship id of the sheet's `<drawing>` element
    pub fn drawing_rel_id(&self) -> Option<&str> {
        self.doc.root.child("drawing").and_then(|d| d.attr("r:id"))
    }

    /// Insert a `<drawing r:id>` element at its schema position
    pub fn attach_drawing(&mut self, rel_id: &str) {
        let root = &mut self.doc.root;
        let pos = root
            .children
            .iter()
            .position(|n| {
                matches!(n, Node::Element(e) if AFTER_DRAWING.contains(&e.name.as_str()))
            })
            .unwrap_or(root.children.len());
        root.insert(pos, Element::new("drawing").with_attr("r:id", rel_id));
    }

    /// Width of a 1-based column, in character units
    pub fn column_width(&self, col: u32) -> f64 {
        let explicit = self.doc.root.child("cols").and_then(|cols| {
            cols.children_named("col").find_map(|c| {
                let min: u32 = c.attr("min")?.parse().ok()?;
                let max: u32 = c.attr("max")?.parse().ok()?;
                if (min..=max).contains(&col) {
                    c.attr("width")?.parse::<f64>().ok()
                } else {
                    None
                }
            })
        });
        explicit.unwrap_or_else(|| self.format_attr("defaultColWidth").unwrap_or(DEFAULT_COL_WIDTH))
    }

    /// Default row height in points
    pub fn default_row_height(&self) -> f64 {
        self.format_attr("defaultRowHeight")
            .unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    fn format_attr(&self, name: &str) -> Option<f64> {
        self.doc
            .root
            .child("sheetFormatPr")
            .and_then(|f| f.attr(name))
            .and_then(|v| v.parse().ok())
    }
}

/// Height of a `<row>` element in points, when it declares one
pub fn row_height(row: &Element) -> Option<f64> {
    row.attr("ht").and_then(|h| h.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(xml: &str) -> SheetPart {
        SheetPart {
            name: "Sheet1".into(),
            path: "xl/worksheets/sheet1.xml".into(),
            doc: XmlDocument::parse(xml.as_bytes()).unwrap(),
            rels: None,
        }
    }

    #[test]
    fn test_column_width() {
        let s = sheet(
            r#"<worksheet><sheetFormatPr defaultColWidth="10"/><cols><col min="2" max="3" width="20" customWidth="1"/></cols><sheetData/></worksheet>"#,
        );
        assert_eq!(s.column_width(1), 10.0);
        assert_eq!(s.column_width(2), 20.0);
        assert_eq!(s.column_width(3), 20.0);
        assert_eq!(s.column_width(4), 10.0);

        let bare = sheet("<worksheet><sheetData/></worksheet>");
        assert_eq!(bare.column_width(1), DEFAULT_COL_WIDTH);
        assert_eq!(bare.default_row_height(), DEFAULT_ROW_HEIGHT);
    }

    #[test]
    fn test_attach_drawing_before_table_parts() {
        let mut s = sheet(
            r#"<worksheet><sheetData/><pageMargins/><tableParts count="1"/></worksheet>"#,
        );
        assert_eq!(s.drawing_rel_id(), None);
        s.attach_drawing("rId4");
        let names: Vec<_> = s.doc.root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sheetData", "pageMargins", "drawing", "tableParts"]);
        assert_eq!(s.drawing_rel_id(), Some("rId4"));
    }

    #[test]
    fn test_acquire_rels() {
        let mut package = Package::default();
        let mut s = sheet("<worksheet><sheetData/></worksheet>");
        let rels = s.acquire_rels(&package).unwrap();
        assert_eq!(rels.path, "xl/worksheets/_rels/sheet1.xml.rels");
        assert_eq!(rels.iter().count(), 0);

        // A part that is present but was not loaded is never replaced
        package.set("xl/worksheets/_rels/sheet1.xml.rels", b"<Relationships".to_vec());
        let mut unreadable = sheet("<worksheet><sheetData/></worksheet>");
        assert!(unreadable.acquire_rels(&package).is_none());
        assert!(unreadable.rels.is_none());
    }

    #[test]
    fn test_load_tolerates_unreadable_rels() {
        let mut package = Package::default();
        package.set("xl/worksheets/sheet1.xml", b"<worksheet><sheetData/></worksheet>".to_vec());
        package.set("xl/worksheets/_rels/sheet1.xml.rels", b"<Relationships>".to_vec());
        let info = SheetInfo {
            name: "Sheet1".into(),
            sheet_id: Some(1),
            rel_id: "rId1".into(),
            path: "xl/worksheets/sheet1.xml".into(),
        };
        let s = SheetPart::load(&package, &info).unwrap();
        assert!(s.rels.is_none());
    }

    #[test]
    fn test_row_height() {
        assert_eq!(row_height(&Element::new("row").with_attr("ht", "30")), Some(30.0));
        assert_eq!(row_height(&Element::new("row")), None);
    }
}
