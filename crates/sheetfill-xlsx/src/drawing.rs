//! Drawing parts (`xl/drawings/drawingN.xml`) holding picture anchors

use crate::content_types::{ContentTypes, CT_DRAWING};
use crate::error::{XlsxError, XlsxResult};
use crate::media::ImageData;
use crate::package::{rels_path_for, resolve_target, Package};
use crate::relationships::{Relationships, REL_DRAWING, REL_IMAGE};
use crate::sheet::SheetPart;
use crate::xml::{Element, XmlDocument};

const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const MAIN_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A sheet's drawing part and its relationships
#[derive(Debug, Clone)]
pub struct DrawingPart {
    /// Part name
    pub path: String,
    /// Parsed drawing XML
    pub doc: XmlDocument,
    /// Drawing relationships (images)
    pub rels: Relationships,
}

impl DrawingPart {
    /// Load the drawing the sheet already references, if any
    pub fn load(package: &Package, sheet: &SheetPart) -> XlsxResult<Option<Self>> {
        let Some(rel_id) = sheet.drawing_rel_id() else {
            return Ok(None);
        };
        let Some(target) = sheet.rels.as_ref().and_then(|rels| rels.target(rel_id)) else {
            log::warn!("sheet '{}' references drawing {} without a relationship", sheet.name, rel_id);
            return Ok(None);
        };

        let path = resolve_target(&sheet.path, target);
        let doc = package.require_xml(&path)?;
        let rels_path = rels_path_for(&path);
        let rels = Relationships::load(package, &rels_path)?
            .unwrap_or_else(|| Relationships::new(rels_path));
        Ok(Some(Self { path, doc, rels }))
    }

    /// Create a new, empty drawing and attach it to the sheet
    pub fn create(
        package: &Package,
        sheet: &mut SheetPart,
        content_types: &mut ContentTypes,
    ) -> XlsxResult<Self> {
        let index = package.next_file_index("xl/drawings/drawing");
        let path = format!("xl/drawings/drawing{}.xml", index);

        let sheet_rels = sheet
            .rels
            .as_mut()
            .ok_or_else(|| XlsxError::MissingRelationships(sheet.name.clone()))?;
        let rel_id = sheet_rels.add(REL_DRAWING, &format!("../drawings/drawing{}.xml", index))?;
        sheet.attach_drawing(&rel_id);
        content_types.ensure_override(&format!("/{}", path), CT_DRAWING);
        log::debug!("created {} for sheet '{}'", path, sheet.name);

        let root = Element::new("xdr:wsDr")
            .with_attr("xmlns:xdr", DRAWING_NS)
            .with_attr("xmlns:a", MAIN_NS);
        Ok(Self {
            rels: Relationships::new(rels_path_for(&path)),
            path,
            doc: XmlDocument::new(root),
        })
    }

    /// Write the drawing and its relationships back into the package
    pub fn save(&self, package: &mut Package) -> XlsxResult<()> {
        package.set_xml(&self.path, &self.doc)?;
        self.rels.save(package)
    }

    fn prefix(&self) -> &str {
        self.doc
            .root
            .name
            .split_once(':')
            .map_or("", |(prefix, _)| prefix)
    }

    fn qualified(&self, local: &str) -> String {
        match self.prefix() {
            "" => local.to_string(),
            prefix => format!("{}:{}", prefix, local),
        }
    }

    /// Number of picture anchors
    pub fn anchor_count(&self) -> usize {
        self.doc.root.elements().filter(|e| is_anchor(e)).count()
    }

    /// Store image bytes as a media part and return the relationship id for it
    pub fn embed(
        &mut self,
        package: &mut Package,
        content_types: &mut ContentTypes,
        image: &ImageData,
    ) -> XlsxResult<String> {
        let index = package.next_file_index("xl/media/image");
        let extension = image.extension();
        let name = format!("image{}.{}", index, extension);
        package.set(&format!("xl/media/{}", name), image.bytes.clone());
        content_types.ensure_default(extension, image.content_type());
        self.rels.add(REL_IMAGE, &format!("../media/{}", name))
    }

    fn next_shape_id(&self) -> u32 {
        fn max_id(element: &Element) -> u32 {
            let own = if element.name.ends_with("cNvPr") {
                element.attr("id").and_then(|id| id.parse().ok()).unwrap_or(0)
            } else {
                0
            };
            element.elements().map(max_id).fold(own, u32::max)
        }
        max_id(&self.doc.root) + 1
    }

    /// Append a one-cell anchor showing `rel_id` at a zero-based cell
    pub fn add_picture(&mut self, (col, row): (u32, u32), (cx, cy): (i64, i64), rel_id: &str) {
        let id = self.next_shape_id();
        let q = |local: &str| self.qualified(local);
        let cx = cx.to_string();
        let cy = cy.to_string();

        let from = Element::new(q("from"))
            .with_child(Element::new(q("col")).with_text(col.to_string()))
            .with_child(Element::new(q("colOff")).with_text("0"))
            .with_child(Element::new(q("row")).with_text(row.to_string()))
            .with_child(Element::new(q("rowOff")).with_text("0"));

        let nv_pic_pr = Element::new(q("nvPicPr"))
            .with_child(
                Element::new(q("cNvPr"))
                    .with_attr("id", id.to_string())
                    .with_attr("name", format!("Picture {}", id)),
            )
            .with_child(
                Element::new(q("cNvPicPr"))
                    .with_child(Element::new("a:picLocks").with_attr("noChangeAspect", "1")),
            );

        let blip_fill = Element::new(q("blipFill"))
            .with_child(
                Element::new("a:blip")
                    .with_attr("xmlns:r", REL_NS)
                    .with_attr("r:embed", rel_id),
            )
            .with_child(Element::new("a:stretch").with_child(Element::new("a:fillRect")));

        let sp_pr = Element::new(q("spPr"))
            .with_child(
                Element::new("a:xfrm")
                    .with_child(Element::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                    .with_child(
                        Element::new("a:ext")
                            .with_attr("cx", cx.as_str())
                            .with_attr("cy", cy.as_str()),
                    ),
            )
            .with_child(
                Element::new("a:prstGeom")
                    .with_attr("prst", "rect")
                    .with_child(Element::new("a:avLst")),
            );

        let anchor = Element::new(q("oneCellAnchor"))
            .with_child(from)
            .with_child(
                Element::new(q("ext"))
                    .with_attr("cx", cx.as_str())
                    .with_attr("cy", cy.as_str()),
            )
            .with_child(
                Element::new(q("pic"))
                    .with_child(nv_pic_pr)
                    .with_child(blip_fill)
                    .with_child(sp_pr),
            )
            .with_child(Element::new(q("clientData")));

        self.doc.root.push(anchor);
    }

    /// Move the first `limit` anchors down when they sit below `row` (1-based)
    ///
    /// With `same_line`, anchors starting exactly on `row` move too. Both the
    /// `from` and `to` markers of two-cell anchors are shifted.
    pub fn move_anchors(&mut self, row: u32, rows: u32, same_line: bool, limit: usize) {
        let mut moved = 0;
        for anchor in self
            .doc
            .root
            .elements_mut()
            .filter(|e| is_anchor(e))
            .take(limit)
        {
            let Some(from_row) = marker_row(anchor, "from") else {
                continue;
            };
            let start = from_row + 1;
            let below = if same_line { start >= row } else { start > row };
            if !below {
                continue;
            }
            for marker in ["from", "to"] {
                if let Some(value) = marker_row_mut(anchor, marker) {
                    let current: u32 = value.text().trim().parse().unwrap_or(0);
                    value.set_text((current + rows).to_string());
                }
            }
            moved += 1;
        }
        if moved > 0 {
            log::debug!("moved {} images down by {} rows", moved, rows);
        }
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn is_anchor(element: &Element) -> bool {
    matches!(local_name(&element.name), "oneCellAnchor" | "twoCellAnchor")
}

fn marker_row(anchor: &Element, marker: &str) -> Option<u32> {
    anchor
        .elements()
        .find(|e| local_name(&e.name) == marker)?
        .elements()
        .find(|e| local_name(&e.name) == "row")?
        .text()
        .trim()
        .parse()
        .ok()
}

fn marker_row_mut<'a>(anchor: &'a mut Element, marker: &str) -> Option<&'a mut Element> {
    anchor
        .elements_mut()
        .find(|e| local_name(&e.name) == marker)?
        .elements_mut()
        .find(|e| local_name(&e.name) == "row")
}
