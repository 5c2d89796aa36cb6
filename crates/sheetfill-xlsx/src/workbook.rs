//! Workbook part: sheet list, defined names and workbook relationships

use std::fmt;

use crate::content_types::ContentTypes;
use crate::error::{XlsxError, XlsxResult};
use crate::package::{rels_path_for, resolve_target, Package};
use crate::relationships::Relationships;
use crate::xml::{Element, XmlDocument};

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// One `<sheet>` entry of the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    /// Sheet name as shown on the tab
    pub name: String,
    /// `sheetId` attribute
    pub sheet_id: Option<u32>,
    /// Relationship id linking to the sheet part
    pub rel_id: String,
    /// Resolved part name, e.g. `xl/worksheets/sheet1.xml`
    pub path: String,
}

/// How a caller names the sheet to substitute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Match on sheet name; an all-digit name that matches nothing is retried as an id
    Name(String),
    /// Match on `sheetId`, falling back to 0-based position
    Id(u32),
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(name: String) -> Self {
        SheetSelector::Name(name)
    }
}

impl From<&String> for SheetSelector {
    fn from(name: &String) -> Self {
        SheetSelector::Name(name.clone())
    }
}

impl From<u32> for SheetSelector {
    fn from(id: u32) -> Self {
        SheetSelector::Id(id)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Name(name) => write!(f, "{}", name),
            SheetSelector::Id(id) => write!(f, "#{}", id),
        }
    }
}

/// The parsed workbook part and its relationships
#[derive(Debug, Clone)]
pub struct WorkbookPart {
    /// Part name of the workbook
    pub path: String,
    /// Parsed workbook XML
    pub doc: XmlDocument,
    /// Workbook relationships
    pub rels: Relationships,
    sheets: Vec<SheetInfo>,
}

impl WorkbookPart {
    /// Load the workbook part named by the package relationships
    pub fn load(package: &Package) -> XlsxResult<Self> {
        let path = Relationships::load(package, "_rels/.rels")?
            .and_then(|root_rels| {
                root_rels
                    .find_by_type("officeDocument")
                    .and_then(|r| r.attr("Target"))
                    .map(|t| resolve_target("", t))
            })
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string());

        let doc = package.require_xml(&path)?;
        let rels_path = rels_path_for(&path);
        let rels = Relationships::load(package, &rels_path)?
            .ok_or(XlsxError::MissingPart(rels_path))?;

        let mut sheets = Vec::new();
        if let Some(sheets_el) = doc.root.child("sheets") {
            for sheet in sheets_el.children_named("sheet") {
                let (Some(name), Some(rel_id)) = (sheet.attr("name"), sheet.attr("r:id")) else {
                    continue;
                };
                let Some(target) = rels.target(rel_id) else {
                    log::warn!("sheet '{}' has no relationship {}", name, rel_id);
                    continue;
                };
                sheets.push(SheetInfo {
                    name: name.to_string(),
                    sheet_id: sheet.attr("sheetId").and_then(|s| s.parse().ok()),
                    rel_id: rel_id.to_string(),
                    path: resolve_target(&path, target),
                });
            }
        }

        Ok(Self {
            path,
            doc,
            rels,
            sheets,
        })
    }

    /// Write the workbook and its relationships back into the package
    pub fn save(&self, package: &mut Package) -> XlsxResult<()> {
        package.set_xml(&self.path, &self.doc)?;
        self.rels.save(package)
    }

    /// Sheets in workbook order
    pub fn sheets(&self) -> &[SheetInfo] {
        &self.sheets
    }

    /// Resolve a selector to a sheet
    pub fn find_sheet(&self, selector: &SheetSelector) -> XlsxResult<&SheetInfo> {
        let found = match selector {
            SheetSelector::Name(name) => self
                .sheets
                .iter()
                .find(|s| &s.name == name)
                .or_else(|| name.parse::<u32>().ok().and_then(|id| self.by_id(id))),
            SheetSelector::Id(id) => self.by_id(*id),
        };
        found.ok_or_else(|| XlsxError::SheetNotFound(selector.to_string()))
    }

    fn by_id(&self, id: u32) -> Option<&SheetInfo> {
        self.sheets
            .iter()
            .find(|s| s.sheet_id == Some(id))
            .or_else(|| self.sheets.get(id as usize))
    }

    /// Mutable `definedName` elements
    pub fn defined_names_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.doc
            .root
            .child_mut("definedNames")
            .into_iter()
            .flat_map(|names| names.children_named_mut("definedName"))
    }

    /// Part name of the shared strings part, if the workbook links one
    pub fn shared_strings_path(&self) -> Option<String> {
        self.rels
            .find_by_type("sharedStrings")
            .and_then(|r| r.attr("Target"))
            .map(|t| resolve_target(&self.path, t))
    }

    /// Drop the calculation chain and ask the application to recalculate on load
    pub fn invalidate_calc_chain(&mut self, package: &mut Package, content_types: &mut ContentTypes) {
        let chain = self
            .rels
            .find_by_type("calcChain")
            .and_then(|r| r.attr("Target"))
            .map(|t| resolve_target(&self.path, t));

        if let Some(chain) = chain {
            package.remove(&chain);
            content_types.remove_override(&format!("/{}", chain));
            self.rels.remove_by_type("calcChain");
            log::debug!("dropped calculation chain {}", chain);
        }

        if let Some(calc_pr) = self.doc.root.child_mut("calcPr") {
            calc_pr.set_attr("fullCalcOnLoad", "1");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> WorkbookPart {
        let mut package = Package::default();
        package.set(
            "_rels/.rels",
            br#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_vec(),
        );
        package.set(
            "xl/workbook.xml",
            br#"<workbook><sheets><sheet name="Summary" sheetId="3" r:id="rId1"/><sheet name="2024" sheetId="7" r:id="rId2"/></sheets><definedNames><definedName name="a">Summary!$A$1</definedName></definedNames><calcPr calcId="1"/></workbook>"#.to_vec(),
        );
        package.set(
            "xl/_rels/workbook.xml.rels",
            br#"<Relationships><Relationship Id="rId1" Type="x/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="x/worksheet" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="x/calcChain" Target="calcChain.xml"/></Relationships>"#.to_vec(),
        );
        WorkbookPart::load(&package).unwrap()
    }

    #[test]
    fn test_sheet_lookup() {
        let wb = workbook();
        assert_eq!(wb.sheets().len(), 2);
        assert_eq!(wb.find_sheet(&"Summary".into()).unwrap().path, "xl/worksheets/sheet1.xml");
        assert_eq!(wb.find_sheet(&"2024".into()).unwrap().sheet_id, Some(7));
        assert_eq!(wb.find_sheet(&SheetSelector::Id(3)).unwrap().name, "Summary");
        // falls back to position
        assert_eq!(wb.find_sheet(&SheetSelector::Id(1)).unwrap().name, "2024");
        assert!(matches!(
            wb.find_sheet(&"Missing".into()),
            Err(XlsxError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_defined_names() {
        let mut wb = workbook();
        let names: Vec<String> = wb.defined_names_mut().map(|n| n.text()).collect();
        assert_eq!(names, vec!["Summary!$A$1"]);
    }

    #[test]
    fn test_invalidate_calc_chain() {
        let mut wb = workbook();
        let mut package = Package::default();
        package.set("xl/calcChain.xml", b"<calcChain/>".to_vec());
        package.set(
            "[Content_Types].xml",
            br#"<Types><Override PartName="/xl/calcChain.xml" ContentType="c"/></Types>"#.to_vec(),
        );
        let mut ct = ContentTypes::load(&package).unwrap();

        wb.invalidate_calc_chain(&mut package, &mut ct);

        assert!(!package.contains("xl/calcChain.xml"));
        assert!(!ct.has_override("/xl/calcChain.xml"));
        assert!(wb.rels.find_by_type("calcChain").is_none());
        assert_eq!(wb.doc.root.child("calcPr").unwrap().attr("fullCalcOnLoad"), Some("1"));
    }
}
