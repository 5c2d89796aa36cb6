//! Table definition parts (`xl/tables/tableN.xml`)

use sheetfill_core::RangeRef;

use crate::error::XlsxResult;
use crate::package::{resolve_target, Package};
use crate::sheet::SheetPart;
use crate::xml::{Element, XmlDocument};

/// A table attached to a worksheet
#[derive(Debug, Clone)]
pub struct TablePart {
    /// Part name
    pub path: String,
    /// Parsed table XML
    pub doc: XmlDocument,
}

impl TablePart {
    /// Load every table listed in the sheet's `tableParts`
    pub fn load_for_sheet(package: &Package, sheet: &SheetPart) -> XlsxResult<Vec<Self>> {
        let Some(parts) = sheet.doc.root.child("tableParts") else {
            return Ok(Vec::new());
        };
        let Some(rels) = &sheet.rels else {
            log::warn!("sheet '{}' lists tables but has no relationships", sheet.name);
            return Ok(Vec::new());
        };

        let mut tables = Vec::new();
        for part in parts.children_named("tablePart") {
            let Some(target) = part.attr("r:id").and_then(|id| rels.target(id)) else {
                log::warn!("unresolvable tablePart in sheet '{}'", sheet.name);
                continue;
            };
            let path = resolve_target(&sheet.path, target);
            let doc = package.require_xml(&path)?;
            tables.push(Self { path, doc });
        }
        Ok(tables)
    }

    /// Write the table back into the package
    pub fn save(&self, package: &mut Package) -> XlsxResult<()> {
        package.set_xml(&self.path, &self.doc)
    }

    /// Table name
    pub fn name(&self) -> Option<&str> {
        self.doc.root.attr("name")
    }

    /// The table's `ref` range
    pub fn range(&self) -> Option<RangeRef> {
        self.doc.root.attr("ref").and_then(|r| RangeRef::parse(r).ok())
    }

    /// Set the table range; the auto-filter range follows it
    pub fn set_range(&mut self, range: &RangeRef) {
        let formatted = range.to_a1_string();
        if let Some(filter) = self.doc.root.child_mut("autoFilter") {
            filter.set_attr("ref", formatted.as_str());
        }
        self.doc.root.set_attr("ref", formatted);
    }

    /// Mutable `tableColumn` elements
    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.doc
            .root
            .child_mut("tableColumns")
            .into_iter()
            .flat_map(|cols| cols.children_named_mut("tableColumn"))
    }
}
