//! Shared helpers: build template packages in memory and read results back

#![allow(dead_code)]

use std::io::{Cursor, Write};

use image::{ImageBuffer, ImageFormat, Rgb};
use sheetfill::xlsx::xml::{Element, XmlDocument};
use sheetfill::Package;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const DOC_REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_TABLE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";
const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";

/// One worksheet of a fixture
pub struct SheetFixture {
    name: String,
    body: String,
    rels: Vec<(String, String, String)>,
    tables: Vec<String>,
    drawing: Option<String>,
    with_rels: bool,
    unreadable_rels: bool,
}

impl SheetFixture {
    /// A sheet whose `<worksheet>` content is `body` (sheetData, mergeCells, ...)
    pub fn new(name: &str, body: &str) -> Self {
        Self {
            name: name.to_string(),
            body: body.to_string(),
            rels: Vec::new(),
            tables: Vec::new(),
            drawing: None,
            with_rels: true,
            unreadable_rels: false,
        }
    }

    /// Add an external hyperlink relationship with the given id
    pub fn hyperlink(mut self, id: &str, target: &str) -> Self {
        self.rels
            .push((id.to_string(), REL_HYPERLINK.to_string(), target.to_string()));
        self
    }

    /// Attach a table part; `xml` is the complete `<table>` element
    pub fn table(mut self, xml: &str) -> Self {
        self.tables.push(xml.to_string());
        self
    }

    /// Attach a drawing part; `xml` is the complete `<xdr:wsDr>` element
    pub fn drawing(mut self, xml: &str) -> Self {
        self.drawing = Some(xml.to_string());
        self
    }

    /// Leave the sheet without a relationships part
    pub fn without_rels(mut self) -> Self {
        self.with_rels = false;
        self
    }

    /// Write a relationships part that is not well-formed XML
    pub fn unreadable_rels(mut self) -> Self {
        self.unreadable_rels = true;
        self
    }
}

/// Builder for a minimal template package
#[derive(Default)]
pub struct TemplateFixture {
    strings: Vec<String>,
    sheets: Vec<SheetFixture>,
    defined_names: Vec<(String, String)>,
    calc_chain: bool,
}

impl TemplateFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared strings, in index order
    pub fn strings(mut self, strings: &[&str]) -> Self {
        self.strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn sheet(mut self, sheet: SheetFixture) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn defined_name(mut self, name: &str, reference: &str) -> Self {
        self.defined_names
            .push((name.to_string(), reference.to_string()));
        self
    }

    /// Include a calculation chain part
    pub fn calc_chain(mut self) -> Self {
        self.calc_chain = true;
        self
    }

    /// Serialize the package
    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, String)> = Vec::new();
        let mut overrides: Vec<(String, &str)> = vec![(
            "/xl/workbook.xml".into(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
        )];

        parts.push((
            "_rels/.rels".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
                PKG_REL_NS
            ),
        ));

        let mut sheets_xml = String::new();
        let mut workbook_rels = String::new();
        let mut table_index = 0;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let n = i + 1;
            sheets_xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                sheet.name, n, n
            ));
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}" Target="worksheets/sheet{}.xml"/>"#,
                n, REL_WORKSHEET, n
            ));
            overrides.push((
                format!("/xl/worksheets/sheet{}.xml", n),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            ));

            let mut rels = String::new();
            for (id, rel_type, target) in &sheet.rels {
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="{}" TargetMode="External"/>"#,
                    id,
                    rel_type,
                    escape(target)
                ));
            }
            let mut table_parts = String::new();
            for (t, table) in sheet.tables.iter().enumerate() {
                table_index += 1;
                let id = format!("rId{}", sheet.rels.len() + t + 1);
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="../tables/table{}.xml"/>"#,
                    id, REL_TABLE, table_index
                ));
                table_parts.push_str(&format!(r#"<tablePart r:id="{}"/>"#, id));
                parts.push((format!("xl/tables/table{}.xml", table_index), table.clone()));
                overrides.push((
                    format!("/xl/tables/table{}.xml", table_index),
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml",
                ));
            }
            if !table_parts.is_empty() {
                table_parts = format!(
                    r#"<tableParts count="{}">{}</tableParts>"#,
                    sheet.tables.len(),
                    table_parts
                );
            }

            let mut drawing = String::new();
            if let Some(xml) = &sheet.drawing {
                let id = format!("rId{}", sheet.rels.len() + sheet.tables.len() + 1);
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="../drawings/drawing{}.xml"/>"#,
                    id, REL_DRAWING, n
                ));
                drawing = format!(r#"<drawing r:id="{}"/>"#, id);
                parts.push((format!("xl/drawings/drawing{}.xml", n), xml.clone()));
                overrides.push((
                    format!("/xl/drawings/drawing{}.xml", n),
                    "application/vnd.openxmlformats-officedocument.drawing+xml",
                ));
            }

            parts.push((
                format!("xl/worksheets/sheet{}.xml", n),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{}" xmlns:r="{}">{}{}{}</worksheet>"#,
                    MAIN_NS, DOC_REL_NS, sheet.body, drawing, table_parts
                ),
            ));
            if sheet.unreadable_rels {
                parts.push((
                    format!("xl/worksheets/_rels/sheet{}.xml.rels", n),
                    format!(r#"<Relationships xmlns="{}">"#, PKG_REL_NS),
                ));
            } else if sheet.with_rels {
                parts.push((
                    format!("xl/worksheets/_rels/sheet{}.xml.rels", n),
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">{}</Relationships>"#,
                        PKG_REL_NS, rels
                    ),
                ));
            }
        }

        let mut next_rel = self.sheets.len() + 1;
        if !self.strings.is_empty() {
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
                next_rel
            ));
            next_rel += 1;
            let items: String = self
                .strings
                .iter()
                .map(|s| format!("<si><t>{}</t></si>", escape(s)))
                .collect();
            parts.push((
                "xl/sharedStrings.xml".into(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{}" count="{}" uniqueCount="{}">{}</sst>"#,
                    MAIN_NS,
                    self.strings.len(),
                    self.strings.len(),
                    items
                ),
            ));
            overrides.push((
                "/xl/sharedStrings.xml".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
            ));
        }

        let mut calc_pr = String::new();
        if self.calc_chain {
            workbook_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/>"#,
                next_rel
            ));
            parts.push((
                "xl/calcChain.xml".into(),
                format!(r#"<calcChain xmlns="{}"><c r="A1" i="1"/></calcChain>"#, MAIN_NS),
            ));
            overrides.push((
                "/xl/calcChain.xml".into(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml",
            ));
            calc_pr = r#"<calcPr calcId="191029"/>"#.into();
        }

        let defined_names = if self.defined_names.is_empty() {
            String::new()
        } else {
            let names: String = self
                .defined_names
                .iter()
                .map(|(name, reference)| {
                    format!(r#"<definedName name="{}">{}</definedName>"#, name, escape(reference))
                })
                .collect();
            format!("<definedNames>{}</definedNames>", names)
        };

        parts.push((
            "xl/workbook.xml".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{}" xmlns:r="{}"><sheets>{}</sheets>{}{}</workbook>"#,
                MAIN_NS, DOC_REL_NS, sheets_xml, defined_names, calc_pr
            ),
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".into(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">{}</Relationships>"#,
                PKG_REL_NS, workbook_rels
            ),
        ));

        let override_xml: String = overrides
            .iter()
            .map(|(part, ct)| format!(r#"<Override PartName="{}" ContentType="{}"/>"#, part, ct))
            .collect();
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
            override_xml
        );

        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(content_types.as_bytes()).unwrap();
            for (name, data) in &parts {
                zip.start_file(name.as_str(), options).unwrap();
                zip.write_all(data.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// A filled package, opened for inspection
pub struct Output {
    pub package: Package,
}

impl Output {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            package: Package::from_bytes(bytes).unwrap(),
        }
    }

    /// Root element of a part; panics when absent
    pub fn part(&self, name: &str) -> Element {
        self.package
            .xml(name)
            .unwrap()
            .unwrap_or_else(|| panic!("missing part {}", name))
            .root
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.package.contains(name)
    }

    pub fn sheet(&self, n: usize) -> Element {
        self.part(&format!("xl/worksheets/sheet{}.xml", n))
    }

    /// Shared string texts in index order
    pub fn strings(&self) -> Vec<String> {
        if !self.has_part("xl/sharedStrings.xml") {
            return Vec::new();
        }
        self.part("xl/sharedStrings.xml")
            .children_named("si")
            .map(|si| {
                si.elements()
                    .map(|e| match e.name.as_str() {
                        "t" => e.text(),
                        "r" => e.child("t").map(Element::text).unwrap_or_default(),
                        _ => String::new(),
                    })
                    .collect()
            })
            .collect()
    }

    /// The `<c>` element at a reference in sheet `n`
    pub fn cell(&self, n: usize, reference: &str) -> Option<Element> {
        let sheet = self.sheet(n);
        let data = sheet.child("sheetData")?;
        let found = data
            .children_named("row")
            .flat_map(|row| row.children_named("c"))
            .find(|c| c.attr("r") == Some(reference))
            .cloned();
        found
    }

    /// Displayed value of a cell: shared strings resolved, raw `<v>` otherwise
    pub fn value(&self, n: usize, reference: &str) -> Option<String> {
        let cell = self.cell(n, reference)?;
        let v = cell.child("v")?.text();
        if cell.attr("t") == Some("s") {
            let index: usize = v.parse().ok()?;
            return self.strings().get(index).cloned();
        }
        Some(v)
    }

    /// Cell references of row `r` in sheet `n`, in document order
    pub fn row_refs(&self, n: usize, r: u32) -> Vec<String> {
        let sheet = self.sheet(n);
        let Some(data) = sheet.child("sheetData") else {
            return Vec::new();
        };
        let r = r.to_string();
        let refs = data
            .children_named("row")
            .filter(|row| row.attr("r") == Some(r.as_str()))
            .flat_map(|row| row.children_named("c"))
            .filter_map(|c| c.attr("r").map(str::to_string))
            .collect();
        refs
    }

    /// Row elements of sheet `n`
    pub fn rows(&self, n: usize) -> Vec<Element> {
        let sheet = self.sheet(n);
        let rows = sheet
            .child("sheetData")
            .map(|d| d.children_named("row").cloned().collect())
            .unwrap_or_default();
        rows
    }

    pub fn merges(&self, n: usize) -> Vec<String> {
        let sheet = self.sheet(n);
        let merges = sheet
            .child("mergeCells")
            .map(|m| {
                m.children_named("mergeCell")
                    .filter_map(|c| c.attr("ref").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        merges
    }

    pub fn defined_name(&self, name: &str) -> Option<String> {
        let workbook = self.part("xl/workbook.xml");
        let names = workbook.child("definedNames")?;
        let found = names
            .children_named("definedName")
            .find(|d| d.attr("name") == Some(name))?
            .text();
        Some(found)
    }

    pub fn content_types(&self) -> Element {
        self.part("[Content_Types].xml")
    }
}

/// Parse an XML snippet
pub fn xml(s: &str) -> Element {
    XmlDocument::parse(s.as_bytes()).unwrap().root
}

/// A solid PNG of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
