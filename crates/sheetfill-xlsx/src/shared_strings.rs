//! Shared strings part (`xl/sharedStrings.xml`)

use sheetfill_core::SharedStrings;

use crate::content_types::{ContentTypes, CT_SHARED_STRINGS};
use crate::error::XlsxResult;
use crate::package::Package;
use crate::relationships::{Relationships, REL_SHARED_STRINGS};
use crate::xml::{Element, XmlDocument};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const DEFAULT_PART: &str = "xl/sharedStrings.xml";

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(ch) => {
                result.push(ch);
                rest = &candidate[7..];
            }
            None => {
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Encode text so [`decode_excel_escapes`] reads it back unchanged
///
/// A literal `_xHHHH_` gets its underscore escaped as `_x005F_`. Control
/// characters XML cannot carry are written as `_xHHHH_`.
pub(crate) fn encode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (pos, ch) in s.char_indices() {
        match ch {
            '_' if is_escape_at(&s[pos..]) => result.push_str("_x005F_"),
            '\t' | '\n' | '\r' => result.push(ch),
            c if (c as u32) < 0x20 => result.push_str(&format!("_x{:04X}_", c as u32)),
            c => result.push(c),
        }
    }
    result
}

fn is_escape_at(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 7
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

/// Plain text of an `<si>` entry: its `<t>` or the concatenated `<r><t>` runs
fn si_text(si: &Element) -> String {
    let mut text = String::new();
    for child in si.elements() {
        match child.name.as_str() {
            "t" => text.push_str(&child.text()),
            "r" => {
                for t in child.children_named("t") {
                    text.push_str(&t.text());
                }
            }
            _ => {}
        }
    }
    decode_excel_escapes(&text)
}

/// The shared strings table together with the part it came from
///
/// Entries whose text is unchanged are written back as the original `<si>`
/// element, so rich-text runs survive a substitution pass.
#[derive(Debug, Clone)]
pub struct SharedStringsPart {
    /// Part name
    pub path: String,
    /// The interned strings
    pub table: SharedStrings,
    originals: Vec<(String, Element)>,
    root: Element,
    existed: bool,
}

impl SharedStringsPart {
    /// Load the part at `path`, or start an empty table when it is absent
    pub fn load(package: &Package, path: Option<String>) -> XlsxResult<Self> {
        let existing = match &path {
            Some(p) => package.xml(p)?,
            None => None,
        };
        let path = path.unwrap_or_else(|| DEFAULT_PART.to_string());

        let Some(mut doc) = existing else {
            return Ok(Self {
                path,
                table: SharedStrings::new(),
                originals: Vec::new(),
                root: Element::new("sst").with_attr("xmlns", MAIN_NS),
                existed: false,
            });
        };

        let originals: Vec<(String, Element)> = doc
            .root
            .take_elements()
            .into_iter()
            .filter(|e| e.name == "si")
            .map(|si| (si_text(&si), si))
            .collect();
        let table = SharedStrings::from_strings(originals.iter().map(|(text, _)| text.clone()));
        log::debug!("loaded {} shared strings from {}", table.len(), path);

        Ok(Self {
            path,
            table,
            originals,
            root: doc.root,
            existed: true,
        })
    }

    /// Serialize the table; registers the part with the workbook when it is new
    pub fn save(
        &self,
        package: &mut Package,
        workbook_rels: &mut Relationships,
        content_types: &mut ContentTypes,
    ) -> XlsxResult<()> {
        if !self.existed && self.table.is_empty() {
            return Ok(());
        }

        let mut root = self.root.clone();
        for (idx, text) in self.table.iter().enumerate() {
            let si = match self.originals.get(idx) {
                Some((original, element)) if original == text => element.clone(),
                _ => new_si(text),
            };
            root.push(si);
        }
        let count = self.table.len().to_string();
        root.set_attr("count", count.as_str());
        root.set_attr("uniqueCount", count);

        package.set_xml(&self.path, &XmlDocument::new(root))?;

        if !self.existed {
            let target = self
                .path
                .strip_prefix("xl/")
                .unwrap_or(self.path.as_str())
                .to_string();
            if workbook_rels.find_by_type("sharedStrings").is_none() {
                workbook_rels.add(REL_SHARED_STRINGS, &target)?;
            }
            content_types.ensure_override(&format!("/{}", self.path), CT_SHARED_STRINGS);
        }
        Ok(())
    }
}

fn new_si(text: &str) -> Element {
    Element::new("si").with_child(
        Element::new("t")
            .with_attr("xml:space", "preserve")
            .with_text(encode_excel_escapes(text)),
    )
}
