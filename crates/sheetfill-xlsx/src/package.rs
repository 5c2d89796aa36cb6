//! Package container
//!
//! Holds every file of the zip archive in memory, in archive order. Parts the
//! engine touches are replaced; everything else passes through unchanged.

use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::XmlDocument;

/// In-memory zip package
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Read a package from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a package from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> XlsxResult<Self> {
        Self::read(Cursor::new(bytes))
    }

    /// Read a package from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if name.ends_with('/') {
                continue;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            entries.push((name, contents));
        }

        Ok(Self { entries })
    }

    /// Check whether a part exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Raw bytes of a part
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Parse a part as XML, if it exists
    pub fn xml(&self, name: &str) -> XlsxResult<Option<XmlDocument>> {
        self.get(name).map(XmlDocument::parse).transpose()
    }

    /// Parse a part that must exist
    pub fn require_xml(&self, name: &str) -> XlsxResult<XmlDocument> {
        self.xml(name)?
            .ok_or_else(|| XlsxError::MissingPart(name.to_string()))
    }

    /// Replace a part, or add it at the end
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// Serialize and store an XML part
    pub fn set_xml(&mut self, name: &str, doc: &XmlDocument) -> XlsxResult<()> {
        self.set(name, doc.to_bytes()?);
        Ok(())
    }

    /// Remove a part, returning whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        before != self.entries.len()
    }

    /// Iterate over part names in archive order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Next free number for parts named `prefix<digits>...` (max existing + 1)
    pub fn next_file_index(&self, prefix: &str) -> u32 {
        self.names()
            .filter_map(|name| name.strip_prefix(prefix))
            .filter_map(|rest| {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u32>().ok()
            })
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Write the package to a writer
    pub fn write<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);

        for (name, data) in &self.entries {
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialize the package to bytes
    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(Cursor::new(&mut buf))?;
        Ok(buf)
    }
}

/// Directory part of a part name (`xl/worksheets/sheet1.xml` -> `xl/worksheets`)
pub fn part_dir(part: &str) -> &str {
    part.rfind('/').map_or("", |pos| &part[..pos])
}

/// Relationships part that belongs to a part (`xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`)
pub fn rels_path_for(part: &str) -> String {
    let dir = part_dir(part);
    let file = part.rsplit('/').next().unwrap_or(part);
    if dir.is_empty() {
        format!("_rels/{}.rels", file)
    } else {
        format!("{}/_rels/{}.rels", dir, file)
    }
}

/// Resolve a relationship target relative to the part that owns the relationship
pub fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = part_dir(base_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
