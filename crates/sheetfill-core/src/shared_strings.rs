//! Shared string table
//!
//! An ordered pool of unique strings plus a reverse lookup. Cells refer to
//! strings by their index, so an index stays stable for as long as the string
//! lives in the table.

use std::collections::HashMap;

/// Interned pool of cell text values
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl SharedStrings {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from strings in part order
    ///
    /// Duplicates keep their slots; lookups resolve to the first occurrence.
    pub fn from_strings<I: IntoIterator<Item = String>>(strings: I) -> Self {
        let mut table = Self::new();
        for s in strings {
            table.append(s);
        }
        table
    }

    /// Index of `value`, appending it first if it is not present yet
    pub fn index(&mut self, value: &str) -> usize {
        match self.lookup.get(value) {
            Some(&idx) => idx,
            None => self.append(value.to_string()),
        }
    }

    /// Append `value` unconditionally and return its new index
    pub fn append(&mut self, value: String) -> usize {
        let idx = self.strings.len();
        self.lookup.entry(value.clone()).or_insert(idx);
        self.strings.push(value);
        idx
    }

    /// Rewrite the slot holding `old` to hold `new`, keeping its index
    ///
    /// When `old` is not in the table this behaves like [`SharedStrings::index`].
    pub fn replace(&mut self, old: &str, new: &str) -> usize {
        match self.lookup.remove(old) {
            Some(idx) => {
                self.strings[idx] = new.to_string();
                self.lookup.entry(new.to_string()).or_insert(idx);
                idx
            }
            None => self.index(new),
        }
    }

    /// String stored at `idx`
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.strings.get(idx).map(String::as_str)
    }

    /// Number of slots in the table
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over strings in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}
