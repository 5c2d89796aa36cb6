//! Cell reference and range algebra
//!
//! Columns and rows are 1-based here, exactly as they appear in A1 notation:
//! `A` is column 1, `Z` is 26, `AA` is 27. There is no letter for zero.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Convert column letters to a 1-based column number (A = 1, Z = 26, AA = 27)
///
/// Lowercase letters are accepted.
pub fn col_to_num(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        col = col
            .checked_mul(26)
            .and_then(|n| n.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
            .ok_or_else(|| Error::InvalidAddress(format!("column '{}' too large", letters)))?;
    }

    Ok(col)
}

/// Convert a 1-based column number to letters (1 = A, 26 = Z, 27 = AA)
///
/// Bijective base-26: a remainder of 0 becomes `Z` and borrows one from the quotient.
/// Zero has no representation and yields an empty string.
pub fn num_to_col(mut num: u32) -> String {
    let mut letters = Vec::new();

    while num > 0 {
        let rem = num % 26;
        if rem == 0 {
            letters.push(b'Z');
            num = num / 26 - 1;
        } else {
            letters.push(b'A' + (rem - 1) as u8);
            num /= 26;
        }
    }

    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Whether a reference string denotes a range (`A1:B2`) rather than a single cell
pub fn is_range(s: &str) -> bool {
    s.contains(':')
}

/// Inclusive rectangle containment, comparing numeric columns and rows
pub fn within(reference: &CellRef, start: &CellRef, end: &CellRef) -> bool {
    reference.row >= start.row
        && reference.row <= end.row
        && reference.col >= start.col
        && reference.col <= end.col
}

/// A cell reference such as `C5`, `$B$2` or `Sheet1!C5`
///
/// The sheet qualifier is kept verbatim (quotes included), so parsing and formatting
/// round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Sheet qualifier as written, without the trailing `!`
    pub sheet: Option<String>,
    /// Column number (1-based, A=1)
    pub col: u32,
    /// Row number (1-based)
    pub row: u32,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
}

impl CellRef {
    /// Create a relative, unqualified reference
    pub fn new(col: u32, row: u32) -> Self {
        Self {
            sheet: None,
            col,
            row,
            col_absolute: false,
            row_absolute: false,
        }
    }

    /// Parse `[Sheet!][$]COL[$]ROW`
    ///
    /// # Examples
    /// ```
    /// use sheetfill_core::CellRef;
    ///
    /// let r = CellRef::parse("Sheet1!$B$2").unwrap();
    /// assert_eq!(r.sheet.as_deref(), Some("Sheet1"));
    /// assert_eq!((r.col, r.row), (2, 2));
    /// assert!(r.col_absolute && r.row_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty reference".into()));
        }

        let (sheet, cell) = match s.rfind('!') {
            Some(pos) => (Some(s[..pos].to_string()), &s[pos + 1..]),
            None => (None, s),
        };

        let bytes = cell.as_bytes();
        let mut pos = 0;

        let col_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }
        let col = col_to_num(&cell[col_start..pos])?;

        let row_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row_str = &cell[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }
        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 || row > MAX_ROWS {
            return Err(Error::InvalidAddress(format!(
                "row number out of range in '{}'",
                s
            )));
        }
        if col > MAX_COLS {
            return Err(Error::InvalidAddress(format!(
                "column out of range in '{}'",
                s
            )));
        }

        Ok(Self {
            sheet,
            col,
            row,
            col_absolute,
            row_absolute,
        })
    }

    /// Column letters of this reference, uppercase
    pub fn column_letters(&self) -> String {
        num_to_col(self.col)
    }

    /// Sheet name with surrounding quotes removed
    pub fn sheet_name(&self) -> Option<String> {
        self.sheet
            .as_deref()
            .map(|s| s.trim_matches('\'').replace("''", "'"))
    }

    /// Format as `[Sheet!][$]COL[$]ROW`
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if let Some(sheet) = &self.sheet {
            result.push_str(sheet);
            result.push('!');
        }
        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&self.column_letters());
        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&self.row.to_string());

        result
    }

    /// The same reference moved one column to the right
    pub fn next_col(&self) -> Self {
        Self {
            col: self.col + 1,
            ..self.clone()
        }
    }

    /// The same reference moved one row down
    pub fn next_row(&self) -> Self {
        Self {
            row: self.row + 1,
            ..self.clone()
        }
    }

    /// The same reference moved by a signed number of columns and rows
    ///
    /// Results are clamped to the first column/row.
    pub fn offset(&self, cols: i64, rows: i64) -> Self {
        Self {
            col: (self.col as i64 + cols).max(1) as u32,
            row: (self.row as i64 + rows).max(1) as u32,
            ..self.clone()
        }
    }

    /// The same column on another row
    pub fn with_row(&self, row: u32) -> Self {
        Self {
            row,
            ..self.clone()
        }
    }

    /// Zero-based (column, row) pair, as used by drawing anchors
    pub fn zero_based(&self) -> (u32, u32) {
        (self.col.saturating_sub(1), self.row.saturating_sub(1))
    }

    /// Check whether this reference lies inside `start..=end`
    pub fn is_within(&self, start: &CellRef, end: &CellRef) -> bool {
        within(self, start, end)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A range such as `A1:C3` or `Sheet1!$A$1:$B$2`
///
/// The start/end ordering is not checked; consumers expect start to be top-left.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeRef {
    /// Start reference
    pub start: CellRef,
    /// End reference
    pub end: CellRef,
}

impl RangeRef {
    /// Create a range from two references
    pub fn new(start: CellRef, end: CellRef) -> Self {
        Self { start, end }
    }

    /// Parse `START:END`; a single reference yields a one-cell range
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((start, end)) => {
                let start = CellRef::parse(start)
                    .map_err(|_| Error::InvalidRange(format!("bad start in '{}'", s)))?;
                let end = CellRef::parse(end)
                    .map_err(|_| Error::InvalidRange(format!("bad end in '{}'", s)))?;
                Ok(Self { start, end })
            }
            None => {
                let cell = CellRef::parse(s)?;
                Ok(Self {
                    start: cell.clone(),
                    end: cell,
                })
            }
        }
    }

    /// Check whether a reference lies inside this range
    pub fn contains(&self, reference: &CellRef) -> bool {
        within(reference, &self.start, &self.end)
    }

    /// Move both endpoints by a signed number of columns and rows
    pub fn offset(&self, cols: i64, rows: i64) -> Self {
        Self {
            start: self.start.offset(cols, rows),
            end: self.end.offset(cols, rows),
        }
    }

    /// Format as `START:END`
    pub fn to_a1_string(&self) -> String {
        format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for RangeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
