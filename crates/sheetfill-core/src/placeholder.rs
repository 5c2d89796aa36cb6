//! Placeholder grammar
//!
//! Placeholders look like `${[TYPE:]NAME[.KEY][:SUBTYPE]}`:
//!
//! - `${name}`, `${name.key}`
//! - `${table:rows.key}`, `${table:rows.key:image}`
//! - `${image:logo}` or the bare form `${:logo::image}`
//!
//! A token is *full* when it is the whole source string; only full tokens may
//! expand into extra rows, columns or images.

use lazy_regex::regex;
use std::fmt;

/// The kind of a placeholder, from its `TYPE:` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// No prefix: scalar or horizontal array substitution
    Normal,
    /// `table:` prefix: vertical, keyed substitution
    Table,
    /// `image:` prefix (or the bare `${:name::image}` form)
    Image,
    /// Any other prefix; always substituted as text
    Other(String),
}

impl PlaceholderKind {
    fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "" | "normal" => PlaceholderKind::Normal,
            "table" => PlaceholderKind::Table,
            "image" => PlaceholderKind::Image,
            other => PlaceholderKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderKind::Normal => write!(f, "normal"),
            PlaceholderKind::Table => write!(f, "table"),
            PlaceholderKind::Image => write!(f, "image"),
            PlaceholderKind::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One placeholder occurrence inside a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Placeholder kind
    pub kind: PlaceholderKind,
    /// Name looked up in the substitution values
    pub name: String,
    /// Optional key after the first `.`
    pub key: Option<String>,
    /// Optional subtype after the last `:` (e.g. `image`)
    pub subtype: Option<String>,
    /// The literal matched text, `${...}` included
    pub text: String,
    /// Whether the match spans the entire source string
    pub full: bool,
}

impl Placeholder {
    /// `name` or `name.key`, as used for dotted lookups
    pub fn path(&self) -> String {
        match &self.key {
            Some(key) => format!("{}.{}", self.name, key),
            None => self.name.clone(),
        }
    }

    /// Whether the subtype asks for an image
    pub fn is_image_subtype(&self) -> bool {
        self.subtype.as_deref() == Some("image")
    }

    /// Parse the inside of `${...}`; `None` when no name is present
    fn from_body(body: &str, text: &str, full: bool) -> Option<Self> {
        let parts: Vec<&str> = body.split(':').collect();

        let (prefix, name_key, subtype) = match parts.as_slice() {
            [name_key] => ("", *name_key, None),
            [prefix, name_key] => (*prefix, *name_key, None),
            [prefix, name_key, rest @ ..] => {
                let subtype = rest.iter().rev().find(|s| !s.is_empty()).copied();
                (*prefix, *name_key, subtype)
            }
            [] => return None,
        };

        let (name, key) = match name_key.split_once('.') {
            Some((name, key)) if !key.is_empty() => (name, Some(key.to_string())),
            Some((name, _)) => (name, None),
            None => (name_key, None),
        };
        if name.is_empty() {
            return None;
        }

        let mut kind = PlaceholderKind::from_prefix(prefix);
        if prefix.is_empty() && subtype == Some("image") {
            kind = PlaceholderKind::Image;
        }

        Some(Self {
            kind,
            name: name.to_string(),
            key,
            subtype: subtype.map(str::to_string),
            text: text.to_string(),
            full,
        })
    }
}

/// Extract every placeholder in `s`, left to right, without overlaps
///
/// # Examples
/// ```
/// use sheetfill_core::{extract_placeholders, PlaceholderKind};
///
/// let tokens = extract_placeholders("${table:rows.name}");
/// assert_eq!(tokens.len(), 1);
/// assert_eq!(tokens[0].kind, PlaceholderKind::Table);
/// assert_eq!(tokens[0].key.as_deref(), Some("name"));
/// assert!(tokens[0].full);
/// ```
pub fn extract_placeholders(s: &str) -> Vec<Placeholder> {
    regex!(r"\$\{([^{}]+)\}")
        .captures_iter(s)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?.as_str();
            Placeholder::from_body(body, whole.as_str(), whole.as_str().len() == s.len())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_partial() {
        let tokens = extract_placeholders("Hello ${name}");
        assert_eq!(tokens.len(), 1);
        let t = &tokens[0];
        assert_eq!(t.kind, PlaceholderKind::Normal);
        assert_eq!(t.name, "name");
        assert_eq!(t.key, None);
        assert_eq!(t.subtype, None);
        assert_eq!(t.text, "${name}");
        assert!(!t.full);
    }

    #[test]
    fn test_full_with_key() {
        let t = &extract_placeholders("${person.age}")[0];
        assert_eq!(t.name, "person");
        assert_eq!(t.key.as_deref(), Some("age"));
        assert_eq!(t.path(), "person.age");
        assert!(t.full);
    }

    #[test]
    fn test_table_image() {
        let t = &extract_placeholders("${table:rows.photo:image}")[0];
        assert_eq!(t.kind, PlaceholderKind::Table);
        assert_eq!(t.name, "rows");
        assert_eq!(t.key.as_deref(), Some("photo"));
        assert!(t.is_image_subtype());
    }

    #[test]
    fn test_image_forms() {
        let t = &extract_placeholders("${image:logo}")[0];
        assert_eq!(t.kind, PlaceholderKind::Image);
        assert_eq!(t.name, "logo");

        let t = &extract_placeholders("${:logo::image}")[0];
        assert_eq!(t.kind, PlaceholderKind::Image);
        assert_eq!(t.name, "logo");
        assert_eq!(t.subtype.as_deref(), Some("image"));
    }

    #[test]
    fn test_multiple_tokens() {
        let tokens = extract_placeholders("${first} ${last} (${table:x.y})");
        let names: Vec<_> = tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "last", "x"]);
        assert!(tokens.iter().all(|t| !t.full));
    }

    #[test]
    fn test_other_kind_and_garbage() {
        let t = &extract_placeholders("${custom:thing}")[0];
        assert_eq!(t.kind, PlaceholderKind::Other("custom".into()));

        assert!(extract_placeholders("no tokens here").is_empty());
        assert!(extract_placeholders("${}").is_empty());
        assert!(extract_placeholders("${table:}").is_empty());
        assert!(extract_placeholders("$name").is_empty());
    }
}
