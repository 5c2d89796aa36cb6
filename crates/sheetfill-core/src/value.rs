//! Substitution values
//!
//! Every placeholder resolves to a [`TemplateValue`]. The engine matches on it
//! exhaustively to decide between scalar insertion, array/table expansion and
//! image embedding.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Values supplied for one substitution pass, keyed by placeholder name
pub type Substitutions = BTreeMap<String, TemplateValue>;

/// Days between the spreadsheet day-zero (1899-12-30) and the Unix epoch
pub const EPOCH_OFFSET_DAYS: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Where the bytes of an image come from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Raw encoded image bytes
    Bytes(Vec<u8>),
    /// Base64 text, optionally with a `data:...;base64,` prefix
    Base64(String),
    /// File path, resolved against the configured image root when relative
    Path(PathBuf),
}

/// A value bound to a placeholder
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TemplateValue {
    /// Missing or null value
    #[default]
    Empty,
    /// Text; a leading `=` makes it a formula at insertion time
    Text(String),
    /// Number
    Number(f64),
    /// Boolean
    Bool(bool),
    /// Date/time, stored as a spreadsheet serial day count
    Date(NaiveDateTime),
    /// Formula expression, with or without the leading `=`
    Formula(String),
    /// Ordered list: array or table expansion
    List(Vec<TemplateValue>),
    /// Keyed record, consulted via dotted keys
    Map(BTreeMap<String, TemplateValue>),
    /// Image to embed
    Image(ImageSource),
}

impl TemplateValue {
    /// Build a [`TemplateValue::Map`] from key/value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<TemplateValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        TemplateValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a [`TemplateValue::List`] from anything convertible
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<TemplateValue>,
        I: IntoIterator<Item = V>,
    {
        TemplateValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Check if the value is empty (missing, null, or an empty string)
    pub fn is_empty(&self) -> bool {
        match self {
            TemplateValue::Empty => true,
            TemplateValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The list elements, if this is a list
    pub fn as_list(&self) -> Option<&[TemplateValue]> {
        match self {
            TemplateValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// The formula expression (without `=`), if this value inserts a formula
    pub fn formula(&self) -> Option<&str> {
        match self {
            TemplateValue::Formula(f) => Some(f.strip_prefix('=').unwrap_or(f)),
            TemplateValue::Text(s) => s.strip_prefix('='),
            _ => None,
        }
    }

    /// Field `key` of a map value; dotted keys descend into nested maps
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        let mut current = self;
        for part in key.split('.') {
            match current {
                TemplateValue::Map(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Text rendering used when a value is spliced into surrounding text
    ///
    /// Lists render their elements joined with `,`; maps and images render empty.
    pub fn to_text(&self) -> String {
        match self {
            TemplateValue::Empty => String::new(),
            TemplateValue::Text(s) => s.clone(),
            TemplateValue::Number(n) => format_number(*n),
            TemplateValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            TemplateValue::Date(d) => format_number(date_serial(d)),
            TemplateValue::Formula(f) => {
                if f.starts_with('=') {
                    f.clone()
                } else {
                    format!("={}", f)
                }
            }
            TemplateValue::List(items) => items
                .iter()
                .map(TemplateValue::to_text)
                .collect::<Vec<_>>()
                .join(","),
            TemplateValue::Map(_) | TemplateValue::Image(_) => String::new(),
        }
    }
}

/// Resolve a dotted path (`name` or `name.key.sub`) in a substitution map
pub fn lookup<'a>(values: &'a Substitutions, path: &str) -> Option<&'a TemplateValue> {
    match path.split_once('.') {
        Some((name, rest)) => values.get(name)?.get(rest),
        None => values.get(path),
    }
}

/// Spreadsheet serial day count for a date/time (1970-01-01 is 25569)
pub fn date_serial(date: &NaiveDateTime) -> f64 {
    date.and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY + EPOCH_OFFSET_DAYS
}

/// Format a number the way cell values store it (integers without a fraction)
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::Text(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::Text(s)
    }
}

impl From<f64> for TemplateValue {
    fn from(n: f64) -> Self {
        TemplateValue::Number(n)
    }
}

impl From<f32> for TemplateValue {
    fn from(n: f32) -> Self {
        TemplateValue::Number(n as f64)
    }
}

impl From<i32> for TemplateValue {
    fn from(n: i32) -> Self {
        TemplateValue::Number(n as f64)
    }
}

impl From<i64> for TemplateValue {
    fn from(n: i64) -> Self {
        TemplateValue::Number(n as f64)
    }
}

impl From<u32> for TemplateValue {
    fn from(n: u32) -> Self {
        TemplateValue::Number(n as f64)
    }
}

impl From<usize> for TemplateValue {
    fn from(n: usize) -> Self {
        TemplateValue::Number(n as f64)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

impl From<NaiveDateTime> for TemplateValue {
    fn from(d: NaiveDateTime) -> Self {
        TemplateValue::Date(d)
    }
}

impl From<NaiveDate> for TemplateValue {
    fn from(d: NaiveDate) -> Self {
        TemplateValue::Date(d.and_time(chrono::NaiveTime::default()))
    }
}

impl From<DateTime<Utc>> for TemplateValue {
    fn from(d: DateTime<Utc>) -> Self {
        TemplateValue::Date(d.naive_utc())
    }
}

impl From<ImageSource> for TemplateValue {
    fn from(src: ImageSource) -> Self {
        TemplateValue::Image(src)
    }
}

impl<V: Into<TemplateValue>> From<Vec<V>> for TemplateValue {
    fn from(items: Vec<V>) -> Self {
        TemplateValue::list(items)
    }
}

impl From<BTreeMap<String, TemplateValue>> for TemplateValue {
    fn from(map: BTreeMap<String, TemplateValue>) -> Self {
        TemplateValue::Map(map)
    }
}

impl<V: Into<TemplateValue>> From<Option<V>> for TemplateValue {
    fn from(v: Option<V>) -> Self {
        v.map(Into::into).unwrap_or(TemplateValue::Empty)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for TemplateValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => TemplateValue::Empty,
            Value::Bool(b) => TemplateValue::Bool(b),
            Value::Number(n) => n
                .as_f64()
                .map(TemplateValue::Number)
                .unwrap_or(TemplateValue::Empty),
            Value::String(s) => TemplateValue::Text(s),
            Value::Array(items) => {
                TemplateValue::List(items.into_iter().map(TemplateValue::from).collect())
            }
            Value::Object(map) => TemplateValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}
