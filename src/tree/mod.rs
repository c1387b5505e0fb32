//! Decoded tree values shared by every format adapter.
//!
//! Each adapter decodes its input into a [`TreeValue`]: a scalar, an ordered
//! sequence, or an insertion-ordered mapping. Classification, flattening and
//! error persistence all work on this one shape.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Type a textual cell the way tabular readers do.
    ///
    /// Empty text is `Null`, integers and decimals become numbers,
    /// `true`/`false` (lower, title or upper case) become booleans and
    /// anything else stays a string.
    pub fn infer(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Scalar::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Scalar::Int(i);
        }
        // `f64::from_str` also accepts "inf" and "NaN"; those stay strings.
        if trimmed.bytes().any(|b| b.is_ascii_digit())
            && let Ok(f) = trimmed.parse::<f64>()
        {
            return Scalar::Float(f);
        }
        match trimmed {
            "true" | "True" | "TRUE" => Scalar::Bool(true),
            "false" | "False" | "FALSE" => Scalar::Bool(false),
            _ => Scalar::Str(text.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text used when a scalar is written into a textual cell.
    ///
    /// Integral floats keep a trailing `.0` so they read back as floats.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Scalar::Str(s) => s.clone(),
        }
    }
}

/// Insertion-ordered string-keyed map.
///
/// Inserting an existing key replaces its value in place, keeping the
/// original position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    entries: Vec<(String, TreeValue)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&TreeValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TreeValue> {
        self.position(key).map(move |i| &mut self.entries[i].1)
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: TreeValue) -> Option<TreeValue> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<TreeValue> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &TreeValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Keep only the entries for which `keep(index, key)` returns true.
    pub fn retain_entries<P>(&mut self, mut keep: P)
    where
        P: FnMut(usize, &str) -> bool,
    {
        let mut index = 0;
        self.entries.retain(|(k, _)| {
            let kept = keep(index, k);
            index += 1;
            kept
        });
    }
}

impl FromIterator<(String, TreeValue)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, TreeValue)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (String, TreeValue);
    type IntoIter = std::vec::IntoIter<(String, TreeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A decoded unit: scalar, list, or key-value map.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue {
    Scalar(Scalar),
    Sequence(Vec<TreeValue>),
    Mapping(Mapping),
}

impl Default for TreeValue {
    fn default() -> Self {
        TreeValue::NULL
    }
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

impl TreeValue {
    pub const NULL: TreeValue = TreeValue::Scalar(Scalar::Null);

    pub fn is_null(&self) -> bool {
        matches!(self, TreeValue::Scalar(Scalar::Null))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            TreeValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[TreeValue]> {
        match self {
            TreeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            TreeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TreeValue::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TreeValue::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TreeValue::Scalar(Scalar::Float(f)) => Some(*f),
            TreeValue::Scalar(Scalar::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TreeValue::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            TreeValue::Scalar(Scalar::Null) => "null",
            TreeValue::Scalar(Scalar::Bool(_)) => "bool",
            TreeValue::Scalar(Scalar::Int(_)) => "integer",
            TreeValue::Scalar(Scalar::Float(_)) => "float",
            TreeValue::Scalar(Scalar::Str(_)) => "string",
            TreeValue::Sequence(_) => "list",
            TreeValue::Mapping(_) => "mapping",
        }
    }

    /// Look up a `/`-separated path. Numeric segments index into lists.
    /// An empty path addresses the value itself.
    pub fn get_path(&self, path: &str) -> Option<&TreeValue> {
        let mut current = self;
        for segment in path_segments(path) {
            current = match current {
                TreeValue::Mapping(map) => map.get(segment)?,
                TreeValue::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
                TreeValue::Scalar(_) => return None,
            };
        }
        Some(current)
    }

    pub fn get_path_mut(&mut self, path: &str) -> Option<&mut TreeValue> {
        let mut current = self;
        for segment in path_segments(path) {
            current = match current {
                TreeValue::Mapping(map) => map.get_mut(segment)?,
                TreeValue::Sequence(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                TreeValue::Scalar(_) => return None,
            };
        }
        Some(current)
    }

    /// Consume the value and return the sub-value at `path`.
    pub fn into_path(self, path: &str) -> Option<TreeValue> {
        let mut current = self;
        for segment in path_segments(path) {
            current = match current {
                TreeValue::Mapping(mut map) => map.remove(segment)?,
                TreeValue::Sequence(items) => {
                    let index = segment.parse::<usize>().ok()?;
                    items.into_iter().nth(index)?
                }
                TreeValue::Scalar(_) => return None,
            };
        }
        Some(current)
    }

    /// Deterministic text form: strings pass through, everything else is
    /// compact JSON.
    pub fn to_canonical_text(&self) -> Result<String, serde_json::Error> {
        match self {
            TreeValue::Scalar(Scalar::Str(s)) => Ok(s.clone()),
            other => serde_json::to_string(other),
        }
    }

    /// Text for a single cell of a textual table (CSV, XML leaf).
    pub fn cell_text(&self) -> String {
        match self {
            TreeValue::Scalar(s) => s.to_text(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl fmt::Display for TreeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl From<Scalar> for TreeValue {
    fn from(value: Scalar) -> Self {
        TreeValue::Scalar(value)
    }
}

impl From<Mapping> for TreeValue {
    fn from(value: Mapping) -> Self {
        TreeValue::Mapping(value)
    }
}

impl From<Vec<TreeValue>> for TreeValue {
    fn from(value: Vec<TreeValue>) -> Self {
        TreeValue::Sequence(value)
    }
}

impl From<&str> for TreeValue {
    fn from(value: &str) -> Self {
        TreeValue::Scalar(Scalar::Str(value.to_string()))
    }
}

impl From<String> for TreeValue {
    fn from(value: String) -> Self {
        TreeValue::Scalar(Scalar::Str(value))
    }
}

impl From<i64> for TreeValue {
    fn from(value: i64) -> Self {
        TreeValue::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for TreeValue {
    fn from(value: f64) -> Self {
        TreeValue::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for TreeValue {
    fn from(value: bool) -> Self {
        TreeValue::Scalar(Scalar::Bool(value))
    }
}

impl Serialize for TreeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeValue::Scalar(Scalar::Null) => serializer.serialize_unit(),
            TreeValue::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            TreeValue::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            TreeValue::Scalar(Scalar::Float(f)) => serializer.serialize_f64(*f),
            TreeValue::Scalar(Scalar::Str(s)) => serializer.serialize_str(s),
            TreeValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TreeValue::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

struct TreeValueVisitor;

impl<'de> Visitor<'de> for TreeValueVisitor {
    type Value = TreeValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, list or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<TreeValue, E> {
        Ok(TreeValue::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TreeValue, E> {
        Ok(TreeValue::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TreeValue, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => TreeValue::from(i),
            Err(_) => TreeValue::from(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TreeValue, E> {
        Ok(TreeValue::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TreeValue, E> {
        Ok(TreeValue::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<TreeValue, E> {
        Ok(TreeValue::from(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<TreeValue, E> {
        Ok(TreeValue::NULL)
    }

    fn visit_unit<E: de::Error>(self) -> Result<TreeValue, E> {
        Ok(TreeValue::NULL)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<TreeValue, D::Error> {
        TreeValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TreeValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<TreeValue>()? {
            items.push(item);
        }
        Ok(TreeValue::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TreeValue, A::Error> {
        let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, TreeValue>()? {
            map.insert(k, v);
        }
        Ok(TreeValue::Mapping(map))
    }
}

impl<'de> Deserialize<'de> for TreeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TreeValueVisitor)
    }
}
