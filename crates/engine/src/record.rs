//! Parsed checkpoint folders and the file descriptors they come from.

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Layout the checkpoint writer uses for the per-run directory name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// The filter key that reads [`ModelRecord::model_type`] instead of an attribute.
pub const TYPE_KEY: &str = "type";

/// Record fields that are never offered as filter keys.
pub const RESERVED_KEYS: [&str; 2] = ["timestamp", "title"];

// =============================================================================
// FileDescriptor
// =============================================================================

/// One file from a directory selection.
///
/// `relative_path` has the shape `<root>/<modelTitle>/<timestamp>/<filename>`,
/// the same shape a browser directory picker reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub relative_path: String,
    pub name: String,
}

impl FileDescriptor {
    /// Build a descriptor, taking the base name from the last path segment.
    pub fn from_relative_path(relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self { relative_path, name }
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Key/value pairs read from a folder title, in first-insertion order.
///
/// Re-inserting a key replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Returns true when an existing value was replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            true
        } else {
            self.entries.push((key, value));
            false
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// =============================================================================
// ModelRecord
// =============================================================================

/// Structured view of one checkpoint directory name. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModelRecord {
    title: String,
    timestamp: String,
    #[serde(rename = "type")]
    model_type: String,
    attributes: Attributes,
    path: String,
}

impl ModelRecord {
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        timestamp: impl Into<String>,
        model_type: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            title: title.into(),
            timestamp: timestamp.into(),
            model_type: model_type.into(),
            attributes,
            path: path.into(),
        }
    }

    /// Raw folder name; the model's external identifier.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Run directory name. Display-only.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Relative path of the marker file this record was parsed from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value a filter on `key` compares against.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        if key == TYPE_KEY {
            Some(&self.model_type)
        } else {
            self.attributes.get(key)
        }
    }

    /// Timestamp parsed with [`TIMESTAMP_FORMAT`], if it has that layout.
    pub fn started_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}
