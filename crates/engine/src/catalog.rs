//! Model catalog: every parsed record for one directory selection, plus the
//! attribute domains that drive the filter controls.
//!
//! Key invariants:
//! - Record order is file-iteration order; nothing is deduplicated
//! - Only files named exactly like the marker become records
//! - Filter keys come from the first record unless [`KeyScope::Union`] is asked for

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, TitleIssue};
use crate::parser::NameParser;
use crate::record::{FileDescriptor, ModelRecord, RESERVED_KEYS, TYPE_KEY};

/// Sentinel file present exactly once in every checkpoint run directory.
pub const DEFAULT_MARKER_FILENAME: &str = "model.ckpt.meta";

/// Which records contribute filter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    /// Keys of the first record only; later records' extra keys are not offered.
    #[default]
    First,
    /// Keys of every record, in first-seen order.
    Union,
}

/// A lenient-mode title problem, tied to the record it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub title: String,
    pub issue: TitleIssue,
}

/// One entry of an attribute domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    /// Number of records carrying this value.
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    records: Vec<ModelRecord>,
    issues: Vec<CatalogIssue>,
}

impl ModelCatalog {
    /// Parse every marker file in `files`, in order.
    ///
    /// An empty result is not an error here; asking an empty catalog for its
    /// keys is.
    pub fn build(
        files: &[FileDescriptor],
        marker_filename: &str,
        parser: &NameParser,
    ) -> Result<Self, EngineError> {
        let mut catalog = Self::default();
        for file in files.iter().filter(|f| f.name == marker_filename) {
            let parsed = parser.parse(&file.relative_path)?;
            for issue in parsed.issues {
                log::warn!("{}: {}", parsed.record.title(), issue);
                catalog.issues.push(CatalogIssue {
                    title: parsed.record.title().to_string(),
                    issue,
                });
            }
            catalog.records.push(parsed.record);
        }
        log::debug!(
            "catalog built: {} of {} files matched marker '{}'",
            catalog.records.len(),
            files.len(),
            marker_filename
        );
        Ok(catalog)
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Title problems met while building (lenient mode only).
    pub fn issues(&self) -> &[CatalogIssue] {
        &self.issues
    }

    /// Filter keys: `type` followed by the first record's attribute keys.
    pub fn attribute_keys(&self) -> Result<Vec<String>, EngineError> {
        self.attribute_keys_with(KeyScope::First)
    }

    pub fn attribute_keys_with(&self, scope: KeyScope) -> Result<Vec<String>, EngineError> {
        let first = self.records.first().ok_or(EngineError::EmptyCatalog)?;
        let sources: &[ModelRecord] = match scope {
            KeyScope::First => std::slice::from_ref(first),
            KeyScope::Union => &self.records,
        };

        let mut keys = vec![TYPE_KEY.to_string()];
        for record in sources {
            for key in record.attributes().keys() {
                if RESERVED_KEYS.contains(&key) || keys.iter().any(|k| k == key) {
                    continue;
                }
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    /// Distinct values of `key`, in first-seen order.
    pub fn distinct_values(&self, key: &str) -> Vec<String> {
        self.value_counts(key).into_iter().map(|v| v.value).collect()
    }

    /// Distinct values of `key` with occurrence counts, in first-seen order.
    /// Records without the key contribute nothing.
    pub fn value_counts(&self, key: &str) -> Vec<ValueCount> {
        let mut entries: Vec<ValueCount> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for value in self.records.iter().filter_map(|r| r.value_of(key)) {
            match index.get(value) {
                Some(&i) => entries[i].count += 1,
                None => {
                    index.insert(value, entries.len());
                    entries.push(ValueCount { value: value.to_string(), count: 1 });
                }
            }
        }
        entries
    }
}

impl<'a> IntoIterator for &'a ModelCatalog {
    type Item = &'a ModelRecord;
    type IntoIter = std::slice::Iter<'a, ModelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
