//! Filter selection and matching.
//!
//! A [`FilterSelection`] holds one [`SelectionGroup`] per filter key. Each
//! group remembers the domain it was built from (for rendering checkboxes)
//! and the set of values currently selected.
//!
//! Key invariants:
//! - A fresh selection has every domain value selected, so it matches everything
//! - A record matches only if its value for EVERY key is selected
//! - An empty selected-set matches nothing (not "no filter")
//! - A record lacking a key never matches that key
//! - `matches` is pure; output order is catalog order

use std::collections::HashSet;

use crate::catalog::{KeyScope, ModelCatalog};
use crate::error::EngineError;
use crate::record::ModelRecord;

// =============================================================================
// SelectionGroup
// =============================================================================

/// Selected values for one filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionGroup {
    key: String,
    /// Values discovered in the catalog, first-seen order.
    domain: Vec<String>,
    selected: HashSet<String>,
}

impl SelectionGroup {
    fn fully_selected(key: String, domain: Vec<String>) -> Self {
        let selected = domain.iter().cloned().collect();
        Self { key, domain, selected }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.contains(value)
    }

    /// Selected values in domain order (values toggled in from outside the
    /// domain are not listed).
    pub fn selected_values(&self) -> Vec<&str> {
        self.domain
            .iter()
            .filter(|v| self.selected.contains(*v))
            .map(String::as_str)
            .collect()
    }

    pub fn is_fully_selected(&self) -> bool {
        self.domain.iter().all(|v| self.selected.contains(v))
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn toggle(&mut self, value: &str) -> bool {
        if self.selected.remove(value) {
            false
        } else {
            self.selected.insert(value.to_string());
            true
        }
    }

    fn accepts(&self, record: &ModelRecord) -> bool {
        record
            .value_of(&self.key)
            .is_some_and(|v| self.selected.contains(v))
    }
}

// =============================================================================
// FilterSelection
// =============================================================================

/// Per-key selected-value sets. Mutated on every user toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    groups: Vec<SelectionGroup>,
}

impl FilterSelection {
    /// Everything selected, keys from the first record.
    pub fn initialize(catalog: &ModelCatalog) -> Result<Self, EngineError> {
        Self::initialize_with(catalog, KeyScope::First)
    }

    pub fn initialize_with(catalog: &ModelCatalog, scope: KeyScope) -> Result<Self, EngineError> {
        let groups = catalog
            .attribute_keys_with(scope)?
            .into_iter()
            .map(|key| {
                let domain = catalog.distinct_values(&key);
                SelectionGroup::fully_selected(key, domain)
            })
            .collect();
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[SelectionGroup] {
        &self.groups
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key())
    }

    pub fn group(&self, key: &str) -> Option<&SelectionGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    fn group_mut(&mut self, key: &str) -> Result<&mut SelectionGroup, EngineError> {
        self.groups
            .iter_mut()
            .find(|g| g.key == key)
            .ok_or_else(|| EngineError::UnknownAttribute(key.to_string()))
    }

    pub fn is_selected(&self, key: &str, value: &str) -> bool {
        self.group(key).is_some_and(|g| g.is_selected(value))
    }

    /// Flip `value` for `key`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, key: &str, value: &str) -> Result<bool, EngineError> {
        let now = self.group_mut(key)?.toggle(value);
        log::debug!("toggle {key}={value} -> {now}");
        Ok(now)
    }

    pub fn select_all(&mut self, key: &str) -> Result<(), EngineError> {
        let group = self.group_mut(key)?;
        group.selected.extend(group.domain.iter().cloned());
        Ok(())
    }

    pub fn deselect_all(&mut self, key: &str) -> Result<(), EngineError> {
        self.group_mut(key)?.selected.clear();
        Ok(())
    }

    /// Toggle every domain value of `key`.
    pub fn invert(&mut self, key: &str) -> Result<(), EngineError> {
        let group = self.group_mut(key)?;
        let domain = group.domain.clone();
        for value in &domain {
            group.toggle(value);
        }
        Ok(())
    }

    /// Replace the selected set for `key` with exactly `values`.
    pub fn restrict<I, S>(&mut self, key: &str, values: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = self.group_mut(key)?;
        group.selected = values.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// True when no group narrows the catalog.
    pub fn is_unfiltered(&self) -> bool {
        self.groups.iter().all(SelectionGroup::is_fully_selected)
    }

    pub fn accepts(&self, record: &ModelRecord) -> bool {
        self.groups.iter().all(|g| g.accepts(record))
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Records accepted by `selection`, in catalog order.
pub fn matches<'a>(catalog: &'a ModelCatalog, selection: &FilterSelection) -> Vec<&'a ModelRecord> {
    catalog.iter().filter(|r| selection.accepts(r)).collect()
}

// =============================================================================
// Tests
// =============================================================================
