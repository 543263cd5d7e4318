//! Extracted form data and street-matching primitives.

use std::collections::HashMap;

/// Values captured from the legacy form, keyed by field name (falling
/// back to element id when the name is missing).
///
/// The itinerary street list is carried as its own field so it can never
/// collide with a real form field and never shows up when iterating the
/// plain values.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    pub values: HashMap<String, String>,
    pub itinerary: Vec<String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.itinerary.is_empty()
    }

    /// Field count as reported in progress messages; a non-empty
    /// itinerary counts as one field.
    pub fn field_count(&self) -> usize {
        self.values.len() + usize::from(!self.itinerary.is_empty())
    }
}

/// One option from the street dropdown, as (visible label, form value).
#[derive(Debug, Clone, PartialEq)]
pub struct StreetCandidate {
    pub label: String,
    pub value: String,
}

impl StreetCandidate {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Outcome of matching one itinerary entry against the dropdown options.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    Match { value: String, score: f64 },
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}
