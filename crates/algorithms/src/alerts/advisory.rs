//! Label to advisory text lookup

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Advisory text per predicted label.
///
/// Labels without an entry get a generic field-inspection advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdvisoryTable {
    entries: BTreeMap<String, String>,
}

impl Default for AdvisoryTable {
    fn default() -> Self {
        Self::empty()
            .with_entry(
                "stressed",
                "Water stress detected: schedule irrigation and check soil moisture",
            )
            .with_entry(
                "saline",
                "Soil salinity detected: apply leaching irrigation and improve drainage",
            )
            .with_entry("healthy", "Crop healthy: no action required")
    }
}

impl AdvisoryTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, label: impl Into<String>, advisory: impl Into<String>) -> Self {
        self.entries.insert(label.into(), advisory.into());
        self
    }

    /// Overlay `overrides` on this table; entries in `overrides` win
    pub fn merged(mut self, overrides: &BTreeMap<String, String>) -> Self {
        self.entries
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Advisory for `label`, falling back to a generic inspection notice
    pub fn advisory_for(&self, label: &str) -> String {
        match self.get(label) {
            Some(text) => text.to_string(),
            None => format!("Condition '{}' detected: inspect the field", label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entries() {
        let table = AdvisoryTable::default();
        assert!(table.advisory_for("stressed").contains("irrigation"));
        assert!(table.advisory_for("saline").contains("leaching"));
        assert!(table.advisory_for("healthy").contains("no action"));
    }

    #[test]
    fn test_unknown_label_is_generic() {
        let text = AdvisoryTable::default().advisory_for("waterlogged");
        assert!(text.contains("waterlogged"));
        assert!(text.contains("inspect"));
    }

    #[test]
    fn test_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("healthy".to_string(), "Keep monitoring".to_string());
        overrides.insert("pest".to_string(), "Scout for pests".to_string());

        let table = AdvisoryTable::default().merged(&overrides);
        assert_eq!(table.get("healthy"), Some("Keep monitoring"));
        assert_eq!(table.get("pest"), Some("Scout for pests"));
        assert!(table.get("stressed").is_some());
    }
}
