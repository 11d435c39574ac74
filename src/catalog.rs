//! Hazard catalog: label -> risk weight and remediation action.

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::hazard::HazardLabel;

/// One catalog row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub label: HazardLabel,
    pub weight: u32,
    pub action: Option<String>,
}

impl CatalogEntry {
    pub fn new(label: HazardLabel, weight: u32, action: impl Into<String>) -> Self {
        Self {
            label,
            weight,
            action: Some(action.into()),
        }
    }
}

/// Immutable registry binding every hazard label to exactly one weight.
///
/// Entries are stored in canonical label order, which is also the iteration order used by
/// the action planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HazardCatalog {
    entries: [CatalogEntry; 4],
}

impl HazardCatalog {
    /// Build a catalog from overrides. Labels without an override keep their default row.
    ///
    /// Fails if a label is listed more than once.
    pub fn with_overrides(overrides: Vec<CatalogEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut catalog = Self::default();
        for entry in overrides {
            if !seen.insert(entry.label) {
                return Err(anyhow!("duplicate catalog entry for '{}'", entry.label));
            }
            let index = entry.label.class_index();
            catalog.entries[index] = entry;
        }
        Ok(catalog)
    }

    pub fn weight_of(&self, label: HazardLabel) -> u32 {
        self.entry(label).weight
    }

    /// Weight lookup by raw detector name; unknown names weigh zero.
    pub fn weight_of_name(&self, name: &str) -> u32 {
        name.parse::<HazardLabel>()
            .map(|label| self.weight_of(label))
            .unwrap_or(0)
    }

    pub fn action_for(&self, label: HazardLabel) -> Option<&str> {
        self.entry(label).action.as_deref()
    }

    pub fn entry(&self, label: HazardLabel) -> &CatalogEntry {
        &self.entries[label.class_index()]
    }

    /// Entries in canonical order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

impl Default for HazardCatalog {
    fn default() -> Self {
        Self {
            entries: [
                CatalogEntry::new(
                    HazardLabel::GasCylinder,
                    30,
                    "Check cylinder valve and isolate area",
                ),
                CatalogEntry::new(
                    HazardLabel::ElectricalFire,
                    40,
                    "Cut power supply and use extinguisher",
                ),
                CatalogEntry::new(
                    HazardLabel::IndustrialFire,
                    50,
                    "Activate fire alarm and evacuate",
                ),
                CatalogEntry::new(HazardLabel::Ppe, 10, "Ensure workers wear proper PPE"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_match_reference_table() {
        let catalog = HazardCatalog::default();
        assert_eq!(catalog.weight_of(HazardLabel::GasCylinder), 30);
        assert_eq!(catalog.weight_of(HazardLabel::ElectricalFire), 40);
        assert_eq!(catalog.weight_of(HazardLabel::IndustrialFire), 50);
        assert_eq!(catalog.weight_of(HazardLabel::Ppe), 10);
    }

    #[test]
    fn every_label_has_an_action() {
        let catalog = HazardCatalog::default();
        for label in HazardLabel::ALL {
            assert!(catalog.action_for(label).is_some(), "{label} has no action");
        }
        assert_eq!(
            catalog.action_for(HazardLabel::Ppe),
            Some("Ensure workers wear proper PPE")
        );
    }

    #[test]
    fn entries_follow_canonical_order() {
        let catalog = HazardCatalog::default();
        let labels: Vec<_> = catalog.entries().map(|entry| entry.label).collect();
        assert_eq!(labels, HazardLabel::ALL.to_vec());
    }

    #[test]
    fn unknown_names_weigh_zero() {
        let catalog = HazardCatalog::default();
        assert_eq!(catalog.weight_of_name("forklift"), 0);
        assert_eq!(catalog.weight_of_name(""), 0);
        assert_eq!(catalog.weight_of_name("ppe"), 10);
    }

    #[test]
    fn overrides_replace_only_listed_labels() {
        let catalog = HazardCatalog::with_overrides(vec![CatalogEntry {
            label: HazardLabel::Ppe,
            weight: 25,
            action: None,
        }])
        .expect("catalog");
        assert_eq!(catalog.weight_of(HazardLabel::Ppe), 25);
        assert_eq!(catalog.action_for(HazardLabel::Ppe), None);
        assert_eq!(catalog.weight_of(HazardLabel::GasCylinder), 30);
    }

    #[test]
    fn duplicate_overrides_are_rejected() {
        let err = HazardCatalog::with_overrides(vec![
            CatalogEntry::new(HazardLabel::Ppe, 10, "a"),
            CatalogEntry::new(HazardLabel::Ppe, 20, "b"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
