//! Hazard labels and per-cycle hazard sets.
//!
//! The label set is closed: adding a hazard category means adding a variant here and a
//! default entry in the catalog.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A recognized hazard category.
///
/// Variant order is the canonical catalog order and the detector class order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardLabel {
    GasCylinder,
    ElectricalFire,
    IndustrialFire,
    Ppe,
}

impl HazardLabel {
    /// All labels in canonical order.
    pub const ALL: [HazardLabel; 4] = [
        HazardLabel::GasCylinder,
        HazardLabel::ElectricalFire,
        HazardLabel::IndustrialFire,
        HazardLabel::Ppe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardLabel::GasCylinder => "gas_cylinder",
            HazardLabel::ElectricalFire => "electrical_fire",
            HazardLabel::IndustrialFire => "industrial_fire",
            HazardLabel::Ppe => "ppe",
        }
    }

    /// Map a detector class index to a label. Indices past the known classes yield `None`.
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn class_index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for HazardLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardLabel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == normalized)
            .ok_or_else(|| anyhow!("unrecognized hazard label '{}'", value))
    }
}

/// Everything detected in one evaluation cycle.
///
/// Duplicates collapse and iteration always follows canonical label order, so two sets
/// built from the same labels in any emission order compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardSet {
    labels: BTreeSet<HazardLabel>,
}

impl HazardSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw detector label names.
    ///
    /// Unrecognized names are skipped with a warning; they never fail the cycle.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            match name.parse::<HazardLabel>() {
                Ok(label) => {
                    labels.insert(label);
                }
                Err(_) => log::warn!("ignoring unrecognized hazard label: {}", name),
            }
        }
        Self { labels }
    }

    pub fn contains(&self, label: HazardLabel) -> bool {
        self.labels.contains(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = HazardLabel> + '_ {
        self.labels.iter().copied()
    }

    pub fn is_subset(&self, other: &HazardSet) -> bool {
        self.labels.is_subset(&other.labels)
    }

    /// Label names joined with ", " in canonical order.
    pub fn joined(&self) -> String {
        self.iter()
            .map(|label| label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<HazardLabel> for HazardSet {
    fn from_iter<T: IntoIterator<Item = HazardLabel>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HazardSet {
    type Item = HazardLabel;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, HazardLabel>>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter().copied()
    }
}

impl fmt::Display for HazardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&self.joined())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!(
            "Gas_Cylinder".parse::<HazardLabel>().unwrap(),
            HazardLabel::GasCylinder
        );
        assert_eq!(" ppe ".parse::<HazardLabel>().unwrap(), HazardLabel::Ppe);
        assert!("forklift".parse::<HazardLabel>().is_err());
    }

    #[test]
    fn class_indices_follow_canonical_order() {
        for (index, label) in HazardLabel::ALL.iter().enumerate() {
            assert_eq!(label.class_index(), index);
            assert_eq!(HazardLabel::from_class_index(index), Some(*label));
        }
        assert_eq!(HazardLabel::from_class_index(4), None);
    }

    #[test]
    fn from_names_collapses_duplicates_and_skips_unknown() {
        let set = HazardSet::from_names(["ppe", "forklift", "ppe", "industrial_fire"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(HazardLabel::Ppe));
        assert!(set.contains(HazardLabel::IndustrialFire));
    }

    #[test]
    fn equality_ignores_emission_order() {
        let a = HazardSet::from_names(["ppe", "gas_cylinder"]);
        let b = HazardSet::from_names(["gas_cylinder", "ppe"]);
        assert_eq!(a, b);
        assert_eq!(a.joined(), "gas_cylinder, ppe");
    }

    #[test]
    fn serializes_as_label_list() {
        let set = HazardSet::from_names(["electrical_fire"]);
        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(json, r#"["electrical_fire"]"#);
    }
}
