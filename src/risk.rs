//! Risk scoring: hazard set -> (score, level).

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::HazardCatalog;
use crate::hazard::HazardSet;

pub const DEFAULT_MEDIUM_THRESHOLD: u32 = 20;
pub const DEFAULT_HIGH_THRESHOLD: u32 = 50;

/// Tiered classification of a risk score. Ordered `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive lower bounds of the Medium and High tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RiskThresholds {
    pub medium: u32,
    pub high: u32,
}

impl RiskThresholds {
    pub fn new(medium: u32, high: u32) -> Result<Self> {
        if medium >= high {
            return Err(anyhow!(
                "medium threshold ({}) must be below high threshold ({})",
                medium,
                high
            ));
        }
        Ok(Self { medium, high })
    }

    pub fn classify(&self, score: u32) -> RiskLevel {
        if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

/// Score and level for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
}

/// Stateless evaluator over a shared catalog.
#[derive(Clone, Debug)]
pub struct RiskEvaluator {
    catalog: Arc<HazardCatalog>,
    thresholds: RiskThresholds,
}

impl RiskEvaluator {
    pub fn new(catalog: Arc<HazardCatalog>, thresholds: RiskThresholds) -> Self {
        Self {
            catalog,
            thresholds,
        }
    }

    pub fn evaluate(&self, hazards: &HazardSet) -> RiskAssessment {
        let score = hazards
            .iter()
            .map(|label| self.catalog.weight_of(label))
            .fold(0u32, u32::saturating_add);
        RiskAssessment {
            score,
            level: self.thresholds.classify(score),
        }
    }

    pub fn catalog(&self) -> &HazardCatalog {
        &self.catalog
    }

    pub fn thresholds(&self) -> RiskThresholds {
        self.thresholds
    }
}

impl Default for RiskEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(HazardCatalog::default()), RiskThresholds::default())
    }
}
