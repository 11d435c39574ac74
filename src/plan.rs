//! Action planning: hazard set + risk level -> ordered remediation steps.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::HazardCatalog;
use crate::hazard::{HazardLabel, HazardSet};
use crate::risk::RiskLevel;

/// Directive appended whenever the cycle is classified High.
pub const HIGH_RISK_DIRECTIVE: &str = "Notify safety officer immediately";

/// What caused a step to be included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTrigger {
    Hazard(HazardLabel),
    HighRisk,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionStep {
    pub trigger: ActionTrigger,
    pub instruction: String,
}

impl fmt::Display for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.instruction)
    }
}

/// Derives plans in catalog order, independent of detector emission order.
#[derive(Clone, Debug)]
pub struct ActionPlanner {
    catalog: Arc<HazardCatalog>,
}

impl ActionPlanner {
    pub fn new(catalog: Arc<HazardCatalog>) -> Self {
        Self { catalog }
    }

    pub fn plan(&self, hazards: &HazardSet, level: RiskLevel) -> Vec<ActionStep> {
        let mut steps: Vec<ActionStep> = self
            .catalog
            .entries()
            .filter(|entry| hazards.contains(entry.label))
            .filter_map(|entry| {
                entry.action.as_ref().map(|action| ActionStep {
                    trigger: ActionTrigger::Hazard(entry.label),
                    instruction: action.clone(),
                })
            })
            .collect();

        if level == RiskLevel::High {
            steps.push(ActionStep {
                trigger: ActionTrigger::HighRisk,
                instruction: HIGH_RISK_DIRECTIVE.to_string(),
            });
        }
        steps
    }
}

impl Default for ActionPlanner {
    fn default() -> Self {
        Self::new(Arc::new(HazardCatalog::default()))
    }
}

/// Instruction text of each step, in order.
pub fn instructions(steps: &[ActionStep]) -> Vec<&str> {
    steps.iter().map(|step| step.instruction.as_str()).collect()
}
