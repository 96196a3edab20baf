//! Wind load: exposure from neighborhood shielding

use serde_json::json;
use site_types::{AuditResult, Building, Constraint, ConstraintType, Context, EvaluatorKind, Severity};

use super::Evaluator;
use crate::config::WindRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shielding {
    High,
    Medium,
    Low,
}

impl Shielding {
    fn as_str(&self) -> &'static str {
        match self {
            Shielding::High => "high",
            Shielding::Medium => "medium",
            Shielding::Low => "low",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindEvaluator {
    rules: WindRules,
}

impl WindEvaluator {
    pub fn new(rules: WindRules) -> Self {
        Self { rules }
    }

    pub fn shielding(&self, neighbors: usize) -> Shielding {
        if neighbors >= self.rules.high_min_neighbors {
            Shielding::High
        } else if neighbors >= self.rules.medium_min_neighbors {
            Shielding::Medium
        } else {
            Shielding::Low
        }
    }
}

impl Evaluator for WindEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Wind
    }

    fn execute(&self, building: &Building, context: &Context) -> AuditResult {
        let rules = &self.rules;
        let neighbors = context.shielding_count;
        let shielding = self.shielding(neighbors);
        let tall = building.height > rules.tall_height;

        let mut constraints = Vec::new();
        let (passed, score) = match shielding {
            Shielding::High => (true, rules.high_score),
            Shielding::Medium => (true, rules.medium_score),
            // Override, not an extra penalty
            Shielding::Low if tall => {
                constraints.push(Constraint::new(
                    ConstraintType::WindExposure,
                    Severity::Critical,
                    format!(
                        "{:.1}m building with only {} shielding neighbors; wind tunnel study and \
                         facade reinforcement required",
                        building.height, neighbors
                    ),
                    json!({ "neighbors": neighbors, "height": building.height }),
                ));
                (false, rules.exposed_tall_score)
            }
            Shielding::Low => {
                constraints.push(Constraint::new(
                    ConstraintType::WindExposure,
                    Severity::Warning,
                    format!("Exposed site with only {} shielding neighbors", neighbors),
                    json!({ "neighbors": neighbors }),
                ));
                (true, rules.low_score)
            }
        };

        let mut result = AuditResult::new(EvaluatorKind::Wind, passed, score);
        result.constraints = constraints;
        result.data.insert("shielding".into(), json!(shielding.as_str()));
        result.data.insert("neighbors".into(), json!(neighbors));
        result
    }
}
