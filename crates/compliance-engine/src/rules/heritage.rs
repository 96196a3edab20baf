//! Heritage: world heritage buffer zone ceiling and landmark proximity
//!
//! Unlike zoning, the buffer zone ceiling is absolute; there is no
//! contextual variance.

use serde_json::json;
use site_types::{AuditResult, Building, Constraint, ConstraintType, Context, EvaluatorKind, Severity};

use super::{round1, Evaluator, BASELINE_SCORE};
use crate::config::HeritageRules;
use crate::geo::{distance, point_in_polygon};

const CEILING_PENALTY: i32 = 50;
const REVIEW_PENALTY: i32 = 5;
const LANDMARK_PENALTY: i32 = 10;

#[derive(Debug, Clone)]
pub struct HeritageEvaluator {
    rules: HeritageRules,
}

impl HeritageEvaluator {
    pub fn new(rules: HeritageRules) -> Self {
        Self { rules }
    }
}

impl Evaluator for HeritageEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Heritage
    }

    fn execute(&self, building: &Building, _context: &Context) -> AuditResult {
        let mut score = BASELINE_SCORE;
        let mut constraints = Vec::new();

        let in_buffer_zone = point_in_polygon(building.position, &self.rules.unesco_zone);
        if in_buffer_zone {
            if building.height > self.rules.max_height {
                score -= CEILING_PENALTY;
                constraints.push(Constraint::new(
                    ConstraintType::UnescoHeight,
                    Severity::Blocking,
                    format!(
                        "Height {:.1}m exceeds the {:.1}m ceiling of the world heritage buffer zone",
                        building.height, self.rules.max_height
                    ),
                    json!({ "limit": self.rules.max_height, "actual": building.height }),
                ));
            } else if building.height > self.rules.review_height {
                score -= REVIEW_PENALTY;
                constraints.push(Constraint::new(
                    ConstraintType::UnescoReview,
                    Severity::Warning,
                    format!(
                        "Height {:.1}m inside the world heritage buffer zone triggers enhanced \
                         review above {:.1}m",
                        building.height, self.rules.review_height
                    ),
                    json!({ "threshold": self.rules.review_height, "actual": building.height }),
                ));
            }
        }

        let mut nearby = Vec::new();
        for landmark in &self.rules.landmarks {
            let d = distance(building.position, landmark.position);
            if d <= landmark.radius {
                score -= LANDMARK_PENALTY;
                nearby.push(landmark.name.as_str());
                constraints.push(Constraint::new(
                    ConstraintType::LandmarkProximity,
                    Severity::Important,
                    format!(
                        "Site is {:.0}m from {} (protection radius {:.0}m)",
                        d, landmark.name, landmark.radius
                    ),
                    json!({
                        "landmark": landmark.name,
                        "distance": round1(d),
                        "radius": landmark.radius,
                    }),
                ));
            }
        }

        let passed = !constraints.iter().any(|c| c.severity == Severity::Blocking);
        let mut result = AuditResult::new(EvaluatorKind::Heritage, passed, score);
        result.constraints = constraints;
        result.data.insert("inBufferZone".into(), json!(in_buffer_zone));
        result.data.insert("nearbyLandmarks".into(), json!(nearby));
        result
    }
}
