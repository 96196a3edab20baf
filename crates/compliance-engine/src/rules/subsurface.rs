//! Subsurface: proximity to underground transit and basement depth clearance
//!
//! Station coordinates stand in for the tunnel alignment. The depth check is
//! independent of the horizontal distance band.

use serde_json::json;
use site_types::{AuditResult, Building, Constraint, ConstraintType, Context, EvaluatorKind, Severity};

use super::{round1, Evaluator, BASELINE_SCORE};
use crate::config::{SubsurfaceRules, TransitLine};
use crate::geo::{nearest_line_distance, nearest_segment_distance};

const CRITICAL_PENALTY: i32 = 50;
const RESTRICTED_PENALTY: i32 = 30;
const MONITORING_PENALTY: i32 = 10;
const DEPTH_CONFLICT_PENALTY: i32 = 20;

#[derive(Debug, Clone)]
pub struct SubsurfaceEvaluator {
    rules: SubsurfaceRules,
}

impl SubsurfaceEvaluator {
    pub fn new(rules: SubsurfaceRules) -> Self {
        Self { rules }
    }

    /// Closest line and its distance; the first line wins ties
    fn nearest_line(&self, building: &Building) -> Option<(&TransitLine, f64)> {
        self.rules
            .lines
            .iter()
            .map(|line| {
                let d = if self.rules.segment_distance {
                    nearest_segment_distance(building.position, &line.stations)
                } else {
                    nearest_line_distance(building.position, [line.stations.as_slice()])
                };
                (line, d)
            })
            .filter(|(_, d)| d.is_finite())
            .fold(None, |best: Option<(&TransitLine, f64)>, (line, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((line, d)),
            })
    }

    fn proximity_constraint(&self, line: &TransitLine, d: f64) -> Option<(i32, Constraint)> {
        let data = json!({ "line": line.name, "distance": round1(d) });
        let (penalty, constraint_type, severity, band) = if d < self.rules.critical_distance {
            (
                CRITICAL_PENALTY,
                ConstraintType::TunnelCritical,
                Severity::Blocking,
                self.rules.critical_distance,
            )
        } else if d < self.rules.restricted_distance {
            (
                RESTRICTED_PENALTY,
                ConstraintType::TunnelRestricted,
                Severity::Critical,
                self.rules.restricted_distance,
            )
        } else if d < self.rules.monitoring_distance {
            (
                MONITORING_PENALTY,
                ConstraintType::TunnelMonitoring,
                Severity::Warning,
                self.rules.monitoring_distance,
            )
        } else {
            return None;
        };
        let message = format!(
            "Site is {:.0}m from the {} tunnel (inside the {:.0}m band)",
            d, line.name, band
        );
        Some((penalty, Constraint::new(constraint_type, severity, message, data)))
    }
}

impl Evaluator for SubsurfaceEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Subsurface
    }

    fn execute(&self, building: &Building, _context: &Context) -> AuditResult {
        let mut score = BASELINE_SCORE;
        let mut constraints = Vec::new();

        let nearest = self.nearest_line(building);

        if let Some((line, d)) = nearest {
            if let Some((penalty, constraint)) = self.proximity_constraint(line, d) {
                score -= penalty;
                constraints.push(constraint);
            }

            let max_depth = line.depth - self.rules.depth_clearance;
            if building.basement_depth > max_depth {
                score -= DEPTH_CONFLICT_PENALTY;
                constraints.push(Constraint::new(
                    ConstraintType::BasementDepthConflict,
                    Severity::Important,
                    format!(
                        "Basement depth {:.1}m leaves less than {:.1}m clearance above the {} \
                         tunnel at {:.1}m",
                        building.basement_depth, self.rules.depth_clearance, line.name, line.depth
                    ),
                    json!({
                        "line": line.name,
                        "tunnelDepth": line.depth,
                        "maxBasementDepth": max_depth,
                        "actual": building.basement_depth,
                    }),
                ));
            }
        }

        let passed = !constraints.iter().any(|c| c.severity == Severity::Blocking);
        let mut result = AuditResult::new(EvaluatorKind::Subsurface, passed, score);
        result.constraints = constraints;
        result.data.insert(
            "nearestLine".into(),
            json!(nearest.map(|(line, _)| line.name.as_str())),
        );
        result.data.insert(
            "nearestDistance".into(),
            json!(nearest.map(|(_, d)| round1(d))),
        );
        result
    }
}
