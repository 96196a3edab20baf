//! Seismic: geological zone by longitude, with the tall sediment-basin case
//! branching on material and structural system

use serde_json::json;
use site_types::{
    AuditResult, Building, Constraint, ConstraintType, Context, EvaluatorKind, Material,
    Requirement, Severity, StructuralSystem,
};

use super::Evaluator;
use crate::config::SeismicRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeologicalZone {
    Bedrock,
    Sediment,
}

impl GeologicalZone {
    fn as_str(&self) -> &'static str {
        match self {
            GeologicalZone::Bedrock => "bedrock",
            GeologicalZone::Sediment => "sediment",
        }
    }
}

fn requirement(code: &str, message: &str) -> Requirement {
    Requirement {
        code: code.to_string(),
        message: message.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct SeismicEvaluator {
    rules: SeismicRules,
}

impl SeismicEvaluator {
    pub fn new(rules: SeismicRules) -> Self {
        Self { rules }
    }

    fn zone(&self, building: &Building) -> GeologicalZone {
        if building.position.lng < self.rules.bedrock_max_lng {
            GeologicalZone::Bedrock
        } else {
            GeologicalZone::Sediment
        }
    }
}

impl Evaluator for SeismicEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Seismic
    }

    fn execute(&self, building: &Building, _context: &Context) -> AuditResult {
        let rules = &self.rules;
        let zone = self.zone(building);
        let tall = building.height > rules.tall_height;
        let upgraded = building
            .structural_system
            .is_some_and(|s| s.is_upgraded());

        let mut constraints = Vec::new();
        let mut requirements = Vec::new();

        let (passed, score) = match zone {
            GeologicalZone::Bedrock => (true, rules.bedrock_score),
            GeologicalZone::Sediment if !tall => {
                requirements.push(requirement(
                    "SOIL_INVESTIGATION",
                    "Geotechnical survey of the sediment basin before foundation design",
                ));
                (true, rules.sediment_score)
            }
            GeologicalZone::Sediment if building.material == Material::Timber => {
                (true, rules.sediment_score + rules.timber_bonus)
            }
            GeologicalZone::Sediment if upgraded => {
                requirements.push(requirement(
                    "SEISMIC_DESIGN_VERIFICATION",
                    "Independent verification of the seismic design for site amplification",
                ));
                (true, rules.sediment_score)
            }
            GeologicalZone::Sediment => {
                constraints.push(Constraint::new(
                    ConstraintType::SeismicStructural,
                    Severity::Critical,
                    format!(
                        "{:.1}m building on amplifying sediment needs an upgraded structural system",
                        building.height
                    ),
                    json!({ "height": building.height, "tallHeight": rules.tall_height }),
                ));
                requirements.push(requirement(
                    "SEISMIC_SYSTEM_UPGRADE",
                    "Adopt a ductile frame, base isolation or damped core",
                ));
                (false, rules.unreinforced_score)
            }
        };

        let mut result = AuditResult::new(EvaluatorKind::Seismic, passed, score);
        result.constraints = constraints;
        result.requirements = requirements;
        result.data.insert("zone".into(), json!(zone.as_str()));
        result.data.insert("tall".into(), json!(tall));
        result.data.insert(
            "structuralSystem".into(),
            json!(building.structural_system.unwrap_or(StructuralSystem::Standard)),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{building, context};
    use site_types::GeoPoint;

    fn evaluator() -> SeismicEvaluator {
        SeismicEvaluator::new(SeismicRules::default())
    }

    /// East of the bedrock boundary
    fn sediment(height: f64) -> Building {
        Building {
            position: GeoPoint::new(48.2200, 16.4200),
            height,
            ..building()
        }
    }

    #[test]
    fn test_bedrock_scores_high_regardless_of_material() {
        let concrete = Building {
            height: 90.0,
            ..building()
        };
        let timber = Building {
            material: Material::Timber,
            ..concrete.clone()
        };
        for b in [concrete, timber] {
            let result = evaluator().execute(&b, &context());
            assert!(result.passed);
            assert_eq!(result.score, 95);
            assert!(result.requirements.is_empty());
        }
    }

    #[test]
    fn test_low_rise_sediment_needs_soil_investigation() {
        let result = evaluator().execute(&sediment(20.0), &context());
        assert!(result.passed);
        assert_eq!(result.score, 75);
        assert_eq!(result.requirements[0].code, "SOIL_INVESTIGATION");
    }

    #[test]
    fn test_tall_unreinforced_concrete_fails() {
        let result = evaluator().execute(&sediment(45.0), &context());
        assert!(!result.passed);
        assert_eq!(result.score, 35);
        assert_eq!(result.constraints[0].severity, Severity::Critical);
        assert_eq!(result.requirements[0].code, "SEISMIC_SYSTEM_UPGRADE");
    }

    #[test]
    fn test_standard_system_is_not_an_upgrade() {
        let b = Building {
            structural_system: Some(StructuralSystem::Standard),
            ..sediment(45.0)
        };
        assert!(!evaluator().execute(&b, &context()).passed);
    }

    #[test]
    fn test_tall_upgraded_system_passes() {
        let b = Building {
            structural_system: Some(StructuralSystem::BaseIsolation),
            ..sediment(45.0)
        };
        let result = evaluator().execute(&b, &context());
        assert!(result.passed);
        assert_eq!(result.score, 75);
        assert_eq!(result.requirements[0].code, "SEISMIC_DESIGN_VERIFICATION");
    }

    #[test]
    fn test_tall_timber_gets_bonus() {
        let b = Building {
            material: Material::Timber,
            ..sediment(45.0)
        };
        let result = evaluator().execute(&b, &context());
        assert!(result.passed);
        assert_eq!(result.score, 90);
        assert!(result.constraints.is_empty());
    }

    #[test]
    fn test_height_at_threshold_is_not_tall() {
        let result = evaluator().execute(&sediment(40.0), &context());
        assert!(result.passed);
        assert_eq!(result.data["tall"], false);
    }
}
