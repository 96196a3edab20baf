//! Zoning: building class height/floor caps, contextual variance and
//! protection zones (Schutzzonen)

use serde_json::json;
use site_types::{AuditResult, Building, Constraint, ConstraintType, Context, EvaluatorKind, Severity};

use super::{round1, Evaluator, BASELINE_SCORE};
use crate::config::{BuildingClass, ClassId, ZoningRules};
use crate::geo::point_in_polygon;

const VARIANCE_PENALTY: i32 = 15;
const HEIGHT_VIOLATION_PENALTY: i32 = 40;
const FLOOR_PENALTY: i32 = 20;
const PROTECTION_ZONE_PENALTY: i32 = 10;

/// Used only when the configured tables lack the default class
const FALLBACK_CLASS: BuildingClass = BuildingClass {
    id: ClassId::III,
    max_height: 16.0,
    max_floors: 5,
    max_density: 2.0,
};

#[derive(Debug, Clone)]
pub struct ZoningEvaluator {
    rules: ZoningRules,
}

impl ZoningEvaluator {
    pub fn new(rules: ZoningRules) -> Self {
        Self { rules }
    }

    fn regulatory_class(&self, context: &Context) -> &BuildingClass {
        let id = self.rules.class_id_for_district(context.district_number());
        self.rules
            .class(id)
            .or_else(|| self.rules.class(self.rules.default_class))
            .unwrap_or(&FALLBACK_CLASS)
    }

    /// Height ceiling derived from the surroundings: the larger of the
    /// regulatory cap, the class the neighborhood average suggests, and a
    /// share of the tallest neighbor.
    pub fn contextual_limit(&self, regulatory_limit: f64, context: &Context) -> f64 {
        let stats = &context.neighborhood;
        let suggested = if stats.count > 0 {
            self.rules
                .class_for_height(stats.avg_height)
                .map(|c| c.max_height)
                .unwrap_or(0.0)
        } else {
            0.0
        };
        let observed = stats.max_height * self.rules.contextual_max_factor;
        regulatory_limit.max(suggested).max(observed)
    }
}

impl Evaluator for ZoningEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Zoning
    }

    fn execute(&self, building: &Building, context: &Context) -> AuditResult {
        let class = self.regulatory_class(context);
        let regulatory_limit = class.max_height;
        let contextual_limit = self.contextual_limit(regulatory_limit, context);

        let mut score = BASELINE_SCORE;
        let mut passed = true;
        let mut constraints = Vec::new();

        if building.height > regulatory_limit {
            passed = false;
            if building.height <= contextual_limit {
                score -= VARIANCE_PENALTY;
                constraints.push(Constraint::new(
                    ConstraintType::HeightVariance,
                    Severity::Important,
                    format!(
                        "Height {:.1}m exceeds the class {:?} limit of {:.1}m but matches the \
                         surrounding buildings (contextual limit {:.1}m); a variance is possible",
                        building.height, class.id, regulatory_limit, contextual_limit
                    ),
                    json!({
                        "limit": regulatory_limit,
                        "contextualLimit": round1(contextual_limit),
                        "actual": building.height,
                    }),
                ));
            } else {
                score -= HEIGHT_VIOLATION_PENALTY;
                constraints.push(Constraint::new(
                    ConstraintType::HeightViolation,
                    Severity::Critical,
                    format!(
                        "Height {:.1}m exceeds the class {:?} limit of {:.1}m and the contextual \
                         limit of {:.1}m",
                        building.height, class.id, regulatory_limit, contextual_limit
                    ),
                    json!({
                        "limit": regulatory_limit,
                        "contextualLimit": round1(contextual_limit),
                        "actual": building.height,
                        "excess": round1(building.height - contextual_limit),
                    }),
                ));
            }
        }

        if building.floors > class.max_floors {
            score -= FLOOR_PENALTY;
            constraints.push(Constraint::new(
                ConstraintType::FloorViolation,
                Severity::Warning,
                format!(
                    "{} floors exceed the class {:?} maximum of {}",
                    building.floors, class.id, class.max_floors
                ),
                json!({ "limit": class.max_floors, "actual": building.floors }),
            ));
        }

        let protection_zone = self
            .rules
            .protection_zones
            .iter()
            .find(|zone| point_in_polygon(building.position, &zone.ring));
        if let Some(zone) = protection_zone {
            score -= PROTECTION_ZONE_PENALTY;
            constraints.push(Constraint::new(
                ConstraintType::Schutzzone,
                Severity::Important,
                format!(
                    "Site lies in the {} protection zone; facade and material approval required",
                    zone.name
                ),
                json!({ "zone": zone.name }),
            ));
        }

        let mut result = AuditResult::new(EvaluatorKind::Zoning, passed, score);
        result.constraints = constraints;
        result.data.insert("buildingClass".into(), json!(class.id));
        result.data.insert("heightLimit".into(), json!(regulatory_limit));
        result
            .data
            .insert("contextualLimit".into(), json!(round1(contextual_limit)));
        result.data.insert("floorLimit".into(), json!(class.max_floors));
        result.data.insert("densityLimit".into(), json!(class.max_density));
        result.data.insert(
            "protectionZone".into(),
            json!(protection_zone.map(|z| z.name.as_str())),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{building, context};
    use site_types::{District, GeoPoint, NeighborhoodStats};

    fn evaluator() -> ZoningEvaluator {
        ZoningEvaluator::new(ZoningRules::default())
    }

    fn favoriten() -> Context {
        Context {
            district: Some(District {
                number: 10,
                name: "Favoriten".to_string(),
            }),
            ..context()
        }
    }

    fn with_neighbors(avg_height: f64, max_height: f64) -> Context {
        Context {
            neighborhood: NeighborhoodStats {
                count: 8,
                avg_height,
                max_height,
                nearest: vec![],
            },
            ..favoriten()
        }
    }

    #[test]
    fn test_compliant_building_passes() {
        let result = evaluator().execute(&building(), &favoriten());
        assert!(result.passed);
        assert_eq!(result.score, 100);
        assert!(result.constraints.is_empty());
        assert_eq!(result.data["buildingClass"], "III");
    }

    #[test]
    fn test_variance_opportunity() {
        // Class III caps at 16m; neighbors average 19m (suggests class IV, 21m)
        let b = Building {
            height: 20.0,
            ..building()
        };
        let result = evaluator().execute(&b, &with_neighbors(19.0, 22.0));

        assert!(!result.passed);
        assert_eq!(result.score, 85);
        assert_eq!(result.constraints.len(), 1);
        assert_eq!(result.constraints[0].constraint_type, ConstraintType::HeightVariance);
        assert_eq!(result.constraints[0].severity, Severity::Important);
    }

    #[test]
    fn test_variance_from_tallest_neighbor() {
        // 95% of a 30m neighbor = 28.5m beats the suggested class
        let b = Building {
            height: 28.0,
            ..building()
        };
        let result = evaluator().execute(&b, &with_neighbors(10.0, 30.0));
        assert!(result.has_constraint(ConstraintType::HeightVariance));
        assert_eq!(result.score, 85);
    }

    #[test]
    fn test_height_violation_beyond_contextual_limit() {
        let b = Building {
            height: 35.0,
            ..building()
        };
        let result = evaluator().execute(&b, &with_neighbors(19.0, 22.0));

        assert!(!result.passed);
        assert_eq!(result.score, 60);
        assert_eq!(result.constraints[0].constraint_type, ConstraintType::HeightViolation);
        assert_eq!(result.constraints[0].severity, Severity::Critical);
    }

    #[test]
    fn test_empty_neighborhood_has_no_variance() {
        let b = Building {
            height: 17.0,
            ..building()
        };
        let result = evaluator().execute(&b, &favoriten());
        assert!(result.has_constraint(ConstraintType::HeightViolation));
    }

    #[test]
    fn test_floor_excess_does_not_fail() {
        let b = Building {
            floors: 7,
            ..building()
        };
        let result = evaluator().execute(&b, &favoriten());

        assert!(result.passed);
        assert_eq!(result.score, 80);
        assert_eq!(result.constraints[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unknown_district_uses_default_class() {
        let b = Building {
            height: 17.0,
            ..building()
        };
        let result = evaluator().execute(&b, &context());
        assert_eq!(result.data["buildingClass"], "III");
        assert!(!result.passed);
    }

    #[test]
    fn test_district_class_lookup_raises_limit() {
        let b = Building {
            height: 50.0,
            floors: 15,
            ..building()
        };
        let donaustadt = Context {
            district: Some(District {
                number: 22,
                name: "Donaustadt".to_string(),
            }),
            ..context()
        };
        let result = evaluator().execute(&b, &donaustadt);
        assert!(result.passed);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_protection_zone_first_match() {
        let b = Building {
            position: GeoPoint::new(48.2030, 16.3530),
            ..building()
        };
        let result = evaluator().execute(&b, &favoriten());

        assert!(result.passed);
        assert_eq!(result.score, 90);
        let zones: Vec<_> = result
            .constraints
            .iter()
            .filter(|c| c.constraint_type == ConstraintType::Schutzzone)
            .collect();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].data["zone"], "Spittelberg");
    }

    #[test]
    fn test_overlapping_zones_only_first_counts() {
        let mut rules = ZoningRules::default();
        let ring = rules.protection_zones[1].ring.clone();
        rules.protection_zones.insert(
            0,
            crate::config::ProtectionZone {
                name: "Overlay".to_string(),
                ring,
            },
        );
        let b = Building {
            position: GeoPoint::new(48.2030, 16.3530),
            ..building()
        };
        let result = ZoningEvaluator::new(rules).execute(&b, &favoriten());
        assert_eq!(result.score, 90);
        assert_eq!(result.data["protectionZone"], "Overlay");
    }

    #[test]
    fn test_penalties_stack_and_clamp() {
        let b = Building {
            position: GeoPoint::new(48.2030, 16.3530),
            height: 200.0,
            floors: 60,
            ..building()
        };
        let result = evaluator().execute(&b, &favoriten());
        assert_eq!(result.score, 30);
        assert_eq!(result.constraints.len(), 3);
    }
}
