//! Climate: surface sealing, urban heat island, flood exposure and the green
//! infrastructure mandates
//!
//! Every check runs; deltas are additive and only surface sealing can fail the
//! audit.

use serde_json::json;
use site_types::{
    AuditResult, Building, Constraint, ConstraintType, Context, EvaluatorKind, Mandate,
    MandateType, Severity,
};

use super::{round1, Evaluator, BASELINE_SCORE};
use crate::config::{ClimateRules, HeatZone};
use crate::geo::{distance, point_in_polygon};

const SEAL_BLOCKING_PENALTY: i32 = 50;
const SEAL_WARNING_PENALTY: i32 = 15;
const FACADE_GREENING_PENALTY: i32 = 10;
const FLOOD_PENALTY: i32 = 25;
const GREEN_ROOF_PENALTY: i32 = 10;
const SOLAR_PENALTY: i32 = 5;

#[derive(Debug, Clone)]
pub struct ClimateEvaluator {
    rules: ClimateRules,
}

impl ClimateEvaluator {
    pub fn new(rules: ClimateRules) -> Self {
        Self { rules }
    }

    /// Heat island zone and intensity (K) at `distance_to_centre` meters
    pub fn heat_zone(&self, distance_to_centre: f64) -> (HeatZone, f64) {
        self.rules
            .heat_bands
            .iter()
            .find(|band| distance_to_centre < band.max_distance)
            .map(|band| (band.zone, band.intensity))
            .unwrap_or((HeatZone::Low, self.rules.outer_intensity))
    }

    fn in_flood_zone(&self, building: &Building, context: &Context) -> bool {
        context.district_number() == Some(self.rules.flood_district)
            && point_in_polygon(building.position, &self.rules.flood_zone)
    }
}

fn mandate(mandate_type: MandateType, message: String, data: serde_json::Value) -> Mandate {
    Mandate {
        mandate_type,
        message,
        data,
    }
}

impl Evaluator for ClimateEvaluator {
    fn kind(&self) -> EvaluatorKind {
        EvaluatorKind::Climate
    }

    fn execute(&self, building: &Building, context: &Context) -> AuditResult {
        let rules = &self.rules;
        let mut score = BASELINE_SCORE;
        let mut constraints = Vec::new();
        let mut mandates = Vec::new();

        // Surface sealing
        if building.surface_seal > rules.seal_blocking_percent {
            score -= SEAL_BLOCKING_PENALTY;
            constraints.push(Constraint::new(
                ConstraintType::SurfaceSealBlocking,
                Severity::Blocking,
                format!(
                    "Surface sealing of {:.0}% exceeds the {:.0}% maximum",
                    building.surface_seal, rules.seal_blocking_percent
                ),
                json!({ "limit": rules.seal_blocking_percent, "actual": building.surface_seal }),
            ));
        } else if building.surface_seal > rules.seal_warning_percent {
            score -= SEAL_WARNING_PENALTY;
            constraints.push(Constraint::new(
                ConstraintType::SurfaceSealWarning,
                Severity::Warning,
                format!(
                    "Surface sealing of {:.0}% is above the {:.0}% target",
                    building.surface_seal, rules.seal_warning_percent
                ),
                json!({ "threshold": rules.seal_warning_percent, "actual": building.surface_seal }),
            ));
        }

        // Urban heat island
        let centre_distance = distance(building.position, rules.heat_island_center);
        let (heat_zone, intensity) = self.heat_zone(centre_distance);
        if heat_zone.requires_greening() {
            score -= FACADE_GREENING_PENALTY;
            mandates.push(mandate(
                MandateType::FacadeGreening,
                format!(
                    "Site lies in the {} heat island zone (+{:.1} K); facade greening required",
                    heat_zone.as_str(),
                    intensity
                ),
                json!({ "zone": heat_zone, "intensity": intensity }),
            ));
        }

        // Flood exposure
        let in_flood_zone = self.in_flood_zone(building, context);
        if in_flood_zone && building.ground_elevation < rules.flood_min_elevation {
            score -= FLOOD_PENALTY;
            mandates.push(mandate(
                MandateType::FloodProtection,
                format!(
                    "Ground elevation {:.1}m is below the {:.1}m flood protection level",
                    building.ground_elevation, rules.flood_min_elevation
                ),
                json!({
                    "minElevation": rules.flood_min_elevation,
                    "actual": building.ground_elevation,
                }),
            ));
        }

        if building.footprint > rules.green_roof_min_footprint && !building.has_green_roof {
            score -= GREEN_ROOF_PENALTY;
            mandates.push(mandate(
                MandateType::GreenRoof,
                format!(
                    "Footprints above {:.0} m² require a green roof",
                    rules.green_roof_min_footprint
                ),
                json!({ "footprint": building.footprint }),
            ));
        }

        if building.roof_area > rules.solar_min_roof_area && !building.has_solar {
            score -= SOLAR_PENALTY;
            mandates.push(mandate(
                MandateType::SolarPanels,
                format!(
                    "Roofs above {:.0} m² require solar panels",
                    rules.solar_min_roof_area
                ),
                json!({ "roofArea": building.roof_area }),
            ));
        }

        // Informational only
        let retention_m3 = building.roof_area * rules.retention_liters_per_m2 / 1000.0;
        mandates.push(mandate(
            MandateType::WaterRetention,
            format!("Provide {:.1} m³ of rainwater retention", retention_m3),
            json!({ "volume": round1(retention_m3) }),
        ));

        let passed = !constraints.iter().any(|c| c.severity == Severity::Blocking);
        let mut result = AuditResult::new(EvaluatorKind::Climate, passed, score);
        result.constraints = constraints;
        result.mandates = mandates;
        result.data.insert("heatZone".into(), json!(heat_zone));
        result.data.insert("heatIntensity".into(), json!(intensity));
        result
            .data
            .insert("centreDistance".into(), json!(round1(centre_distance)));
        result.data.insert("floodZone".into(), json!(in_flood_zone));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{building, context};
    use site_types::{District, GeoPoint};

    fn evaluator() -> ClimateEvaluator {
        ClimateEvaluator::new(ClimateRules::default())
    }

    fn mandate_types(result: &AuditResult) -> Vec<MandateType> {
        result.mandates.iter().map(|m| m.mandate_type).collect()
    }

    fn donaustadt() -> Context {
        Context {
            district: Some(District {
                number: 22,
                name: "Donaustadt".to_string(),
            }),
            ..context()
        }
    }

    #[test]
    fn test_baseline_building_gets_facade_and_retention() {
        // ~4.2km from the centre: high heat zone
        let result = evaluator().execute(&building(), &context());
        assert!(result.passed);
        assert_eq!(result.score, 90);
        assert_eq!(
            mandate_types(&result),
            vec![MandateType::FacadeGreening, MandateType::WaterRetention]
        );
        assert_eq!(result.data["heatZone"], "high");
    }

    #[test]
    fn test_retention_volume_scales_with_roof() {
        let result = evaluator().execute(&building(), &context());
        let retention = result
            .mandates
            .iter()
            .find(|m| m.mandate_type == MandateType::WaterRetention)
            .unwrap();
        // 250 m² * 30 L/m²
        assert_eq!(retention.data["volume"], 7.5);
    }

    #[test]
    fn test_seal_above_blocking_threshold_fails() {
        let b = Building {
            surface_seal: 85.0,
            ..building()
        };
        let result = evaluator().execute(&b, &context());
        assert!(!result.passed);
        assert_eq!(result.score, 40);
        assert!(result.has_severity(Severity::Blocking));
    }

    #[test]
    fn test_seal_warning_band() {
        let b = Building {
            surface_seal: 80.0,
            ..building()
        };
        let result = evaluator().execute(&b, &context());
        assert!(result.passed);
        assert_eq!(result.score, 75);
        assert!(result.has_constraint(ConstraintType::SurfaceSealWarning));
    }

    #[test]
    fn test_heat_zones_by_distance() {
        let e = evaluator();
        assert_eq!(e.heat_zone(0.0).0, HeatZone::Extreme);
        assert_eq!(e.heat_zone(2_000.0).0, HeatZone::High);
        assert_eq!(e.heat_zone(7_500.0), (HeatZone::Moderate, 2.0));
        assert_eq!(e.heat_zone(12_000.0), (HeatZone::Low, 1.0));
    }

    #[test]
    fn test_flood_mandate_in_donaustadt_polygon() {
        // Moderate heat zone, inside the flood polygon
        let b = Building {
            position: GeoPoint::new(48.2200, 16.4500),
            ..building()
        };
        let result = evaluator().execute(&b, &donaustadt());
        assert!(result.passed);
        assert_eq!(result.score, 75);
        assert!(mandate_types(&result).contains(&MandateType::FloodProtection));
    }

    #[test]
    fn test_flood_requires_district_match() {
        let b = Building {
            position: GeoPoint::new(48.2200, 16.4500),
            ..building()
        };
        let result = evaluator().execute(&b, &context());
        assert_eq!(result.score, 100);
        assert_eq!(result.data["floodZone"], false);
    }

    #[test]
    fn test_flood_cleared_by_elevation() {
        let b = Building {
            position: GeoPoint::new(48.2200, 16.4500),
            ground_elevation: 1.5,
            ..building()
        };
        let result = evaluator().execute(&b, &donaustadt());
        assert_eq!(result.score, 100);
        assert_eq!(result.data["floodZone"], true);
    }

    #[test]
    fn test_green_roof_and_solar_mandates() {
        let b = Building {
            footprint: 800.0,
            roof_area: 700.0,
            ..building()
        };
        let result = evaluator().execute(&b, &context());
        assert_eq!(result.score, 75);
        assert!(mandate_types(&result).contains(&MandateType::GreenRoof));
        assert!(mandate_types(&result).contains(&MandateType::SolarPanels));

        let equipped = Building {
            has_green_roof: true,
            has_solar: true,
            ..b
        };
        assert_eq!(evaluator().execute(&equipped, &context()).score, 90);
    }

    #[test]
    fn test_all_penalties_stack_to_zero() {
        let b = Building {
            position: GeoPoint::new(48.2200, 16.4500),
            surface_seal: 95.0,
            footprint: 800.0,
            roof_area: 700.0,
            ..building()
        };
        let rules = ClimateRules {
            heat_island_center: GeoPoint::new(48.2200, 16.4500),
            ..ClimateRules::default()
        };
        let result = ClimateEvaluator::new(rules).execute(&b, &donaustadt());
        // 100 - 50 - 10 - 25 - 10 - 5
        assert_eq!(result.score, 0);
        assert!(!result.passed);
    }
}
