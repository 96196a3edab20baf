//! Context resolution: administrative district and neighborhood facts
//!
//! The resulting [`Context`] is fully populated before any evaluator runs;
//! missing data (no district match, empty neighborhood) resolves to explicit
//! defaults here rather than in the evaluators.

use std::borrow::Cow;

use site_types::{Context, District, Feature, GeoPoint};

use crate::config::ContextRules;
use crate::geo;

/// Caller-supplied context overrides
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContextOverrides<'a> {
    /// Skip the bounding-box lookup
    pub district: Option<u8>,
    /// Meters
    pub neighborhood_radius: Option<f64>,
    /// Structure being replaced; never its own neighbor
    pub exclude_id: Option<&'a str>,
}

/// Resolve the district containing `point`, if any
pub fn resolve_district(rules: &ContextRules, point: GeoPoint) -> Option<District> {
    rules
        .districts
        .iter()
        .find(|area| area.bounds.contains(point))
        .map(|area| District {
            number: area.number,
            name: area.name.clone(),
        })
}

/// District by number; unknown numbers get a generic name
pub fn district_by_number(rules: &ContextRules, number: u8) -> District {
    let name = rules
        .districts
        .iter()
        .find(|area| area.number == number)
        .map(|area| area.name.clone())
        .unwrap_or_else(|| format!("District {}", number));
    District { number, name }
}

/// Build the shared audit context
pub fn resolve_context(
    rules: &ContextRules,
    point: GeoPoint,
    dataset: &[Feature],
    overrides: ContextOverrides<'_>,
) -> Context {
    let district = match overrides.district {
        Some(number) => Some(district_by_number(rules, number)),
        None => resolve_district(rules, point),
    };
    let radius = overrides
        .neighborhood_radius
        .unwrap_or(rules.neighborhood_radius);
    let surrounding: Cow<'_, [Feature]> = match overrides.exclude_id {
        Some(id) => Cow::Owned(dataset.iter().filter(|f| f.id != id).cloned().collect()),
        None => Cow::Borrowed(dataset),
    };

    Context {
        district,
        neighborhood: geo::neighborhood_stats(point, &surrounding, radius, rules.nearest_count),
        neighborhood_radius: radius,
        shielding_count: geo::count_within_radius(point, &surrounding, rules.shielding_radius),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use site_types::{FeatureProperties, Geometry};

    fn rules() -> ContextRules {
        ContextRules::default()
    }

    #[test]
    fn test_resolves_known_districts() {
        let stephansplatz = GeoPoint::new(48.2082, 16.3738);
        assert_eq!(
            resolve_district(&rules(), stephansplatz).map(|d| d.number),
            Some(1)
        );

        let kagran = GeoPoint::new(48.2430, 16.4500);
        assert_eq!(resolve_district(&rules(), kagran).map(|d| d.number), Some(22));
    }

    #[test]
    fn test_outside_known_districts() {
        let salzburg = GeoPoint::new(47.8095, 13.0550);
        assert_eq!(resolve_district(&rules(), salzburg), None);
    }

    #[test]
    fn test_district_override_skips_lookup() {
        let stephansplatz = GeoPoint::new(48.2082, 16.3738);
        let ctx = resolve_context(
            &rules(),
            stephansplatz,
            &[],
            ContextOverrides {
                district: Some(13),
                ..Default::default()
            },
        );
        assert_eq!(
            ctx.district,
            Some(District {
                number: 13,
                name: "Hietzing".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_district_override_keeps_number() {
        assert_eq!(district_by_number(&rules(), 17).name, "District 17");
    }

    #[test]
    fn test_context_uses_default_radius_and_counts_shielding() {
        let point = GeoPoint::new(48.1700, 16.3800);
        // ~100m north of the point, inside both radii
        let feature = Feature {
            id: "n1".to_string(),
            geometry: Geometry::Point(GeoPoint::new(48.1709, 16.3800)),
            properties: FeatureProperties {
                height: Some(18.0),
                ..Default::default()
            },
        };
        let ctx = resolve_context(&rules(), point, &[feature], ContextOverrides::default());

        assert_eq!(ctx.neighborhood_radius, 150.0);
        assert_eq!(ctx.neighborhood.count, 1);
        assert_eq!(ctx.neighborhood.max_height, 18.0);
        assert_eq!(ctx.shielding_count, 1);
    }

    #[test]
    fn test_excluded_structure_is_not_a_neighbor() {
        let point = GeoPoint::new(48.1700, 16.3800);
        let feature = |id: &str, lat: f64| Feature {
            id: id.to_string(),
            geometry: Geometry::Point(GeoPoint::new(lat, 16.3800)),
            properties: FeatureProperties {
                height: Some(30.0),
                ..Default::default()
            },
        };
        let dataset = [feature("site", 48.1700), feature("n1", 48.1709)];
        let ctx = resolve_context(
            &rules(),
            point,
            &dataset,
            ContextOverrides {
                exclude_id: Some("site"),
                ..Default::default()
            },
        );

        assert_eq!(ctx.neighborhood.count, 1);
        assert_eq!(ctx.neighborhood.nearest[0].id, "n1");
        assert_eq!(ctx.shielding_count, 1);
    }

    #[test]
    fn test_radius_override() {
        let point = GeoPoint::new(48.1700, 16.3800);
        let feature = Feature {
            id: "n1".to_string(),
            geometry: Geometry::Point(GeoPoint::new(48.1709, 16.3800)),
            properties: FeatureProperties {
                height: Some(18.0),
                ..Default::default()
            },
        };
        let ctx = resolve_context(
            &rules(),
            point,
            &[feature],
            ContextOverrides {
                neighborhood_radius: Some(50.0),
                ..Default::default()
            },
        );
        assert_eq!(ctx.neighborhood.count, 0);
        assert_eq!(ctx.neighborhood_radius, 50.0);
    }
}
