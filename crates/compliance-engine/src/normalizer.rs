//! Building normalization
//!
//! Merges caller overrides, an optional existing structure from the dataset
//! and the configured defaults into one validated [`Building`]. This is the
//! only stage of an audit allowed to fail.
//!
//! Precedence for height and floors: caller, then existing structure, then
//! default. Every other field is caller-or-default.

use site_types::{Building, BuildingParams, Feature, GeoPoint};
use tracing::debug;

use crate::config::BuildingDefaults;
use crate::error::AuditError;

/// Find a dataset feature by id
pub fn find_structure<'a>(dataset: &'a [Feature], id: &str) -> Option<&'a Feature> {
    dataset.iter().find(|f| f.id == id)
}

/// Build and validate the canonical building
pub fn normalize(
    position: GeoPoint,
    params: &BuildingParams,
    existing: Option<&Feature>,
    defaults: &BuildingDefaults,
) -> Result<Building, AuditError> {
    validate_position(position)?;

    let existing_height = existing.and_then(Feature::effective_height);
    let existing_floors = existing
        .and_then(|f| f.properties.levels)
        .filter(|&levels| levels > 0);

    if let Some(feature) = existing {
        debug!(
            id = %feature.id,
            height = ?existing_height,
            floors = ?existing_floors,
            "Using existing structure as fallback"
        );
    }

    let building = Building {
        position,
        height: params
            .height
            .or(existing_height)
            .unwrap_or(defaults.height),
        floors: params
            .floors
            .or(existing_floors)
            .unwrap_or(defaults.floors),
        footprint: params.footprint.unwrap_or(defaults.footprint),
        roof_area: params.roof_area.unwrap_or(defaults.roof_area),
        surface_seal: params.surface_seal.unwrap_or(defaults.surface_seal),
        basement_depth: params.basement_depth.unwrap_or(defaults.basement_depth),
        ground_elevation: params.ground_elevation.unwrap_or(defaults.ground_elevation),
        has_green_roof: params.has_green_roof.unwrap_or(defaults.has_green_roof),
        has_solar: params.has_solar.unwrap_or(defaults.has_solar),
        material: params.material.unwrap_or(defaults.material),
        structural_system: params.structural_system,
        existing_structure_id: existing.map(|f| f.id.clone()),
    };

    validate_building(&building)?;
    Ok(building)
}

fn validate_position(position: GeoPoint) -> Result<(), AuditError> {
    let valid = position.lat.is_finite()
        && position.lng.is_finite()
        && (-90.0..=90.0).contains(&position.lat)
        && (-180.0..=180.0).contains(&position.lng);
    if valid {
        Ok(())
    } else {
        Err(AuditError::InvalidCoordinates {
            lat: position.lat,
            lng: position.lng,
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, AuditError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AuditError::invalid(field, "must be a finite number"))
    }
}

fn validate_building(b: &Building) -> Result<(), AuditError> {
    if finite("height", b.height)? <= 0.0 {
        return Err(AuditError::invalid(
            "height",
            format!("must be positive (got {})", b.height),
        ));
    }
    if b.floors == 0 {
        return Err(AuditError::invalid("floors", "must be at least 1"));
    }
    if finite("footprint", b.footprint)? <= 0.0 {
        return Err(AuditError::invalid(
            "footprint",
            format!("must be positive (got {})", b.footprint),
        ));
    }
    if finite("roofArea", b.roof_area)? < 0.0 {
        return Err(AuditError::invalid(
            "roofArea",
            format!("must not be negative (got {})", b.roof_area),
        ));
    }
    if !(0.0..=100.0).contains(&finite("surfaceSeal", b.surface_seal)?) {
        return Err(AuditError::invalid(
            "surfaceSeal",
            format!("must be within 0..=100 (got {})", b.surface_seal),
        ));
    }
    if finite("basementDepth", b.basement_depth)? < 0.0 {
        return Err(AuditError::invalid(
            "basementDepth",
            format!("must not be negative (got {})", b.basement_depth),
        ));
    }
    finite("groundElevation", b.ground_elevation)?;
    Ok(())
}

/// Validate a caller-supplied neighborhood radius
pub fn validate_radius(radius: f64) -> Result<f64, AuditError> {
    if finite("neighborhoodRadius", radius)? <= 0.0 {
        return Err(AuditError::invalid(
            "neighborhoodRadius",
            format!("must be positive (got {})", radius),
        ));
    }
    Ok(radius)
}
