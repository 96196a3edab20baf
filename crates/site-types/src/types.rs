/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Concrete,
    Timber,
}

/// Load-bearing system classification used by the seismic check
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralSystem {
    Standard,
    DuctileFrame,
    BaseIsolation,
    DampedCore,
}

impl StructuralSystem {
    /// Anything beyond a standard frame counts as a seismic upgrade
    pub fn is_upgraded(&self) -> bool {
        !matches!(self, StructuralSystem::Standard)
    }
}

/// The canonical building every evaluator audits.
///
/// Built once per audit by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub position: GeoPoint,
    /// Meters above ground
    pub height: f64,
    pub floors: u32,
    /// Square meters
    pub footprint: f64,
    /// Square meters
    pub roof_area: f64,
    /// Sealed share of the plot, 0..=100
    pub surface_seal: f64,
    /// Meters below ground
    pub basement_depth: f64,
    /// Ground floor offset against the reference level, meters
    pub ground_elevation: f64,
    pub has_green_roof: bool,
    pub has_solar: bool,
    pub material: Material,
    pub structural_system: Option<StructuralSystem>,
    /// Dataset feature that contributed height/floors, if any
    pub existing_structure_id: Option<String>,
}

/// Caller-supplied partial building; unset fields fall back during normalization
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildingParams {
    pub height: Option<f64>,
    pub floors: Option<u32>,
    pub footprint: Option<f64>,
    pub roof_area: Option<f64>,
    pub surface_seal: Option<f64>,
    pub basement_depth: Option<f64>,
    pub ground_elevation: Option<f64>,
    pub has_green_roof: Option<bool>,
    pub has_solar: Option<bool>,
    pub material: Option<Material>,
    pub structural_system: Option<StructuralSystem>,
}

/// Geometry of a dataset feature (GeoJSON-like, coordinates as objects)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(GeoPoint),
    LineString(Vec<GeoPoint>),
    /// Rings; the first ring is the outer boundary
    Polygon(Vec<Vec<GeoPoint>>),
}

impl Geometry {
    /// First vertex, used as the representative position for radius queries
    pub fn first_vertex(&self) -> Option<GeoPoint> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::LineString(line) => line.first().copied(),
            Geometry::Polygon(rings) => rings.first().and_then(|r| r.first()).copied(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FeatureProperties {
    pub height: Option<f64>,
    pub levels: Option<u32>,
    pub name: Option<String>,
}

/// One structure from the map/data layer's building dataset
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Feature {
    pub id: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

/// Storey height used when a feature only carries a level count
pub const METERS_PER_LEVEL: f64 = 3.0;

impl Feature {
    pub fn position(&self) -> Option<GeoPoint> {
        self.geometry.first_vertex()
    }

    /// Explicit height, else levels * storey height, else unknown
    pub fn effective_height(&self) -> Option<f64> {
        match (self.properties.height, self.properties.levels) {
            (Some(h), _) if h.is_finite() && h > 0.0 => Some(h),
            (_, Some(levels)) if levels > 0 => Some(levels as f64 * METERS_PER_LEVEL),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Neighbor {
    pub id: String,
    /// Meters from the audited position
    pub distance: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodStats {
    pub count: usize,
    pub avg_height: f64,
    pub max_height: f64,
    /// Closest neighbors, ascending by distance
    pub nearest: Vec<Neighbor>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct District {
    pub number: u8,
    pub name: String,
}

/// Ambient facts shared read-only by all evaluators.
///
/// Every field is resolved when the context is built, so evaluators never
/// deal with missing neighborhood data.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub district: Option<District>,
    pub neighborhood: NeighborhoodStats,
    pub neighborhood_radius: f64,
    /// Structures within the wind shielding radius
    pub shielding_count: usize,
}

impl Context {
    pub fn district_number(&self) -> Option<u8> {
        self.district.as_ref().map(|d| d.number)
    }
}

/// One audit invocation as received from a caller
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub overrides: BuildingParams,
    /// Dataset feature to inherit height/floors from
    #[serde(default)]
    pub existing_structure_id: Option<String>,
    /// Skip district lookup
    #[serde(default)]
    pub district: Option<u8>,
    #[serde(default)]
    pub neighborhood_radius: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(height: Option<f64>, levels: Option<u32>) -> Feature {
        Feature {
            id: "b1".to_string(),
            geometry: Geometry::Point(GeoPoint::new(48.2, 16.37)),
            properties: FeatureProperties {
                height,
                levels,
                name: None,
            },
        }
    }

    #[test]
    fn test_effective_height_prefers_explicit_height() {
        assert_eq!(feature(Some(18.0), Some(10)).effective_height(), Some(18.0));
    }

    #[test]
    fn test_effective_height_falls_back_to_levels() {
        assert_eq!(feature(None, Some(5)).effective_height(), Some(15.0));
        assert_eq!(feature(Some(0.0), Some(2)).effective_height(), Some(6.0));
        assert_eq!(feature(None, None).effective_height(), None);
    }

    #[test]
    fn test_polygon_first_vertex() {
        let geometry = Geometry::Polygon(vec![vec![
            GeoPoint::new(48.1, 16.1),
            GeoPoint::new(48.2, 16.1),
            GeoPoint::new(48.2, 16.2),
        ]]);
        assert_eq!(geometry.first_vertex(), Some(GeoPoint::new(48.1, 16.1)));
        assert_eq!(Geometry::LineString(vec![]).first_vertex(), None);
    }

    #[test]
    fn test_params_deserialize_partial() {
        let params: BuildingParams =
            serde_json::from_str(r#"{"height": 30.5, "material": "timber"}"#).unwrap();
        assert_eq!(params.height, Some(30.5));
        assert_eq!(params.material, Some(Material::Timber));
        assert_eq!(params.floors, None);
    }

    #[test]
    fn test_feature_geometry_wire_format() {
        let json = r#"{"id":"w1","geometry":{"type":"Point","coordinates":{"lat":48.2,"lng":16.3}},"properties":{"levels":4}}"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.position(), Some(GeoPoint::new(48.2, 16.3)));
        assert_eq!(feature.effective_height(), Some(12.0));
    }

    #[test]
    fn test_structural_system_upgrade() {
        assert!(!StructuralSystem::Standard.is_upgraded());
        assert!(StructuralSystem::BaseIsolation.is_upgraded());
    }

    #[test]
    fn test_audit_request_minimal_json() {
        let req: AuditRequest =
            serde_json::from_str(r#"{"latitude": 48.2, "longitude": 16.37}"#).unwrap();
        assert_eq!(req.overrides, BuildingParams::default());
        assert_eq!(req.district, None);

        let req: AuditRequest = serde_json::from_str(
            r#"{"latitude": 48.2, "longitude": 16.37, "overrides": {"height": 30.0, "roofArea": 120.0}, "existingStructureId": "w1"}"#,
        )
        .unwrap();
        assert_eq!(req.overrides.height, Some(30.0));
        assert_eq!(req.overrides.roof_area, Some(120.0));
        assert_eq!(req.existing_structure_id.as_deref(), Some("w1"));
    }
}
