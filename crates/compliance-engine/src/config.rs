//! Regulatory configuration
//!
//! Every threshold, table and polygon the evaluators consult lives here as
//! plain data. `Regulations::default()` is the built-in Vienna regime; an
//! alternate regime can be loaded from TOML, where any omitted section or
//! field keeps its Vienna value. Evaluators receive their section at
//! construction time and never read shared state.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use site_types::{GeoPoint, Material};

/// Complete regulatory regime for one city
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Regulations {
    pub context: ContextRules,
    pub defaults: BuildingDefaults,
    pub zoning: ZoningRules,
    pub heritage: HeritageRules,
    pub subsurface: SubsurfaceRules,
    pub climate: ClimateRules,
    pub seismic: SeismicRules,
    pub wind: WindRules,
}

impl Regulations {
    /// Load a regime from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or the resulting tables are inconsistent (see [`Regulations::validate`]).
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read regulations file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse a regime from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use compliance_engine::config::Regulations;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let regs = Regulations::from_toml_str(r#"
    ///     [climate]
    ///     seal_blocking_percent = 85.0
    /// "#)?;
    /// assert_eq!(regs.climate.seal_blocking_percent, 85.0);
    /// assert_eq!(regs.climate.seal_warning_percent, 70.0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let regs: Regulations = toml::from_str(s).context("Failed to parse TOML regulations")?;
        regs.validate()?;
        Ok(regs)
    }

    /// Check cross-table consistency
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.context.neighborhood_radius > 0.0,
            "context.neighborhood_radius must be positive"
        );
        ensure!(
            self.context.shielding_radius > 0.0,
            "context.shielding_radius must be positive"
        );
        ensure!(!self.zoning.classes.is_empty(), "zoning.classes is empty");
        ensure!(
            self.zoning.class(self.zoning.default_class).is_some(),
            "zoning.default_class {:?} has no class entry",
            self.zoning.default_class
        );
        for entry in &self.zoning.district_classes {
            ensure!(
                self.zoning.class(entry.class).is_some(),
                "district {} maps to undefined class {:?}",
                entry.district,
                entry.class
            );
        }
        ensure!(
            self.zoning
                .classes
                .windows(2)
                .all(|w| w[0].max_height < w[1].max_height),
            "zoning.classes must be sorted by ascending max_height"
        );
        ensure!(
            self.heritage.review_height <= self.heritage.max_height,
            "heritage.review_height exceeds heritage.max_height"
        );
        let s = &self.subsurface;
        ensure!(
            s.critical_distance <= s.restricted_distance
                && s.restricted_distance <= s.monitoring_distance,
            "subsurface distance bands must be ascending"
        );
        ensure!(
            self.climate.seal_warning_percent <= self.climate.seal_blocking_percent,
            "climate.seal_warning_percent exceeds climate.seal_blocking_percent"
        );
        ensure!(
            self.climate
                .heat_bands
                .windows(2)
                .all(|w| w[0].max_distance <= w[1].max_distance),
            "climate.heat_bands must be sorted by max_distance"
        );
        ensure!(
            self.wind.medium_min_neighbors <= self.wind.high_min_neighbors,
            "wind shielding bands must be ascending"
        );
        Ok(())
    }
}

// ============================================================================
// Context
// ============================================================================

/// Half-open `[min, max)` latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..self.max_lat).contains(&point.lat)
            && (self.min_lng..self.max_lng).contains(&point.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictArea {
    pub number: u8,
    pub name: String,
    pub bounds: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextRules {
    /// Meters
    pub neighborhood_radius: f64,
    pub nearest_count: usize,
    /// Meters; structures inside count towards wind shielding
    pub shielding_radius: f64,
    pub districts: Vec<DistrictArea>,
}

impl Default for ContextRules {
    fn default() -> Self {
        let district = |number: u8, name: &str, bounds: BoundingBox| DistrictArea {
            number,
            name: name.to_string(),
            bounds,
        };
        Self {
            neighborhood_radius: 150.0,
            nearest_count: 10,
            shielding_radius: 200.0,
            districts: vec![
                district(1, "Innere Stadt", BoundingBox::new(48.200, 48.218, 16.355, 16.385)),
                district(2, "Leopoldstadt", BoundingBox::new(48.205, 48.235, 16.385, 16.440)),
                district(3, "Landstraße", BoundingBox::new(48.185, 48.205, 16.385, 16.420)),
                district(4, "Wieden", BoundingBox::new(48.185, 48.200, 16.355, 16.385)),
                district(7, "Neubau", BoundingBox::new(48.195, 48.210, 16.335, 16.355)),
                district(10, "Favoriten", BoundingBox::new(48.140, 48.185, 16.340, 16.420)),
                district(13, "Hietzing", BoundingBox::new(48.160, 48.200, 16.200, 16.300)),
                district(21, "Floridsdorf", BoundingBox::new(48.250, 48.310, 16.360, 16.440)),
                district(22, "Donaustadt", BoundingBox::new(48.200, 48.260, 16.440, 16.550)),
            ],
        }
    }
}

// ============================================================================
// Building defaults
// ============================================================================

/// Values used when neither the caller nor an existing structure supplies a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingDefaults {
    pub height: f64,
    pub floors: u32,
    pub footprint: f64,
    pub roof_area: f64,
    pub surface_seal: f64,
    pub basement_depth: f64,
    pub ground_elevation: f64,
    pub has_green_roof: bool,
    pub has_solar: bool,
    pub material: Material,
}

impl Default for BuildingDefaults {
    fn default() -> Self {
        Self {
            height: 21.0,
            floors: 7,
            footprint: 600.0,
            roof_area: 600.0,
            surface_seal: 60.0,
            basement_depth: 3.0,
            ground_elevation: 0.5,
            has_green_roof: false,
            has_solar: false,
            material: Material::Concrete,
        }
    }
}

// ============================================================================
// Zoning
// ============================================================================

/// Regulatory building class (Bauklasse)
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassId {
    I,
    II,
    III,
    IV,
    V,
    VI,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingClass {
    pub id: ClassId,
    /// Meters
    pub max_height: f64,
    pub max_floors: u32,
    /// Floor area ratio cap
    pub max_density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictClass {
    pub district: u8,
    pub class: ClassId,
}

/// Polygon requiring extra facade and material approval (Schutzzone)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionZone {
    pub name: String,
    pub ring: Vec<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoningRules {
    /// Ascending by max height
    pub classes: Vec<BuildingClass>,
    pub district_classes: Vec<DistrictClass>,
    /// Applied to unknown or unmatched districts
    pub default_class: ClassId,
    /// Share of the tallest neighbor that still counts as neighborhood character
    pub contextual_max_factor: f64,
    /// Checked in order; the first containing zone wins
    pub protection_zones: Vec<ProtectionZone>,
}

impl ZoningRules {
    pub fn class(&self, id: ClassId) -> Option<&BuildingClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn class_id_for_district(&self, district: Option<u8>) -> ClassId {
        district
            .and_then(|n| self.district_classes.iter().find(|e| e.district == n))
            .map(|e| e.class)
            .unwrap_or(self.default_class)
    }

    /// Smallest class whose height cap accommodates `height`, saturating at the tallest class
    pub fn class_for_height(&self, height: f64) -> Option<&BuildingClass> {
        self.classes
            .iter()
            .find(|c| c.max_height >= height)
            .or_else(|| {
                self.classes
                    .iter()
                    .max_by(|a, b| a.max_height.total_cmp(&b.max_height))
            })
    }
}

impl Default for ZoningRules {
    fn default() -> Self {
        let class = |id, max_height, max_floors, max_density| BuildingClass {
            id,
            max_height,
            max_floors,
            max_density,
        };
        let zone = |name: &str, ring: &[(f64, f64)]| ProtectionZone {
            name: name.to_string(),
            ring: points(ring),
        };
        Self {
            classes: vec![
                class(ClassId::I, 9.0, 3, 1.0),
                class(ClassId::II, 12.0, 4, 1.5),
                class(ClassId::III, 16.0, 5, 2.0),
                class(ClassId::IV, 21.0, 7, 2.5),
                class(ClassId::V, 26.0, 8, 3.0),
                class(ClassId::VI, 80.0, 25, 5.0),
            ],
            district_classes: [
                (1, ClassId::V),
                (2, ClassId::V),
                (3, ClassId::IV),
                (4, ClassId::IV),
                (7, ClassId::IV),
                (10, ClassId::III),
                (13, ClassId::II),
                (21, ClassId::III),
                (22, ClassId::VI),
            ]
            .into_iter()
            .map(|(district, class)| DistrictClass { district, class })
            .collect(),
            default_class: ClassId::III,
            contextual_max_factor: 0.95,
            protection_zones: vec![
                zone(
                    "Innere Stadt",
                    &[
                        (48.2010, 16.3600),
                        (48.2160, 16.3620),
                        (48.2150, 16.3800),
                        (48.2060, 16.3820),
                        (48.2000, 16.3720),
                    ],
                ),
                zone(
                    "Spittelberg",
                    &[
                        (48.2010, 16.3500),
                        (48.2045, 16.3500),
                        (48.2045, 16.3560),
                        (48.2010, 16.3560),
                    ],
                ),
                zone(
                    "Josefstadt",
                    &[
                        (48.2080, 16.3450),
                        (48.2130, 16.3450),
                        (48.2130, 16.3530),
                        (48.2080, 16.3530),
                    ],
                ),
                zone(
                    "Wieden",
                    &[
                        (48.1920, 16.3640),
                        (48.1975, 16.3640),
                        (48.1975, 16.3720),
                        (48.1920, 16.3720),
                    ],
                ),
            ],
        }
    }
}

// ============================================================================
// Heritage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub position: GeoPoint,
    /// Meters
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeritageRules {
    /// World heritage buffer zone ring
    pub unesco_zone: Vec<GeoPoint>,
    /// Absolute ceiling inside the buffer zone, meters
    pub max_height: f64,
    /// Above this height the buffer zone requires enhanced review, meters
    pub review_height: f64,
    pub landmarks: Vec<Landmark>,
}

impl Default for HeritageRules {
    fn default() -> Self {
        let landmark = |name: &str, lat, lng, radius| Landmark {
            name: name.to_string(),
            position: GeoPoint::new(lat, lng),
            radius,
        };
        Self {
            unesco_zone: points(&[
                (48.2000, 16.3530),
                (48.2195, 16.3620),
                (48.2190, 16.3780),
                (48.2120, 16.3870),
                (48.2010, 16.3840),
                (48.1975, 16.3700),
            ]),
            max_height: 35.0,
            review_height: 26.0,
            landmarks: vec![
                landmark("Stephansdom", 48.2085, 16.3731, 250.0),
                landmark("Hofburg", 48.2066, 16.3655, 200.0),
                landmark("Karlskirche", 48.1982, 16.3718, 150.0),
                landmark("Belvedere", 48.1915, 16.3809, 300.0),
                landmark("Schönbrunn", 48.1845, 16.3122, 400.0),
                landmark("Riesenrad", 48.2166, 16.3958, 150.0),
            ],
        }
    }
}

// ============================================================================
// Subsurface
// ============================================================================

/// Underground line; stations stand in for the tunnel alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitLine {
    pub name: String,
    /// Tunnel depth below ground, meters
    pub depth: f64,
    pub stations: Vec<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsurfaceRules {
    pub lines: Vec<TransitLine>,
    pub critical_distance: f64,
    pub restricted_distance: f64,
    pub monitoring_distance: f64,
    /// Required vertical clearance between basement and tunnel, meters
    pub depth_clearance: f64,
    /// Measure to station-to-station segments instead of station vertices.
    /// Changes numeric outputs, so it stays opt-in.
    pub segment_distance: bool,
}

impl Default for SubsurfaceRules {
    fn default() -> Self {
        let line = |name: &str, depth, stations: &[(f64, f64)]| TransitLine {
            name: name.to_string(),
            depth,
            stations: points(stations),
        };
        Self {
            lines: vec![
                line(
                    "U1",
                    15.0,
                    &[
                        (48.1870, 16.3747),
                        (48.1945, 16.3705),
                        (48.2003, 16.3695),
                        (48.2085, 16.3722),
                        (48.2117, 16.3778),
                        (48.2185, 16.3925),
                        (48.2330, 16.4180),
                    ],
                ),
                line(
                    "U2",
                    18.0,
                    &[
                        (48.2003, 16.3695),
                        (48.2025, 16.3615),
                        (48.2055, 16.3585),
                        (48.2107, 16.3555),
                        (48.2153, 16.3617),
                        (48.2185, 16.3925),
                        (48.2105, 16.4205),
                        (48.2262, 16.5082),
                    ],
                ),
                line(
                    "U3",
                    25.0,
                    &[
                        (48.2110, 16.3110),
                        (48.1966, 16.3385),
                        (48.1990, 16.3525),
                        (48.2055, 16.3585),
                        (48.2095, 16.3655),
                        (48.2085, 16.3722),
                        (48.2065, 16.3845),
                        (48.1695, 16.4205),
                    ],
                ),
                line(
                    "U4",
                    12.0,
                    &[
                        (48.1975, 16.2615),
                        (48.1865, 16.3185),
                        (48.1848, 16.3355),
                        (48.2003, 16.3695),
                        (48.2065, 16.3845),
                        (48.2117, 16.3778),
                        (48.2355, 16.3585),
                        (48.2490, 16.3655),
                    ],
                ),
                line(
                    "U6",
                    10.0,
                    &[
                        (48.1305, 16.3105),
                        (48.1966, 16.3385),
                        (48.2110, 16.3390),
                        (48.2355, 16.3585),
                        (48.2565, 16.4005),
                    ],
                ),
            ],
            critical_distance: 30.0,
            restricted_distance: 50.0,
            monitoring_distance: 100.0,
            depth_clearance: 5.0,
            segment_distance: false,
        }
    }
}

// ============================================================================
// Climate
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatZone {
    Low,
    Moderate,
    High,
    Extreme,
}

impl HeatZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatZone::Low => "low",
            HeatZone::Moderate => "moderate",
            HeatZone::High => "high",
            HeatZone::Extreme => "extreme",
        }
    }

    pub fn requires_greening(&self) -> bool {
        matches!(self, HeatZone::High | HeatZone::Extreme)
    }
}

/// Urban heat island band: applies below `max_distance` meters from the centre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatBand {
    pub zone: HeatZone,
    pub max_distance: f64,
    /// Kelvin above the rural reference
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateRules {
    pub seal_blocking_percent: f64,
    pub seal_warning_percent: f64,
    pub heat_island_center: GeoPoint,
    /// Ascending by max_distance
    pub heat_bands: Vec<HeatBand>,
    /// Intensity beyond the last band (zone `low`)
    pub outer_intensity: f64,
    /// Flood rules apply only inside this district and polygon
    pub flood_district: u8,
    pub flood_zone: Vec<GeoPoint>,
    /// Meters above the reference level
    pub flood_min_elevation: f64,
    /// Square meters
    pub green_roof_min_footprint: f64,
    /// Square meters
    pub solar_min_roof_area: f64,
    pub retention_liters_per_m2: f64,
}

impl Default for ClimateRules {
    fn default() -> Self {
        let band = |zone, max_distance, intensity| HeatBand {
            zone,
            max_distance,
            intensity,
        };
        Self {
            seal_blocking_percent: 80.0,
            seal_warning_percent: 70.0,
            heat_island_center: GeoPoint::new(48.2082, 16.3738),
            heat_bands: vec![
                band(HeatZone::Extreme, 2_000.0, 5.5),
                band(HeatZone::High, 5_000.0, 3.5),
                band(HeatZone::Moderate, 10_000.0, 2.0),
            ],
            outer_intensity: 1.0,
            flood_district: 22,
            flood_zone: points(&[
                (48.2050, 16.4400),
                (48.2450, 16.4400),
                (48.2450, 16.4650),
                (48.2050, 16.4650),
            ]),
            flood_min_elevation: 1.0,
            green_roof_min_footprint: 500.0,
            solar_min_roof_area: 300.0,
            retention_liters_per_m2: 30.0,
        }
    }
}

// ============================================================================
// Structural
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeismicRules {
    /// West of this longitude is stable bedrock, east is sediment basin
    pub bedrock_max_lng: f64,
    pub bedrock_score: i32,
    pub sediment_score: i32,
    /// Meters
    pub tall_height: f64,
    pub timber_bonus: i32,
    /// Tall sediment-zone concrete without an upgraded system
    pub unreinforced_score: i32,
}

impl Default for SeismicRules {
    fn default() -> Self {
        Self {
            bedrock_max_lng: 16.38,
            bedrock_score: 95,
            sediment_score: 75,
            tall_height: 40.0,
            timber_bonus: 15,
            unreinforced_score: 35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindRules {
    pub high_min_neighbors: usize,
    pub medium_min_neighbors: usize,
    pub high_score: i32,
    pub medium_score: i32,
    pub low_score: i32,
    /// Meters
    pub tall_height: f64,
    /// Replaces the low shielding score for tall buildings
    pub exposed_tall_score: i32,
}

impl Default for WindRules {
    fn default() -> Self {
        Self {
            high_min_neighbors: 15,
            medium_min_neighbors: 5,
            high_score: 95,
            medium_score: 80,
            low_score: 60,
            tall_height: 60.0,
            exposed_tall_score: 40,
        }
    }
}

fn points(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
    coords
        .iter()
        .map(|&(lat, lng)| GeoPoint::new(lat, lng))
        .collect()
}
