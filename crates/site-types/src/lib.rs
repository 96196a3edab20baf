//! Data model shared by the audit engine and its HTTP front end
//!
//! Field names serialize as camelCase and are stable wire names.

pub mod audit;
pub mod types;

pub use audit::{
    clamp_score, AggregateResult, AuditReport, AuditResult, AuditStatus, Constraint,
    ConstraintType, Domain, DomainVerdict, EvaluatorKind, EvaluatorResults, Mandate, MandateType,
    Remediation, Requirement, Severity,
};
pub use types::{
    AuditRequest, Building, BuildingParams, Context, District, Feature, FeatureProperties,
    GeoPoint, Geometry, Material, Neighbor, NeighborhoodStats, StructuralSystem, METERS_PER_LEVEL,
};
