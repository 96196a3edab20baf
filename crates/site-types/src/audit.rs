//! Audit verdicts: per-evaluator results and the aggregated feasibility report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Building, Context};

/// Constraint importance, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Important,
    Critical,
    /// Forces overall rejection
    Blocking,
}

impl Severity {
    /// Critical or blocking findings qualify as the key risk
    pub fn is_key_risk(&self) -> bool {
        *self >= Severity::Critical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    HeightViolation,
    HeightVariance,
    FloorViolation,
    Schutzzone,
    UnescoHeight,
    UnescoReview,
    LandmarkProximity,
    TunnelCritical,
    TunnelRestricted,
    TunnelMonitoring,
    BasementDepthConflict,
    SurfaceSealBlocking,
    SurfaceSealWarning,
    SeismicStructural,
    WindExposure,
}

/// One violation or advisory finding. Created by an evaluator, only collected afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Constraint {
    pub fn new(
        constraint_type: ConstraintType,
        severity: Severity,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            constraint_type,
            severity,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MandateType {
    FacadeGreening,
    FloodProtection,
    GreenRoof,
    SolarPanels,
    WaterRetention,
}

/// Required future action; contributes to score but never fails an audit by itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mandate {
    pub mandate_type: MandateType,
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// Structural remediation hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub code: String,
    pub message: String,
}

/// The six rule evaluators, in fixed declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    Zoning,
    Heritage,
    Subsurface,
    Climate,
    Seismic,
    Wind,
}

impl EvaluatorKind {
    pub const ALL: [EvaluatorKind; 6] = [
        EvaluatorKind::Zoning,
        EvaluatorKind::Heritage,
        EvaluatorKind::Subsurface,
        EvaluatorKind::Climate,
        EvaluatorKind::Seismic,
        EvaluatorKind::Wind,
    ];

    pub fn domain(&self) -> Domain {
        match self {
            EvaluatorKind::Zoning => Domain::Zoning,
            EvaluatorKind::Heritage => Domain::Heritage,
            EvaluatorKind::Subsurface => Domain::Subsurface,
            EvaluatorKind::Climate => Domain::Climate,
            EvaluatorKind::Seismic | EvaluatorKind::Wind => Domain::Structural,
        }
    }
}

/// Scoring domains; seismic and wind share the structural domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Zoning,
    Heritage,
    Subsurface,
    Climate,
    Structural,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Zoning,
        Domain::Heritage,
        Domain::Subsurface,
        Domain::Climate,
        Domain::Structural,
    ];
}

/// Clamp raw score arithmetic into 0..=100
pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}

/// One evaluator's verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub evaluator: EvaluatorKind,
    pub passed: bool,
    /// Always within 0..=100
    pub score: u8,
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub mandates: Vec<Mandate>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    /// Free-form diagnostics
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl AuditResult {
    pub fn new(evaluator: EvaluatorKind, passed: bool, score: i32) -> Self {
        Self {
            evaluator,
            passed,
            score: clamp_score(score),
            constraints: Vec::new(),
            mandates: Vec::new(),
            requirements: Vec::new(),
            data: Map::new(),
        }
    }

    pub fn has_severity(&self, severity: Severity) -> bool {
        self.constraints.iter().any(|c| c.severity == severity)
    }

    pub fn has_constraint(&self, constraint_type: ConstraintType) -> bool {
        self.constraints
            .iter()
            .any(|c| c.constraint_type == constraint_type)
    }
}

/// All six results, addressable by evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorResults {
    pub zoning: AuditResult,
    pub heritage: AuditResult,
    pub subsurface: AuditResult,
    pub climate: AuditResult,
    pub seismic: AuditResult,
    pub wind: AuditResult,
}

impl EvaluatorResults {
    /// Results in declaration order
    pub fn ordered(&self) -> [&AuditResult; 6] {
        [
            &self.zoning,
            &self.heritage,
            &self.subsurface,
            &self.climate,
            &self.seismic,
            &self.wind,
        ]
    }

    pub fn get(&self, kind: EvaluatorKind) -> &AuditResult {
        match kind {
            EvaluatorKind::Zoning => &self.zoning,
            EvaluatorKind::Heritage => &self.heritage,
            EvaluatorKind::Subsurface => &self.subsurface,
            EvaluatorKind::Climate => &self.climate,
            EvaluatorKind::Seismic => &self.seismic,
            EvaluatorKind::Wind => &self.wind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Rejected,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainVerdict {
    pub domain: Domain,
    pub passed: bool,
    pub score: f64,
}

/// Suggested corrective action for one constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remediation {
    /// 1 = most urgent
    pub priority: usize,
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub severity: Severity,
    pub action: String,
}

/// The final verdict of one audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub feasibility: u32,
    pub status: AuditStatus,
    pub domains: Vec<DomainVerdict>,
    pub domains_passed: usize,
    pub domains_total: usize,
    pub has_blocking: bool,
    pub key_risk: String,
    pub constraints: Vec<Constraint>,
    /// Union of all mandates in evaluator declaration order
    #[serde(default)]
    pub mandates: Vec<Mandate>,
    pub remediations: Vec<Remediation>,
    pub results: EvaluatorResults,
    pub building: Building,
    pub context: Context,
    /// Only wall-clock field; excluded from idempotence comparisons
    pub audited_at: DateTime<Utc>,
}

impl AggregateResult {
    pub fn domain(&self, domain: Domain) -> Option<&DomainVerdict> {
        self.domains.iter().find(|d| d.domain == domain)
    }
}

/// Wire envelope separating run-level failures from compliance verdicts.
///
/// A REJECTED audit is still `success: true`; `success: false` means the run
/// itself never reached the evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<AggregateResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AuditReport {
    pub fn success(result: AggregateResult) -> Self {
        Self {
            success: true,
            result: Some(Box::new(result)),
            error: None,
            code: None,
        }
    }

    pub fn failure(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            code: Some(code.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Important);
        assert!(Severity::Important < Severity::Critical);
        assert!(Severity::Critical < Severity::Blocking);
        assert!(Severity::Blocking.is_key_risk());
        assert!(Severity::Critical.is_key_risk());
        assert!(!Severity::Important.is_key_risk());
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-40), 0);
        assert_eq!(clamp_score(135), 100);
        assert_eq!(clamp_score(63), 63);
    }

    #[test]
    fn test_constraint_wire_names() {
        let c = Constraint::new(
            ConstraintType::TunnelCritical,
            Severity::Blocking,
            "too close",
            json!({"distance": 12.0}),
        );
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["type"], "TUNNEL_CRITICAL");
        assert_eq!(value["severity"], "blocking");
        assert_eq!(value["data"]["distance"], 12.0);
    }

    #[test]
    fn test_evaluator_domains() {
        assert_eq!(EvaluatorKind::Seismic.domain(), Domain::Structural);
        assert_eq!(EvaluatorKind::Wind.domain(), Domain::Structural);
        assert_eq!(EvaluatorKind::Climate.domain(), Domain::Climate);
    }

    #[test]
    fn test_failure_report_shape() {
        let report = AuditReport::failure("INVALID_PARAMETER", "height must be positive");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "height must be positive");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(AuditStatus::Rejected).unwrap(),
            json!("REJECTED")
        );
    }
}
