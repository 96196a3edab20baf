//! Aggregation of the six evaluator results into one verdict
//!
//! Seismic and wind are averaged into a single structural domain, so there
//! are always five domains. Constraints are collected in evaluator
//! declaration order, which also fixes the key risk pick.

use chrono::Utc;
use site_types::{
    AggregateResult, AuditStatus, Building, Constraint, Context, Domain, DomainVerdict,
    EvaluatorResults, Mandate, Severity,
};
use tracing::{info, instrument};

use crate::remediation;

/// Placeholder key risk when nothing critical was found
pub const NO_KEY_RISK: &str = "No critical constraints identified";

pub const HIGH_FEASIBILITY: u32 = 80;
pub const MEDIUM_FEASIBILITY: u32 = 60;

/// Per-domain verdicts in domain declaration order
pub fn domain_verdicts(results: &EvaluatorResults) -> [DomainVerdict; 5] {
    let single = |domain, r: &site_types::AuditResult| DomainVerdict {
        domain,
        passed: r.passed,
        score: f64::from(r.score),
    };
    [
        single(Domain::Zoning, &results.zoning),
        single(Domain::Heritage, &results.heritage),
        single(Domain::Subsurface, &results.subsurface),
        single(Domain::Climate, &results.climate),
        DomainVerdict {
            domain: Domain::Structural,
            passed: results.seismic.passed && results.wind.passed,
            score: (f64::from(results.seismic.score) + f64::from(results.wind.score)) / 2.0,
        },
    ]
}

/// Rounded mean of the domain scores
pub fn feasibility(domains: &[DomainVerdict]) -> u32 {
    if domains.is_empty() {
        return 0;
    }
    let sum: f64 = domains.iter().map(|d| d.score).sum();
    (sum / domains.len() as f64).round() as u32
}

/// Status decision; the first matching rule wins
pub fn determine_status(has_blocking: bool, all_passed: bool, feasibility: u32) -> AuditStatus {
    if has_blocking {
        AuditStatus::Rejected
    } else if all_passed && feasibility >= HIGH_FEASIBILITY {
        AuditStatus::High
    } else if feasibility >= MEDIUM_FEASIBILITY {
        AuditStatus::Medium
    } else {
        AuditStatus::Low
    }
}

/// Message of the first critical or blocking constraint
pub fn key_risk(constraints: &[Constraint]) -> String {
    constraints
        .iter()
        .find(|c| c.severity.is_key_risk())
        .map(|c| c.message.clone())
        .unwrap_or_else(|| NO_KEY_RISK.to_string())
}

/// Union of all constraints in evaluator declaration order
pub fn collect_constraints(results: &EvaluatorResults) -> Vec<Constraint> {
    results
        .ordered()
        .into_iter()
        .flat_map(|r| r.constraints.iter().cloned())
        .collect()
}

/// Union of all mandates in evaluator declaration order
pub fn collect_mandates(results: &EvaluatorResults) -> Vec<Mandate> {
    results
        .ordered()
        .into_iter()
        .flat_map(|r| r.mandates.iter().cloned())
        .collect()
}

/// Combine the evaluator results into the final verdict
#[instrument(skip_all)]
pub fn aggregate(results: EvaluatorResults, building: Building, context: Context) -> AggregateResult {
    let domains = domain_verdicts(&results);
    let feasibility = feasibility(&domains);
    let domains_passed = domains.iter().filter(|d| d.passed).count();
    let constraints = collect_constraints(&results);
    let has_blocking = constraints.iter().any(|c| c.severity == Severity::Blocking);
    let status = determine_status(has_blocking, domains_passed == domains.len(), feasibility);

    info!(
        feasibility,
        ?status,
        domains_passed,
        constraints = constraints.len(),
        "Audit aggregated"
    );

    AggregateResult {
        feasibility,
        status,
        domains_total: domains.len(),
        domains: domains.to_vec(),
        domains_passed,
        has_blocking,
        key_risk: key_risk(&constraints),
        remediations: remediation::advise(&constraints),
        constraints,
        mandates: collect_mandates(&results),
        results,
        building,
        context,
        audited_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{building, context};
    use serde_json::Value;
    use site_types::{AuditResult, ConstraintType, EvaluatorKind, MandateType};

    fn result(kind: EvaluatorKind, passed: bool, score: i32) -> AuditResult {
        AuditResult::new(kind, passed, score)
    }

    fn all_passing(seismic: i32, wind: i32) -> EvaluatorResults {
        EvaluatorResults {
            zoning: result(EvaluatorKind::Zoning, true, 100),
            heritage: result(EvaluatorKind::Heritage, true, 100),
            subsurface: result(EvaluatorKind::Subsurface, true, 100),
            climate: result(EvaluatorKind::Climate, true, 100),
            seismic: result(EvaluatorKind::Seismic, true, seismic),
            wind: result(EvaluatorKind::Wind, true, wind),
        }
    }

    #[test]
    fn test_structural_domain_is_averaged() {
        let domains = domain_verdicts(&all_passing(80, 90));
        assert_eq!(domains[4].domain, Domain::Structural);
        assert_eq!(domains[4].score, 85.0);
        assert_eq!(feasibility(&domains), 97);
    }

    #[test]
    fn test_structural_requires_both_passed() {
        let mut results = all_passing(95, 40);
        results.wind.passed = false;
        let verdict = aggregate(results, building(), context());
        assert_eq!(verdict.domains_passed, 4);
        assert_eq!(verdict.domains_total, 5);
        assert!(!verdict.domain(Domain::Structural).unwrap().passed);
    }

    #[test]
    fn test_blocking_wins_over_high_feasibility() {
        assert_eq!(determine_status(true, true, 95), AuditStatus::Rejected);
    }

    #[test]
    fn test_status_ladder() {
        assert_eq!(determine_status(false, true, 80), AuditStatus::High);
        assert_eq!(determine_status(false, false, 95), AuditStatus::Medium);
        assert_eq!(determine_status(false, true, 79), AuditStatus::Medium);
        assert_eq!(determine_status(false, true, 60), AuditStatus::Medium);
        assert_eq!(determine_status(false, true, 59), AuditStatus::Low);
    }

    #[test]
    fn test_key_risk_is_first_critical_in_declaration_order() {
        let mut results = all_passing(95, 95);
        results.zoning.constraints.push(Constraint::new(
            ConstraintType::FloorViolation,
            Severity::Warning,
            "floors",
            Value::Null,
        ));
        results.heritage.constraints.push(Constraint::new(
            ConstraintType::UnescoHeight,
            Severity::Blocking,
            "heritage ceiling",
            Value::Null,
        ));
        results.wind.constraints.push(Constraint::new(
            ConstraintType::WindExposure,
            Severity::Critical,
            "wind",
            Value::Null,
        ));

        let verdict = aggregate(results, building(), context());
        assert_eq!(verdict.key_risk, "heritage ceiling");
        assert!(verdict.has_blocking);
        assert_eq!(verdict.status, AuditStatus::Rejected);
        assert_eq!(verdict.constraints.len(), 3);
        assert_eq!(verdict.remediations[0].constraint_type, ConstraintType::UnescoHeight);
    }

    #[test]
    fn test_mandates_are_lifted_to_the_verdict() {
        let mut results = all_passing(95, 95);
        results.climate.mandates.push(Mandate {
            mandate_type: MandateType::GreenRoof,
            message: "green roof".to_string(),
            data: Value::Null,
        });
        results.climate.mandates.push(Mandate {
            mandate_type: MandateType::WaterRetention,
            message: "retention".to_string(),
            data: Value::Null,
        });

        let verdict = aggregate(results, building(), context());
        let types: Vec<_> = verdict.mandates.iter().map(|m| m.mandate_type).collect();
        assert_eq!(types, vec![MandateType::GreenRoof, MandateType::WaterRetention]);
        assert_eq!(verdict.mandates, verdict.results.climate.mandates);
    }

    #[test]
    fn test_key_risk_placeholder() {
        let verdict = aggregate(all_passing(95, 95), building(), context());
        assert_eq!(verdict.key_risk, NO_KEY_RISK);
        assert_eq!(verdict.status, AuditStatus::High);
        assert!(verdict.remediations.is_empty());
    }
}
