//! Rule evaluators
//!
//! Six independent audits, each a pure function of the building and the
//! shared context. Evaluators never fail: problems surface as a failed
//! [`AuditResult`], and each evaluator owns its slice of the regulatory
//! configuration.

pub mod climate;
pub mod heritage;
pub mod seismic;
pub mod subsurface;
pub mod wind;
pub mod zoning;

use site_types::{AuditResult, Building, Context, EvaluatorKind};

use crate::config::Regulations;

pub use climate::ClimateEvaluator;
pub use heritage::HeritageEvaluator;
pub use seismic::SeismicEvaluator;
pub use subsurface::SubsurfaceEvaluator;
pub use wind::WindEvaluator;
pub use zoning::ZoningEvaluator;

/// Trait for domain audits
pub trait Evaluator: Send + Sync {
    fn kind(&self) -> EvaluatorKind;

    /// Audit the building. Deterministic and side-effect free.
    fn execute(&self, building: &Building, context: &Context) -> AuditResult;
}

/// The full evaluator set, constructed from one regulatory regime
#[derive(Debug, Clone)]
pub struct Evaluators {
    pub zoning: ZoningEvaluator,
    pub heritage: HeritageEvaluator,
    pub subsurface: SubsurfaceEvaluator,
    pub climate: ClimateEvaluator,
    pub seismic: SeismicEvaluator,
    pub wind: WindEvaluator,
}

impl Evaluators {
    pub fn new(regs: &Regulations) -> Self {
        Self {
            zoning: ZoningEvaluator::new(regs.zoning.clone()),
            heritage: HeritageEvaluator::new(regs.heritage.clone()),
            subsurface: SubsurfaceEvaluator::new(regs.subsurface.clone()),
            climate: ClimateEvaluator::new(regs.climate.clone()),
            seismic: SeismicEvaluator::new(regs.seismic.clone()),
            wind: WindEvaluator::new(regs.wind.clone()),
        }
    }

    /// All evaluators in declaration order
    pub fn all(&self) -> [&dyn Evaluator; 6] {
        [
            &self.zoning,
            &self.heritage,
            &self.subsurface,
            &self.climate,
            &self.seismic,
            &self.wind,
        ]
    }
}

/// Start score before penalties
pub(crate) const BASELINE_SCORE: i32 = 100;

/// Round meters for diagnostics so data bags stay readable
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
