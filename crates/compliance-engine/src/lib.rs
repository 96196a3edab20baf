//! Building compliance audit engine
//!
//! Runs one building position through six regulatory evaluators (zoning,
//! heritage, subsurface, climate, seismic, wind) and aggregates them into a
//! feasibility verdict:
//!
//! 1. [`normalizer`] merges caller overrides, an optional existing structure
//!    and the configured defaults into a validated [`Building`].
//! 2. [`jurisdiction`] resolves the district and the neighborhood facts.
//! 3. The [`rules`] evaluators audit the building against the context.
//! 4. [`aggregate`] folds the results into an [`AggregateResult`].
//!
//! Only step 1 can fail. All regulatory values come from [`Regulations`],
//! injected at construction.
//!
//! ```
//! use compliance_engine::ComplianceEngine;
//! use site_types::BuildingParams;
//!
//! let engine = ComplianceEngine::new();
//! let verdict = engine
//!     .run_audit(48.1700, 16.3750, &BuildingParams::default(), &[])
//!     .unwrap();
//! assert_eq!(verdict.domains_total, 5);
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod geo;
pub mod jurisdiction;
pub mod normalizer;
pub mod remediation;
pub mod rules;

use std::panic;
use std::thread;

use site_types::{
    AggregateResult, AuditReport, AuditRequest, AuditResult, Building, BuildingParams, Context,
    EvaluatorResults, Feature, GeoPoint,
};
use tracing::{debug, instrument, warn};

pub use config::Regulations;
pub use error::AuditError;
pub use jurisdiction::ContextOverrides;
pub use rules::{Evaluator, Evaluators};

/// How the six evaluators are scheduled. Both modes produce identical results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// One scoped thread per evaluator, joined before aggregation
    Parallel,
}

/// ComplianceEngine entry point
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    regulations: Regulations,
    evaluators: Evaluators,
    mode: ExecutionMode,
}

impl ComplianceEngine {
    /// Engine with the built-in Vienna regime
    pub fn new() -> Self {
        Self::with_regulations(Regulations::default())
    }

    pub fn with_regulations(regulations: Regulations) -> Self {
        Self {
            evaluators: Evaluators::new(&regulations),
            regulations,
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn regulations(&self) -> &Regulations {
        &self.regulations
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run all evaluators against a finished building and context
    pub fn evaluate(&self, building: &Building, context: &Context) -> EvaluatorResults {
        let evaluators = self.evaluators.all();
        let [zoning, heritage, subsurface, climate, seismic, wind] = match self.mode {
            ExecutionMode::Sequential => evaluators.map(|e| run(e, building, context)),
            ExecutionMode::Parallel => thread::scope(|s| {
                evaluators
                    .map(|e| s.spawn(move || run(e, building, context)))
                    .map(|handle| {
                        // An evaluator panic is a defect, never a verdict
                        handle
                            .join()
                            .unwrap_or_else(|payload| panic::resume_unwind(payload))
                    })
            }),
        };
        EvaluatorResults {
            zoning,
            heritage,
            subsurface,
            climate,
            seismic,
            wind,
        }
    }

    /// Full pipeline for one request
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the request cannot be normalized into a
    /// valid building. No evaluator runs in that case.
    #[instrument(skip_all, fields(lat = request.latitude, lng = request.longitude))]
    pub fn audit(
        &self,
        request: &AuditRequest,
        dataset: &[Feature],
    ) -> Result<AggregateResult, AuditError> {
        let position = GeoPoint::new(request.latitude, request.longitude);

        let existing = request.existing_structure_id.as_deref().and_then(|id| {
            let found = normalizer::find_structure(dataset, id);
            if found.is_none() {
                warn!(id, "Existing structure not in dataset, using defaults");
            }
            found
        });

        let building = normalizer::normalize(
            position,
            &request.overrides,
            existing,
            &self.regulations.defaults,
        )?;
        let neighborhood_radius = request
            .neighborhood_radius
            .map(normalizer::validate_radius)
            .transpose()?;

        let context = jurisdiction::resolve_context(
            &self.regulations.context,
            building.position,
            dataset,
            ContextOverrides {
                district: request.district,
                neighborhood_radius,
                exclude_id: building.existing_structure_id.as_deref(),
            },
        );
        debug!(
            district = ?context.district_number(),
            neighbors = context.neighborhood.count,
            shielding = context.shielding_count,
            "Context resolved"
        );

        let results = self.evaluate(&building, &context);
        Ok(aggregate::aggregate(results, building, context))
    }

    /// Audit a position with partial building overrides
    pub fn run_audit(
        &self,
        latitude: f64,
        longitude: f64,
        overrides: &BuildingParams,
        dataset: &[Feature],
    ) -> Result<AggregateResult, AuditError> {
        let request = AuditRequest {
            latitude,
            longitude,
            overrides: overrides.clone(),
            ..Default::default()
        };
        self.audit(&request, dataset)
    }

    /// Like [`ComplianceEngine::audit`], with run-level failures folded into
    /// the wire envelope
    pub fn report(&self, request: &AuditRequest, dataset: &[Feature]) -> AuditReport {
        match self.audit(request, dataset) {
            Ok(result) => AuditReport::success(result),
            Err(e) => AuditReport::failure(e.code(), e.to_string()),
        }
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn run(evaluator: &dyn Evaluator, building: &Building, context: &Context) -> AuditResult {
    let result = evaluator.execute(building, context);
    debug!(
        evaluator = ?result.evaluator,
        score = result.score,
        passed = result.passed,
        constraints = result.constraints.len(),
        "Evaluator finished"
    );
    result
}
