//! Remediation advice
//!
//! Maps each constraint to a corrective action and orders them by urgency.
//! The list is structured so a narrative layer can phrase it; nothing here
//! depends on such a layer.

use site_types::{Constraint, ConstraintType, Remediation};

/// Corrective action for a constraint type
pub fn action_for(constraint_type: ConstraintType) -> &'static str {
    match constraint_type {
        ConstraintType::HeightViolation => {
            "Reduce building height to the contextual limit or apply for a rezoning"
        }
        ConstraintType::HeightVariance => {
            "Apply for a height variance citing the surrounding building heights"
        }
        ConstraintType::FloorViolation => "Reduce the floor count or increase storey heights",
        ConstraintType::Schutzzone => {
            "Submit facade and material designs for protection zone approval"
        }
        ConstraintType::UnescoHeight => {
            "Reduce height below the world heritage ceiling; no variance is available"
        }
        ConstraintType::UnescoReview => {
            "Prepare a visual impact study for the heritage review board"
        }
        ConstraintType::LandmarkProximity => {
            "Commission a sightline analysis towards the protected landmark"
        }
        ConstraintType::TunnelCritical => {
            "Relocate the footprint outside the tunnel exclusion band"
        }
        ConstraintType::TunnelRestricted => {
            "Obtain transit operator approval and a vibration isolation design"
        }
        ConstraintType::TunnelMonitoring => {
            "Install settlement monitoring during excavation"
        }
        ConstraintType::BasementDepthConflict => {
            "Reduce basement depth to keep the required tunnel clearance"
        }
        ConstraintType::SurfaceSealBlocking => {
            "Replace sealed surfaces with permeable paving or planting"
        }
        ConstraintType::SurfaceSealWarning => "Increase the unsealed share of the plot",
        ConstraintType::SeismicStructural => {
            "Adopt an upgraded structural system or switch to timber construction"
        }
        ConstraintType::WindExposure => {
            "Commission a wind tunnel study and reinforce the facade"
        }
    }
}

/// One remediation per constraint, most severe first. Ties keep the
/// constraint order, and priorities count from 1.
pub fn advise(constraints: &[Constraint]) -> Vec<Remediation> {
    let mut ordered: Vec<&Constraint> = constraints.iter().collect();
    // Stable sort keeps aggregate order within a severity
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, c)| Remediation {
            priority: i + 1,
            constraint_type: c.constraint_type,
            severity: c.severity,
            action: action_for(c.constraint_type).to_string(),
        })
        .collect()
}
