use thiserror::Error;

/// Run-level failures. Only input normalization produces these; once the
/// evaluators start, an audit always completes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuditError {
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

impl AuditError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AuditError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            AuditError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AuditError::InvalidCoordinates { .. } => "INVALID_COORDINATES",
        }
    }
}
