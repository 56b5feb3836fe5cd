//! Error taxonomy for lead pipeline operations.
//!
//! Store failures come up from the database layer as `anyhow::Error` and are
//! carried verbatim; nothing in the pipeline retries them.

use uuid::Uuid;

/// Failure of a lead pipeline operation
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    /// Missing or malformed input; nothing was written
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Target id does not resolve
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Caller's expected version no longer matches the stored record
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Record store failure
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl LeadError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn lead_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "lead",
            id,
        }
    }

    /// Short machine-readable kind, used for `--json` error output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Store(_) => "store",
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for LeadError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.into())
    }
}

pub type LeadResult<T> = std::result::Result<T, LeadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = LeadError::validation("name", "is required");
        assert_eq!(err.to_string(), "invalid name: is required");
        assert_eq!(err.field(), Some("name"));
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_store_error_is_verbatim() {
        let err: LeadError = anyhow::anyhow!("disk I/O error").into();
        assert_eq!(err.to_string(), "disk I/O error");
        assert_eq!(err.kind(), "store");
    }
}
