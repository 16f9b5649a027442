//! Error handling for the service layer
//!
//! Every service returns `ServiceResult<T>`. Store and permission failures
//! convert with `?`; the remaining variants are raised by the services
//! themselves.
//!
//! # Example
//!
//! ```ignore
//! use synergy_hub::error::{ServiceError, ServiceResult};
//!
//! async fn rename(projects: &ProjectService, session: &Session, id: i64) -> ServiceResult<()> {
//!     let mut patch = UpdateProject::for_project(id);
//!     patch.name = Some("Renamed".to_string());
//!     projects.update(session, patch).await?;
//!     Ok(())
//! }
//! ```

use synergy_shared::auth::AuthzError;
use synergy_shared::models::RecordId;
use synergy_shared::store::StoreError;
use validator::ValidationErrors;

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Unified service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Record store failed or rejected the whole request
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Session is not allowed to perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(#[from] AuthzError),

    #[error("{collection} record {id} not found")]
    NotFound { collection: &'static str, id: RecordId },

    /// Payload failed validation before reaching the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Stored record does not match the expected shape
    #[error("Failed to decode {collection} record: {message}")]
    Decode {
        collection: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn not_found(collection: &'static str, id: RecordId) -> Self {
        ServiceError::NotFound { collection, id }
    }

    pub fn decode(collection: &'static str, err: impl std::fmt::Display) -> Self {
        ServiceError::Decode {
            collection,
            message: err.to_string(),
        }
    }

    /// Whether the failure came from missing permissions
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ServiceError::Forbidden(_))
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        fields.sort();
        ServiceError::Validation(fields.join("; "))
    }
}
