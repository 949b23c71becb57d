use easel_primitives::{FieldError, ValidationErrors, WidgetId};
use easel_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ordering::OrderingError;

/// Errors returned by [`crate::WidgetService`].
///
/// All of them are local to the request that produced it; no variant leaves
/// the widget set partially modified.
#[derive(Debug, Error)]
pub enum ServiceError {
	/// The referenced widget does not exist.
	#[error("Widget was not found.")]
	NotFound(WidgetId),

	/// The requested page size is zero or above the configured ceiling.
	#[error("Page size must be between 1 and {max}")]
	InvalidPageSize { requested: u32, max: u32 },

	#[error(transparent)]
	Validation(#[from] ValidationErrors),

	#[error(transparent)]
	Ordering(#[from] OrderingError),

	#[error("storage failure: {0}")]
	Store(#[from] StoreError),
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Client-facing error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub message: String,
	pub errors: Vec<FieldError>,
}

impl ErrorResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			errors: Vec::new(),
		}
	}
}

impl From<&ServiceError> for ErrorResponse {
	fn from(err: &ServiceError) -> Self {
		match err {
			ServiceError::Validation(v) => Self {
				message: "Validation error".to_string(),
				errors: v.errors.clone(),
			},
			other => Self::new(other.to_string()),
		}
	}
}
