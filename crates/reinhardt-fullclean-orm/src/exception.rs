//! Error types for the model layer

use crate::validation::ValidationError;
use thiserror::Error;

/// Errors raised by the model layer
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum Error {
	/// Model-level validation failed
	#[error("Validation error: {0}")]
	Validation(#[from] ValidationError),

	/// The model schema does not declare the requested field
	#[error("{model} has no field named '{field}'")]
	FieldDoesNotExist { model: String, field: String },

	/// A value could not be assigned through the model's setter
	#[error("Cannot assign {value} to {model}.{field}: {reason}")]
	Assignment {
		model: String,
		field: String,
		value: String,
		reason: String,
	},

	/// The uniqueness lookup backend failed
	#[error("Database error: {0}")]
	Database(String),
}

impl Error {
	/// Create an assignment error for `model.field`
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::Error;
	/// use serde_json::json;
	///
	/// let err = Error::assignment("Article", "title", &json!(42), "expected a string");
	/// assert_eq!(
	///     err.to_string(),
	///     "Cannot assign 42 to Article.title: expected a string"
	/// );
	/// ```
	pub fn assignment(
		model: impl Into<String>,
		field: impl Into<String>,
		value: &serde_json::Value,
		reason: impl Into<String>,
	) -> Self {
		Self::Assignment {
			model: model.into(),
			field: field.into(),
			value: value.to_string(),
			reason: reason.into(),
		}
	}

	/// Returns the collected validation errors, if this is a validation failure
	pub fn as_validation(&self) -> Option<&ValidationError> {
		match self {
			Error::Validation(err) => Some(err),
			_ => None,
		}
	}

	/// Check if this error was caused by bad input rather than misuse
	pub fn is_validation_error(&self) -> bool {
		matches!(self, Error::Validation(_))
	}
}

pub type Result<T> = std::result::Result<T, Error>;
