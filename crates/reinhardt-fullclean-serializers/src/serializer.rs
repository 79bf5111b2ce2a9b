//! Serializer error types
//!
//! [`SerializerErrors`] is the field-keyed structure callers render in API
//! responses. [`as_serializer_error`] converts the model layer's
//! [`ValidationError`] into it so both validation passes report the same shape.

use indexmap::IndexMap;
use reinhardt_fullclean_orm::{ErrorDetail, NON_FIELD_ERRORS, ValidationError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Field-keyed validation errors, rendered as `{"field": ["message", ...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerErrors {
	errors: IndexMap<String, Vec<ErrorDetail>>,
}

impl SerializerErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a detail under `field`
	pub fn add(&mut self, field: impl Into<String>, detail: ErrorDetail) {
		self.errors.entry(field.into()).or_default().push(detail);
	}

	/// Record several details under `field`
	pub fn extend(&mut self, field: impl Into<String>, details: Vec<ErrorDetail>) {
		self.errors.entry(field.into()).or_default().extend(details);
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn len(&self) -> usize {
		self.errors.len()
	}

	pub fn has_field(&self, field: &str) -> bool {
		self.errors.contains_key(field)
	}

	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.errors.keys().map(String::as_str)
	}

	pub fn get(&self, field: &str) -> Option<&[ErrorDetail]> {
		self.errors.get(field).map(Vec::as_slice)
	}

	/// Messages recorded for `field`
	pub fn messages_for(&self, field: &str) -> Vec<&str> {
		self.get(field)
			.map(|details| details.iter().map(|d| d.message.as_str()).collect())
			.unwrap_or_default()
	}

	/// Codes recorded for `field`
	pub fn codes_for(&self, field: &str) -> Vec<&str> {
		self.get(field)
			.map(|details| details.iter().map(|d| d.code.as_str()).collect())
			.unwrap_or_default()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[ErrorDetail])> {
		self.errors
			.iter()
			.map(|(field, details)| (field.as_str(), details.as_slice()))
	}

	/// JSON rendering, as sent in an API response body
	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
	}
}

impl Serialize for SerializerErrors {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.errors.len()))?;
		for (field, details) in &self.errors {
			let messages: Vec<&str> = details.iter().map(|d| d.message.as_str()).collect();
			map.serialize_entry(field, &messages)?;
		}
		map.end()
	}
}

impl std::fmt::Display for SerializerErrors {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.to_json())
	}
}

/// Convert a model-level [`ValidationError`] into serializer errors
///
/// Errors stored under [`NON_FIELD_ERRORS`] are moved to `non_field_key`.
///
/// # Examples
///
/// ```
/// use reinhardt_fullclean_orm::ValidationError;
/// use reinhardt_fullclean_serializers::as_serializer_error;
/// use serde_json::json;
///
/// let mut err = ValidationError::field("name", "Taken.", "unique");
/// err.merge(ValidationError::non_field("Dates overlap.", "invalid"));
///
/// let errors = as_serializer_error(&err, "non_field_errors");
/// assert_eq!(
///     errors.to_json(),
///     json!({"name": ["Taken."], "non_field_errors": ["Dates overlap."]})
/// );
/// ```
pub fn as_serializer_error(err: &ValidationError, non_field_key: &str) -> SerializerErrors {
	let mut errors = SerializerErrors::new();
	for (field, details) in err.error_dict() {
		let key = if field == NON_FIELD_ERRORS {
			non_field_key
		} else {
			field.as_str()
		};
		errors.extend(key, details.clone());
	}
	errors
}

/// Error type for serializer operations
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum SerializerError {
	/// Input failed validation; carries the field-keyed details
	#[error("Invalid input: {0}")]
	Validation(SerializerErrors),

	/// The serializer was used in a way the integrating code must fix
	#[error("Improperly configured: {0}")]
	Configuration(String),

	/// This validation path cannot run for the serializer
	#[error("Unsupported validation: {0}")]
	Unsupported(String),

	#[error("You must call `.is_valid()` before accessing `.validated_data`.")]
	NotValidated,

	/// Failure reported by the model layer outside of validation
	#[error(transparent)]
	Orm(#[from] reinhardt_fullclean_orm::Error),
}

impl SerializerError {
	/// Create a configuration error
	pub fn configuration(message: impl Into<String>) -> Self {
		Self::Configuration(message.into())
	}

	/// Check if this is a validation error
	pub fn is_validation_error(&self) -> bool {
		matches!(self, SerializerError::Validation(_))
	}

	/// Check if this error signals misuse rather than bad input
	pub fn is_configuration_error(&self) -> bool {
		matches!(self, SerializerError::Configuration(_))
	}

	/// Get the field errors if this is a validation error
	pub fn as_validation_errors(&self) -> Option<&SerializerErrors> {
		match self {
			SerializerError::Validation(errors) => Some(errors),
			_ => None,
		}
	}
}

pub type SerializerResult<T> = Result<T, SerializerError>;
