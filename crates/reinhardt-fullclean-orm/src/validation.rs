//! Model-level validation errors
//!
//! Mirrors Django's `ValidationError` in its dictionary form: messages are
//! grouped by field name, and errors that do not belong to a single field are
//! stored under [`NON_FIELD_ERRORS`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key for errors raised by `Model::clean()` or `unique_together` checks.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// A single validation message with its machine-readable code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
	pub message: String,
	pub code: String,
}

impl ErrorDetail {
	/// Create a new error detail
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::ErrorDetail;
	///
	/// let detail = ErrorDetail::new("This field cannot be blank.", "blank");
	/// assert_eq!(detail.code, "blank");
	/// ```
	pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			code: code.into(),
		}
	}

	/// Create an error detail with the generic `invalid` code
	pub fn invalid(message: impl Into<String>) -> Self {
		Self::new(message, "invalid")
	}
}

impl std::fmt::Display for ErrorDetail {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.message)
	}
}

/// Validation errors collected during `full_clean`, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationError {
	errors: IndexMap<String, Vec<ErrorDetail>>,
}

impl ValidationError {
	/// Create an empty error container
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an error attached to a single field
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::ValidationError;
	///
	/// let err = ValidationError::field("email", "Enter a valid email address.", "invalid");
	/// assert_eq!(err.messages_for("email"), vec!["Enter a valid email address."]);
	/// ```
	pub fn field(
		field: impl Into<String>,
		message: impl Into<String>,
		code: impl Into<String>,
	) -> Self {
		let mut err = Self::new();
		err.add(field, ErrorDetail::new(message, code));
		err
	}

	/// Create an error that is not tied to a field
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::{NON_FIELD_ERRORS, ValidationError};
	///
	/// let err = ValidationError::non_field("End date must follow start date.", "invalid");
	/// assert!(err.fields().any(|f| f == NON_FIELD_ERRORS));
	/// ```
	pub fn non_field(message: impl Into<String>, code: impl Into<String>) -> Self {
		Self::field(NON_FIELD_ERRORS, message, code)
	}

	/// Build an error from a field → details mapping
	pub fn from_dict(errors: IndexMap<String, Vec<ErrorDetail>>) -> Self {
		let errors = errors
			.into_iter()
			.filter(|(_, details)| !details.is_empty())
			.collect();
		Self { errors }
	}

	/// Append a detail under `field`
	pub fn add(&mut self, field: impl Into<String>, detail: ErrorDetail) {
		self.errors.entry(field.into()).or_default().push(detail);
	}

	/// Merge another error into this one, keeping field order of first appearance
	pub fn merge(&mut self, other: ValidationError) {
		for (field, details) in other.errors {
			self.errors.entry(field).or_default().extend(details);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// The underlying field → details mapping
	pub fn error_dict(&self) -> &IndexMap<String, Vec<ErrorDetail>> {
		&self.errors
	}

	/// Field names that carry at least one error
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.errors.keys().map(String::as_str)
	}

	pub fn has_field(&self, field: &str) -> bool {
		self.errors.contains_key(field)
	}

	/// Messages recorded for `field`
	pub fn messages_for(&self, field: &str) -> Vec<&str> {
		self.errors
			.get(field)
			.map(|details| details.iter().map(|d| d.message.as_str()).collect())
			.unwrap_or_default()
	}

	/// All messages, flattened in insertion order
	pub fn messages(&self) -> Vec<&str> {
		self.errors
			.values()
			.flatten()
			.map(|d| d.message.as_str())
			.collect()
	}

	pub fn into_dict(self) -> IndexMap<String, Vec<ErrorDetail>> {
		self.errors
	}
}

impl std::fmt::Display for ValidationError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let parts: Vec<String> = self
			.errors
			.iter()
			.map(|(field, details)| {
				let messages: Vec<&str> = details.iter().map(|d| d.message.as_str()).collect();
				format!("{}: [{}]", field, messages.join(", "))
			})
			.collect();
		write!(f, "{{{}}}", parts.join(", "))
	}
}

impl std::error::Error for ValidationError {}
