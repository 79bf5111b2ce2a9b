//! Field validators similar to Django's validators
//!
//! Validators attached to a [`FieldMeta`](crate::FieldMeta) run during
//! `clean_fields`. They are skipped for empty values; null and blank handling
//! belongs to the field itself.

use crate::validation::ErrorDetail;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Base trait for field validators
pub trait FieldValidator: Send + Sync + fmt::Debug {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail>;
}

fn char_count(value: &Value) -> Option<usize> {
	value.as_str().map(|s| s.chars().count())
}

/// Max length validator
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
	pub max_length: usize,
	pub message: Option<String>,
}

impl MaxLengthValidator {
	/// Create a new max length validator
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::validators::{FieldValidator, MaxLengthValidator};
	/// use serde_json::json;
	///
	/// let validator = MaxLengthValidator::new(5);
	/// assert!(validator.validate(&json!("hello")).is_ok());
	/// assert!(validator.validate(&json!("hello world")).is_err());
	/// ```
	pub fn new(max_length: usize) -> Self {
		Self {
			max_length,
			message: None,
		}
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl FieldValidator for MaxLengthValidator {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail> {
		match char_count(value) {
			Some(len) if len > self.max_length => {
				let message = self.message.clone().unwrap_or_else(|| {
					format!(
						"Ensure this value has at most {} characters (it has {}).",
						self.max_length, len
					)
				});
				Err(ErrorDetail::new(message, "max_length"))
			}
			_ => Ok(()),
		}
	}
}

/// Min length validator
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
	pub min_length: usize,
	pub message: Option<String>,
}

impl MinLengthValidator {
	pub fn new(min_length: usize) -> Self {
		Self {
			min_length,
			message: None,
		}
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl FieldValidator for MinLengthValidator {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail> {
		match char_count(value) {
			Some(len) if len < self.min_length => {
				let message = self.message.clone().unwrap_or_else(|| {
					format!(
						"Ensure this value has at least {} characters (it has {}).",
						self.min_length, len
					)
				});
				Err(ErrorDetail::new(message, "min_length"))
			}
			_ => Ok(()),
		}
	}
}

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
		.expect("Invalid email regex pattern")
});

/// Email address validator
#[derive(Debug, Clone)]
pub struct EmailValidator {
	pub message: String,
}

impl EmailValidator {
	/// Create a new email validator
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::validators::{EmailValidator, FieldValidator};
	/// use serde_json::json;
	///
	/// let validator = EmailValidator::new();
	/// assert!(validator.validate(&json!("user@example.com")).is_ok());
	/// assert!(validator.validate(&json!("invalid-email")).is_err());
	/// ```
	pub fn new() -> Self {
		Self {
			message: "Enter a valid email address.".to_string(),
		}
	}

	pub fn with_message(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

impl Default for EmailValidator {
	fn default() -> Self {
		Self::new()
	}
}

impl FieldValidator for EmailValidator {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail> {
		let valid = value
			.as_str()
			.map(|s| s.len() <= 254 && EMAIL_REGEX.is_match(s))
			.unwrap_or(false);
		if valid {
			Ok(())
		} else {
			Err(ErrorDetail::invalid(self.message.clone()))
		}
	}
}

/// Regex validator
#[derive(Debug, Clone)]
pub struct RegexValidator {
	regex: Regex,
	message: String,
	code: String,
}

impl RegexValidator {
	/// Try to create a new RegexValidator, returning an error if the pattern is invalid
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::validators::{FieldValidator, RegexValidator};
	/// use serde_json::json;
	///
	/// let validator = RegexValidator::try_new(r"^[a-z0-9-]+$").unwrap();
	/// assert!(validator.validate(&json!("my-slug")).is_ok());
	/// assert!(validator.validate(&json!("Not A Slug")).is_err());
	/// assert!(RegexValidator::try_new(r"[invalid(regex").is_err());
	/// ```
	pub fn try_new(pattern: &str) -> Result<Self, regex::Error> {
		Ok(Self {
			regex: Regex::new(pattern)?,
			message: "Enter a valid value.".to_string(),
			code: "invalid".to_string(),
		})
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = message.into();
		self
	}

	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = code.into();
		self
	}

	pub fn pattern(&self) -> &str {
		self.regex.as_str()
	}
}

impl FieldValidator for RegexValidator {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail> {
		let text = match value {
			Value::String(s) => s.clone(),
			other => other.to_string(),
		};
		if self.regex.is_match(&text) {
			Ok(())
		} else {
			Err(ErrorDetail::new(self.message.clone(), self.code.clone()))
		}
	}
}

/// Lower bound for numeric values
#[derive(Debug, Clone)]
pub struct MinValueValidator {
	pub min: f64,
	pub message: Option<String>,
}

impl MinValueValidator {
	pub fn new(min: impl Into<f64>) -> Self {
		Self {
			min: min.into(),
			message: None,
		}
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl FieldValidator for MinValueValidator {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail> {
		if let Some(n) = value.as_f64()
			&& n < self.min
		{
			let message = self.message.clone().unwrap_or_else(|| {
				format!(
					"Ensure this value is greater than or equal to {}.",
					self.min
				)
			});
			return Err(ErrorDetail::new(message, "min_value"));
		}
		Ok(())
	}
}

/// Upper bound for numeric values
#[derive(Debug, Clone)]
pub struct MaxValueValidator {
	pub max: f64,
	pub message: Option<String>,
}

impl MaxValueValidator {
	pub fn new(max: impl Into<f64>) -> Self {
		Self {
			max: max.into(),
			message: None,
		}
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}
}

impl FieldValidator for MaxValueValidator {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail> {
		if let Some(n) = value.as_f64()
			&& n > self.max
		{
			let message = self.message.clone().unwrap_or_else(|| {
				format!("Ensure this value is less than or equal to {}.", self.max)
			});
			return Err(ErrorDetail::new(message, "max_value"));
		}
		Ok(())
	}
}

type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), ErrorDetail> + Send + Sync>;

/// Validator backed by a closure, for one-off business rules
///
/// # Examples
///
/// ```
/// use reinhardt_fullclean_orm::validators::{FieldValidator, FnValidator};
/// use reinhardt_fullclean_orm::ErrorDetail;
/// use serde_json::json;
///
/// let even = FnValidator::new("even", |value| match value.as_i64() {
///     Some(n) if n % 2 != 0 => Err(ErrorDetail::invalid("Must be even.")),
///     _ => Ok(()),
/// });
/// assert!(even.validate(&json!(4)).is_ok());
/// assert!(even.validate(&json!(3)).is_err());
/// ```
#[derive(Clone)]
pub struct FnValidator {
	name: String,
	func: ValidateFn,
}

impl FnValidator {
	pub fn new<F>(name: impl Into<String>, func: F) -> Self
	where
		F: Fn(&Value) -> Result<(), ErrorDetail> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			func: Arc::new(func),
		}
	}
}

impl fmt::Debug for FnValidator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnValidator")
			.field("name", &self.name)
			.finish()
	}
}

impl FieldValidator for FnValidator {
	fn validate(&self, value: &Value) -> Result<(), ErrorDetail> {
		(self.func)(value)
	}
}
