//! Serializer field descriptors
//!
//! A [`SerializerField`] describes how one input key is checked and where the
//! cleaned value lands in `validated_data`. Type and format checks happen in
//! [`SerializerField::to_internal_value`]; business rules are left to the
//! model's `full_clean`.

use reinhardt_fullclean_orm::{
	DataType, EmailValidator, ErrorDetail, FieldKind, FieldMeta, FieldValidator,
};
use serde_json::Value;

/// Input type accepted by a serializer field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
	Char {
		max_length: Option<usize>,
		allow_blank: bool,
	},
	Email {
		allow_blank: bool,
	},
	Integer {
		min_value: Option<i64>,
		max_value: Option<i64>,
	},
	Float,
	Boolean,
	/// Any JSON value
	Json,
	/// A single related object, given as its key or as an object
	PrimaryKeyRelated,
	/// A list of related keys
	ManyRelated,
	/// A nested serializer; its payload is validated on its own
	Nested,
}

/// Describes one serializer field
#[derive(Debug, Clone, PartialEq)]
pub struct SerializerField {
	pub name: String,
	pub source: Option<String>,
	pub field_type: FieldType,
	pub read_only: bool,
	pub write_only: bool,
	pub required: bool,
	pub allow_null: bool,
	pub default: Option<Value>,
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "str",
		Value::Array(_) => "list",
		Value::Object(_) => "dict",
	}
}

impl SerializerField {
	fn with_type(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			source: None,
			field_type,
			read_only: false,
			write_only: false,
			required: true,
			allow_null: false,
			default: None,
		}
	}

	/// Create a required text field
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_serializers::SerializerField;
	/// use serde_json::json;
	///
	/// let field = SerializerField::char("title").max_length(5);
	/// assert_eq!(field.to_internal_value(&json!("  hi ")).unwrap(), json!("hi"));
	/// assert!(field.to_internal_value(&json!("too long")).is_err());
	/// ```
	pub fn char(name: impl Into<String>) -> Self {
		Self::with_type(
			name,
			FieldType::Char {
				max_length: None,
				allow_blank: false,
			},
		)
	}

	pub fn email(name: impl Into<String>) -> Self {
		Self::with_type(name, FieldType::Email { allow_blank: false })
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::with_type(
			name,
			FieldType::Integer {
				min_value: None,
				max_value: None,
			},
		)
	}

	pub fn float(name: impl Into<String>) -> Self {
		Self::with_type(name, FieldType::Float)
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::with_type(name, FieldType::Boolean)
	}

	pub fn json(name: impl Into<String>) -> Self {
		Self::with_type(name, FieldType::Json)
	}

	pub fn primary_key_related(name: impl Into<String>) -> Self {
		Self::with_type(name, FieldType::PrimaryKeyRelated)
	}

	pub fn many_related(name: impl Into<String>) -> Self {
		Self::with_type(name, FieldType::ManyRelated)
	}

	/// A nested serializer field
	pub fn nested(name: impl Into<String>) -> Self {
		Self::with_type(name, FieldType::Nested)
	}

	/// Build the default serializer field for a model field
	///
	/// Follows the ModelSerializer mapping: non-editable fields are read-only,
	/// fields with a default or that accept blank/null are optional, and
	/// relations map to key-based fields. Reverse relations have no
	/// serializer field.
	pub fn from_model_field(field: &FieldMeta) -> Option<Self> {
		let field_type = match &field.kind {
			FieldKind::ManyToManyRel { .. } => return None,
			FieldKind::ForeignKey { .. } | FieldKind::OneToOne { .. } => {
				FieldType::PrimaryKeyRelated
			}
			FieldKind::ManyToMany { .. } => FieldType::ManyRelated,
			FieldKind::Concrete => match field.data_type {
				DataType::Text => FieldType::Char {
					max_length: field.max_length,
					allow_blank: field.blank,
				},
				DataType::Email => FieldType::Email {
					allow_blank: field.blank,
				},
				DataType::Integer => FieldType::Integer {
					min_value: None,
					max_value: None,
				},
				DataType::Float => FieldType::Float,
				DataType::Boolean => FieldType::Boolean,
				DataType::Any => FieldType::Json,
			},
		};

		let mut serializer_field = Self::with_type(field.name.clone(), field_type);
		if !field.editable {
			serializer_field.read_only = true;
			serializer_field.required = false;
		}
		if field.has_default || field.blank || field.null {
			serializer_field.required = false;
		}
		serializer_field.allow_null = field.null;
		Some(serializer_field)
	}

	/// Model attribute this field writes to
	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	pub fn read_only(mut self) -> Self {
		self.read_only = true;
		self.required = false;
		self
	}

	pub fn write_only(mut self) -> Self {
		self.write_only = true;
		self
	}

	pub fn required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}

	pub fn allow_null(mut self) -> Self {
		self.allow_null = true;
		self
	}

	pub fn allow_blank(mut self) -> Self {
		match &mut self.field_type {
			FieldType::Char { allow_blank, .. } | FieldType::Email { allow_blank } => {
				*allow_blank = true
			}
			_ => {}
		}
		self
	}

	pub fn max_length(mut self, max: usize) -> Self {
		if let FieldType::Char { max_length, .. } = &mut self.field_type {
			*max_length = Some(max);
		}
		self
	}

	pub fn min_value(mut self, min: i64) -> Self {
		if let FieldType::Integer { min_value, .. } = &mut self.field_type {
			*min_value = Some(min);
		}
		self
	}

	pub fn max_value(mut self, max: i64) -> Self {
		if let FieldType::Integer { max_value, .. } = &mut self.field_type {
			*max_value = Some(max);
		}
		self
	}

	/// Value used when the key is missing; makes the field optional
	pub fn default(mut self, value: Value) -> Self {
		self.default = Some(value);
		self.required = false;
		self
	}

	/// Key under which the value is stored in `validated_data`
	pub fn source_name(&self) -> &str {
		self.source.as_deref().unwrap_or(&self.name)
	}

	pub fn is_nested(&self) -> bool {
		matches!(self.field_type, FieldType::Nested)
	}

	/// Check and normalize a single input value
	pub fn to_internal_value(&self, value: &Value) -> Result<Value, Vec<ErrorDetail>> {
		if value.is_null() {
			return if self.allow_null {
				Ok(Value::Null)
			} else {
				Err(vec![ErrorDetail::new("This field may not be null.", "null")])
			};
		}

		match &self.field_type {
			FieldType::Char {
				max_length,
				allow_blank,
			} => {
				let text = coerce_text(value)?;
				check_blank(&text, *allow_blank)?;
				if let Some(max) = max_length
					&& text.chars().count() > *max
				{
					return Err(vec![ErrorDetail::new(
						format!("Ensure this field has no more than {} characters.", max),
						"max_length",
					)]);
				}
				Ok(Value::String(text))
			}
			FieldType::Email { allow_blank } => {
				let text = coerce_text(value)?;
				check_blank(&text, *allow_blank)?;
				if text.is_empty() {
					return Ok(Value::String(text));
				}
				let text = Value::String(text);
				EmailValidator::new()
					.validate(&text)
					.map_err(|detail| vec![detail])?;
				Ok(text)
			}
			FieldType::Integer {
				min_value,
				max_value,
			} => {
				let number = match value {
					Value::Number(n) => n
						.as_i64()
						.or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
					Value::String(s) => s.trim().parse::<i64>().ok(),
					_ => None,
				}
				.ok_or_else(|| vec![ErrorDetail::invalid("A valid integer is required.")])?;
				if let Some(min) = min_value
					&& number < *min
				{
					return Err(vec![ErrorDetail::new(
						format!("Ensure this value is greater than or equal to {}.", min),
						"min_value",
					)]);
				}
				if let Some(max) = max_value
					&& number > *max
				{
					return Err(vec![ErrorDetail::new(
						format!("Ensure this value is less than or equal to {}.", max),
						"max_value",
					)]);
				}
				Ok(Value::from(number))
			}
			FieldType::Float => {
				let number = match value {
					Value::Number(n) => n.as_f64(),
					Value::String(s) => s.trim().parse::<f64>().ok(),
					_ => None,
				}
				.filter(|number| number.is_finite())
				.ok_or_else(|| vec![ErrorDetail::invalid("A valid number is required.")])?;
				Ok(Value::from(number))
			}
			FieldType::Boolean => match value {
				Value::Bool(b) => Ok(Value::Bool(*b)),
				Value::String(s) => match s.to_lowercase().as_str() {
					"true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
					"false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
					_ => Err(vec![ErrorDetail::invalid("Must be a valid boolean.")]),
				},
				Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
				Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
				_ => Err(vec![ErrorDetail::invalid("Must be a valid boolean.")]),
			},
			FieldType::Json => Ok(value.clone()),
			FieldType::PrimaryKeyRelated => match value {
				Value::Number(_) | Value::String(_) | Value::Object(_) => Ok(value.clone()),
				other => Err(vec![ErrorDetail::new(
					format!(
						"Incorrect type. Expected pk value, received {}.",
						json_type_name(other)
					),
					"incorrect_type",
				)]),
			},
			FieldType::ManyRelated => match value {
				Value::Array(items) => {
					let invalid = items
						.iter()
						.find(|item| !matches!(item, Value::Number(_) | Value::String(_)));
					match invalid {
						Some(item) => Err(vec![ErrorDetail::new(
							format!(
								"Incorrect type. Expected pk value, received {}.",
								json_type_name(item)
							),
							"incorrect_type",
						)]),
						None => Ok(value.clone()),
					}
				}
				other => Err(vec![ErrorDetail::new(
					format!(
						"Expected a list of items but got type \"{}\".",
						json_type_name(other)
					),
					"not_a_list",
				)]),
			},
			FieldType::Nested => match value {
				Value::Object(_) | Value::Array(_) => Ok(value.clone()),
				other => Err(vec![ErrorDetail::invalid(format!(
					"Invalid data. Expected a dictionary, but got {}.",
					json_type_name(other)
				))]),
			},
		}
	}
}

fn coerce_text(value: &Value) -> Result<String, Vec<ErrorDetail>> {
	match value {
		Value::String(s) => Ok(s.trim().to_string()),
		Value::Number(n) => Ok(n.to_string()),
		Value::Bool(_) | Value::Array(_) | Value::Object(_) | Value::Null => {
			Err(vec![ErrorDetail::invalid("Not a valid string.")])
		}
	}
}

fn check_blank(text: &str, allow_blank: bool) -> Result<(), Vec<ErrorDetail>> {
	if text.is_empty() && !allow_blank {
		return Err(vec![ErrorDetail::new(
			"This field may not be blank.",
			"blank",
		)]);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_null_rejected_unless_allowed() {
		let field = SerializerField::char("name");
		assert_eq!(field.to_internal_value(&json!(null)).unwrap_err()[0].code, "null");
		let field = SerializerField::char("name").allow_null();
		assert_eq!(field.to_internal_value(&json!(null)).unwrap(), json!(null));
	}

	#[rstest]
	#[case(json!(""), "blank")]
	#[case(json!([1]), "invalid")]
	#[case(json!("abcdef"), "max_length")]
	fn test_char_errors(#[case] value: Value, #[case] code: &str) {
		let field = SerializerField::char("name").max_length(5);
		assert_eq!(field.to_internal_value(&value).unwrap_err()[0].code, code);
	}

	#[rstest]
	fn test_char_accepts_numbers() {
		let field = SerializerField::char("code");
		assert_eq!(field.to_internal_value(&json!(42)).unwrap(), json!("42"));
	}

	#[rstest]
	fn test_email() {
		let field = SerializerField::email("email");
		assert_eq!(
			field.to_internal_value(&json!(" x@example.com ")).unwrap(),
			json!("x@example.com")
		);
		let errors = field.to_internal_value(&json!("nope")).unwrap_err();
		assert_eq!(errors[0].message, "Enter a valid email address.");
	}

	#[rstest]
	#[case(json!(7), Ok(json!(7)))]
	#[case(json!("8"), Ok(json!(8)))]
	#[case(json!("x"), Err("invalid"))]
	#[case(json!(100), Err("max_value"))]
	#[case(json!(-1), Err("min_value"))]
	#[case(json!(3.0), Ok(json!(3)))]
	#[case(json!(3.5), Err("invalid"))]
	fn test_integer(#[case] value: Value, #[case] expected: Result<Value, &str>) {
		let field = SerializerField::integer("n").min_value(0).max_value(10);
		let result = field.to_internal_value(&value);
		match expected {
			Ok(v) => assert_eq!(result.unwrap(), v),
			Err(code) => assert_eq!(result.unwrap_err()[0].code, code),
		}
	}

	#[rstest]
	#[case(json!(1.5), json!(1.5))]
	#[case(json!("2.25"), json!(2.25))]
	#[case(json!(4), json!(4.0))]
	fn test_float(#[case] value: Value, #[case] expected: Value) {
		let field = SerializerField::float("ratio");
		assert_eq!(field.to_internal_value(&value).unwrap(), expected);
	}

	#[rstest]
	#[case("NaN")]
	#[case("inf")]
	#[case("-inf")]
	fn test_float_rejects_non_finite(#[case] raw: &str) {
		let field = SerializerField::float("ratio");
		let errors = field.to_internal_value(&json!(raw)).unwrap_err();
		assert_eq!(errors[0].code, "invalid");
		assert_eq!(errors[0].message, "A valid number is required.");
	}

	#[rstest]
	#[case(json!("true"), json!(true))]
	#[case(json!(0), json!(false))]
	#[case(json!(false), json!(false))]
	fn test_boolean(#[case] value: Value, #[case] expected: Value) {
		let field = SerializerField::boolean("flag");
		assert_eq!(field.to_internal_value(&value).unwrap(), expected);
	}

	#[rstest]
	fn test_primary_key_related() {
		let field = SerializerField::primary_key_related("author");
		assert_eq!(field.to_internal_value(&json!(3)).unwrap(), json!(3));
		let errors = field.to_internal_value(&json!(true)).unwrap_err();
		assert_eq!(
			errors[0].message,
			"Incorrect type. Expected pk value, received bool."
		);
	}

	#[rstest]
	fn test_many_related() {
		let field = SerializerField::many_related("tags");
		assert_eq!(field.to_internal_value(&json!([1, 2])).unwrap(), json!([1, 2]));
		assert_eq!(
			field.to_internal_value(&json!(1)).unwrap_err()[0].code,
			"not_a_list"
		);
		assert_eq!(
			field.to_internal_value(&json!([[1]])).unwrap_err()[0].code,
			"incorrect_type"
		);
	}

	#[rstest]
	fn test_from_model_field_mapping() {
		let pk = SerializerField::from_model_field(&FieldMeta::auto_pk("id")).unwrap();
		assert!(pk.read_only);
		assert!(!pk.required);

		let title = SerializerField::from_model_field(&FieldMeta::char("title", 10)).unwrap();
		assert!(title.required);
		assert_eq!(
			title.field_type,
			FieldType::Char {
				max_length: Some(10),
				allow_blank: false
			}
		);

		let bio = SerializerField::from_model_field(&FieldMeta::text("bio").blank()).unwrap();
		assert!(!bio.required);

		let author = SerializerField::from_model_field(&FieldMeta::foreign_key("author", "User").null())
			.unwrap();
		assert_eq!(author.field_type, FieldType::PrimaryKeyRelated);
		assert!(author.allow_null);
		assert!(!author.required);

		let readers = FieldMeta::many_to_many_rel("readers", "Reader");
		assert!(SerializerField::from_model_field(&readers).is_none());
	}

	#[rstest]
	fn test_source_name_defaults_to_name() {
		assert_eq!(SerializerField::char("title").source_name(), "title");
		assert_eq!(
			SerializerField::char("headline").source("title").source_name(),
			"title"
		);
	}
}
