//! ModelSerializer
//!
//! Generates serializer fields from a model's schema and runs field-level
//! validation over incoming data. Model-level rules are not run here; see
//! [`FullCleanModelSerializer`](crate::FullCleanModelSerializer).

use crate::fields::{SerializerField, json_type_name};
use crate::serializer::{SerializerError, SerializerErrors, SerializerResult};
use reinhardt_fullclean_orm::{ErrorDetail, Model};
use serde_json::{Map, Value};

/// Field-level serializer bound to model type `M`
///
/// # Examples
///
/// ```
/// use once_cell::sync::Lazy;
/// use reinhardt_fullclean_orm::{Error, FieldMeta, Model, ModelMeta};
/// use reinhardt_fullclean_serializers::ModelSerializer;
/// use serde_json::{json, Value};
///
/// static NOTE_META: Lazy<ModelMeta> = Lazy::new(|| {
///     ModelMeta::new("Note", "notes")
///         .field(FieldMeta::auto_pk("id"))
///         .field(FieldMeta::char("body", 50))
/// });
///
/// #[derive(Debug, Clone, Default)]
/// struct Note {
///     id: Option<i64>,
///     body: String,
/// }
///
/// impl Model for Note {
///     fn meta() -> &'static ModelMeta {
///         &NOTE_META
///     }
///     fn blank() -> Self {
///         Self::default()
///     }
///     fn value_of(&self, field: &str) -> Option<Value> {
///         match field {
///             "id" => Some(json!(self.id)),
///             "body" => Some(json!(self.body)),
///             _ => None,
///         }
///     }
///     fn set_value(&mut self, field: &str, value: Value) -> Result<(), Error> {
///         match field {
///             "id" => self.id = value.as_i64(),
///             "body" => self.body = value.as_str().unwrap_or_default().to_string(),
///             _ => return Err(Self::unknown_field(field)),
///         }
///         Ok(())
///     }
/// }
///
/// let mut serializer = ModelSerializer::<Note>::new().data(json!({"body": "hello", "id": 9}));
/// assert!(serializer.is_valid(false).unwrap());
/// // `id` is read-only and dropped
/// assert_eq!(Value::Object(serializer.validated_data().unwrap().clone()), json!({"body": "hello"}));
/// ```
#[derive(Debug, Clone)]
pub struct ModelSerializer<M: Model> {
	fields: Vec<SerializerField>,
	instance: Option<M>,
	data: Option<Value>,
	partial: bool,
	nested: bool,
	non_field_errors_key: String,
	validated_data: Option<Map<String, Value>>,
	errors: SerializerErrors,
}

impl<M: Model> Default for ModelSerializer<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M: Model> ModelSerializer<M> {
	/// Create a serializer with fields generated from `M::meta()`
	pub fn new() -> Self {
		let fields = M::meta()
			.all_fields()
			.iter()
			.filter_map(SerializerField::from_model_field)
			.collect();
		Self {
			fields,
			instance: None,
			data: None,
			partial: false,
			nested: false,
			non_field_errors_key: "non_field_errors".to_string(),
			validated_data: None,
			errors: SerializerErrors::new(),
		}
	}

	/// Existing instance being updated
	pub fn instance(mut self, instance: M) -> Self {
		self.instance = Some(instance);
		self
	}

	/// Incoming data
	pub fn data(mut self, data: Value) -> Self {
		self.data = Some(data);
		self
	}

	/// Partial update: fields missing from the data are not required
	pub fn partial(mut self, partial: bool) -> Self {
		self.partial = partial;
		self
	}

	/// Mark the serializer as nested inside a parent serializer
	pub fn as_nested(mut self) -> Self {
		self.nested = true;
		self
	}

	/// Add a field, replacing a generated one of the same name
	pub fn with_field(mut self, field: SerializerField) -> Self {
		match self.fields.iter_mut().find(|f| f.name == field.name) {
			Some(existing) => *existing = field,
			None => self.fields.push(field),
		}
		self
	}

	pub fn read_only_fields(mut self, names: &[&str]) -> Self {
		for field in self
			.fields
			.iter_mut()
			.filter(|f| names.contains(&f.name.as_str()))
		{
			field.read_only = true;
			field.required = false;
		}
		self
	}

	/// Keep only the named fields
	pub fn only_fields(mut self, names: &[&str]) -> Self {
		self.fields.retain(|f| names.contains(&f.name.as_str()));
		self
	}

	pub fn non_field_errors_key(mut self, key: impl Into<String>) -> Self {
		self.non_field_errors_key = key.into();
		self
	}

	pub fn fields(&self) -> &[SerializerField] {
		&self.fields
	}

	pub fn field(&self, name: &str) -> Option<&SerializerField> {
		self.fields.iter().find(|f| f.name == name)
	}

	pub fn get_instance(&self) -> Option<&M> {
		self.instance.as_ref()
	}

	pub fn get_data(&self) -> Option<&Value> {
		self.data.as_ref()
	}

	pub fn is_partial(&self) -> bool {
		self.partial
	}

	pub fn is_nested(&self) -> bool {
		self.nested
	}

	pub fn get_non_field_errors_key(&self) -> &str {
		&self.non_field_errors_key
	}

	pub(crate) fn set_non_field_errors_key(&mut self, key: &str) {
		self.non_field_errors_key = key.to_string();
	}

	/// Whether `is_valid` has run
	pub fn is_validated(&self) -> bool {
		self.validated_data.is_some()
	}

	/// Run field-level validation
	///
	/// The outcome is cached; later calls return it without re-validating.
	/// With `raise_exception`, invalid data is returned as
	/// [`SerializerError::Validation`].
	pub fn is_valid(&mut self, raise_exception: bool) -> SerializerResult<bool> {
		if self.validated_data.is_none() {
			let data = self.data.as_ref().ok_or_else(|| {
				SerializerError::configuration(
					"Cannot call `.is_valid()` as no `data=` keyword argument was passed when instantiating the serializer instance.",
				)
			})?;
			let (validated, errors) = self.run_validation(data);
			self.validated_data = Some(validated);
			self.errors = errors;
		}

		if !self.errors.is_empty() {
			tracing::debug!(
				model = M::meta().name(),
				fields = ?self.errors.fields().collect::<Vec<_>>(),
				"serializer validation failed"
			);
			if raise_exception {
				return Err(SerializerError::Validation(self.errors.clone()));
			}
			return Ok(false);
		}
		Ok(true)
	}

	fn run_validation(&self, data: &Value) -> (Map<String, Value>, SerializerErrors) {
		let mut validated = Map::new();
		let mut errors = SerializerErrors::new();

		let Some(data) = data.as_object() else {
			errors.add(
				self.non_field_errors_key.clone(),
				ErrorDetail::invalid(format!(
					"Invalid data. Expected a dictionary, but got {}.",
					json_type_name(data)
				)),
			);
			return (validated, errors);
		};

		for field in self.fields.iter().filter(|f| !f.read_only) {
			match data.get(&field.name) {
				Some(value) => match field.to_internal_value(value) {
					Ok(value) => {
						validated.insert(field.source_name().to_string(), value);
					}
					Err(details) => errors.extend(field.name.clone(), details),
				},
				None if self.partial => {}
				None => {
					if let Some(default) = &field.default {
						validated.insert(field.source_name().to_string(), default.clone());
					} else if field.required {
						errors.add(
							field.name.clone(),
							ErrorDetail::new("This field is required.", "required"),
						);
					}
				}
			}
		}

		if !errors.is_empty() {
			validated.clear();
		}
		(validated, errors)
	}

	/// Validated data keyed by model attribute
	pub fn validated_data(&self) -> SerializerResult<&Map<String, Value>> {
		self.validated_data
			.as_ref()
			.ok_or(SerializerError::NotValidated)
	}

	/// Field-level errors from the last `is_valid`
	pub fn errors(&self) -> &SerializerErrors {
		&self.errors
	}
}
