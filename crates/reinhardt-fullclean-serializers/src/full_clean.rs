//! Model validation for model serializers
//!
//! [`FullCleanModelSerializer`] runs the model's `full_clean` after the
//! serializer's own field checks pass. It builds an unsaved candidate
//! instance from the validated data (a copy of the existing instance when
//! updating), works out which fields the model pass must skip, and reports
//! model errors in the serializer's error shape.
//!
//! ```text
//! is_valid
//!   ├─ ModelSerializer::is_valid        field-level checks
//!   └─ is_valid_model
//!        ├─ model_instance              candidate from validated data
//!        │    └─ apply_extra_include    out-of-band values
//!        ├─ exclusions                  fields the model pass skips
//!        └─ run_model_validation        Model::full_clean
//! ```

use crate::model_serializer::ModelSerializer;
use crate::serializer::{SerializerError, SerializerErrors, SerializerResult, as_serializer_error};
use crate::settings::FullCleanSettings;
use reinhardt_fullclean_orm::{Error as OrmError, FieldMeta, Model, UniqueLookup};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-call options for model validation
#[derive(Debug, Clone, PartialEq)]
pub struct FullCleanOptions {
	/// Extra field names the model pass skips
	pub exclude: Vec<String>,
	/// Run uniqueness checks
	pub validate_unique: bool,
	/// Field values applied to the candidate that are not part of the
	/// validated data; must be a JSON object
	pub extra_include: Option<Value>,
}

impl Default for FullCleanOptions {
	fn default() -> Self {
		Self {
			exclude: Vec::new(),
			validate_unique: true,
			extra_include: None,
		}
	}
}

impl FullCleanOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Options whose defaults come from `settings`
	pub fn from_settings(settings: &FullCleanSettings) -> Self {
		Self {
			validate_unique: settings.validate_unique,
			..Self::default()
		}
	}

	pub fn exclude<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exclude.extend(fields.into_iter().map(Into::into));
		self
	}

	pub fn validate_unique(mut self, validate_unique: bool) -> Self {
		self.validate_unique = validate_unique;
		self
	}

	pub fn extra_include(mut self, values: Value) -> Self {
		self.extra_include = Some(values);
		self
	}

	/// The extra values as a mapping
	///
	/// Anything other than a JSON object is a configuration error.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_serializers::FullCleanOptions;
	/// use serde_json::json;
	///
	/// let options = FullCleanOptions::new().extra_include(json!({"owner": 1}));
	/// assert!(options.extra_include_map().unwrap().is_some());
	///
	/// let options = FullCleanOptions::new().extra_include(json!(["owner"]));
	/// assert!(options.extra_include_map().unwrap_err().is_configuration_error());
	/// ```
	pub fn extra_include_map(&self) -> SerializerResult<Option<&Map<String, Value>>> {
		match &self.extra_include {
			None => Ok(None),
			Some(Value::Object(values)) => Ok(Some(values)),
			Some(other) => Err(SerializerError::configuration(format!(
				"Expected a mapping for `extra_include`, but got: {}",
				other
			))),
		}
	}
}

/// Model serializer that also runs the model's `full_clean`
///
/// The wrapped serializer's instance is never modified: validation works on
/// a copy.
pub struct FullCleanModelSerializer<M: Model> {
	inner: ModelSerializer<M>,
	lookup: Arc<dyn UniqueLookup>,
	settings: FullCleanSettings,
	instance_for_clean: Option<M>,
	candidate: Option<M>,
	model_errors: SerializerErrors,
}

impl<M: Model> FullCleanModelSerializer<M> {
	/// Wrap `serializer`; uniqueness checks query `lookup`
	pub fn new(serializer: ModelSerializer<M>, lookup: Arc<dyn UniqueLookup>) -> Self {
		Self::with_settings(serializer, lookup, FullCleanSettings::default())
	}

	pub fn with_settings(
		mut serializer: ModelSerializer<M>,
		lookup: Arc<dyn UniqueLookup>,
		settings: FullCleanSettings,
	) -> Self {
		serializer.set_non_field_errors_key(&settings.non_field_errors_key);
		Self {
			inner: serializer,
			lookup,
			settings,
			instance_for_clean: None,
			candidate: None,
			model_errors: SerializerErrors::new(),
		}
	}

	pub fn settings(&self) -> &FullCleanSettings {
		&self.settings
	}

	/// Options with this serializer's configured defaults
	pub fn default_options(&self) -> FullCleanOptions {
		FullCleanOptions::from_settings(&self.settings)
	}

	/// Run field-level validation, then model validation
	///
	/// Returns `Ok(false)` for invalid data; with `raise_exception` the
	/// errors come back as [`SerializerError::Validation`] instead. Misuse
	/// (a non-object `extra_include`, a relation that cannot be validated
	/// yet, a nested serializer) is always an `Err`.
	pub fn is_valid(
		&mut self,
		raise_exception: bool,
		options: &FullCleanOptions,
	) -> SerializerResult<bool> {
		debug!(model = M::meta().name(), "FullCleanModelSerializer is_valid");
		options.extra_include_map()?;

		if !self.inner.is_valid(raise_exception)? {
			return Ok(false);
		}
		self.is_valid_model(raise_exception, options)
	}

	/// Run model validation against the already validated data
	pub fn is_valid_model(
		&mut self,
		raise_exception: bool,
		options: &FullCleanOptions,
	) -> SerializerResult<bool> {
		let extra_include = options.extra_include_map()?;
		if self.inner.is_nested() {
			return Err(SerializerError::Unsupported(format!(
				"{} is nested; its parent serializer builds the instance to validate",
				M::meta().name()
			)));
		}

		self.instance_for_clean = None;
		self.candidate = None;
		self.model_errors = SerializerErrors::new();

		let validated = self.validated_data_for_clean()?;
		let instance = self.instance_for_clean().cloned();
		let candidate = self.model_instance(&validated, instance, extra_include)?;
		if self.settings.log_candidates {
			debug!(
				model = M::meta().name(),
				candidate = ?candidate.values(),
				"instance to full_clean"
			);
		}

		let exclude = self.exclusions(&candidate, options, extra_include)?;
		let errors = self.run_model_validation(&candidate, &exclude, options.validate_unique)?;
		self.candidate = Some(candidate);

		match errors {
			None => Ok(true),
			Some(errors) => {
				self.model_errors = errors.clone();
				if raise_exception {
					return Err(SerializerError::Validation(errors));
				}
				Ok(false)
			}
		}
	}

	/// Validated data without many-to-many values
	///
	/// Many-to-many rows can only be attached once the instance is saved.
	pub fn validated_data_for_clean(&self) -> SerializerResult<Map<String, Value>> {
		let mut validated = self.inner.validated_data()?.clone();
		for field in M::meta().many_to_many() {
			validated.remove(&field.name);
		}
		Ok(validated)
	}

	/// Copy of the instance being updated, made once per validation
	pub fn instance_for_clean(&mut self) -> Option<&M> {
		if self.instance_for_clean.is_none() {
			self.instance_for_clean = self.inner.get_instance().cloned();
		}
		self.instance_for_clean.as_ref()
	}

	/// Build the candidate: a new instance, or `instance` updated in place
	pub fn model_instance(
		&self,
		validated: &Map<String, Value>,
		instance: Option<M>,
		extra_include: Option<&Map<String, Value>>,
	) -> SerializerResult<M> {
		trace!(validated = ?validated, "model_instance");
		match instance {
			None => self.model_instance_create(validated, extra_include),
			Some(instance) => self.model_instance_update(validated, instance, extra_include),
		}
	}

	pub fn model_instance_create(
		&self,
		validated: &Map<String, Value>,
		extra_include: Option<&Map<String, Value>>,
	) -> SerializerResult<M> {
		let mut instance = M::from_values(validated).map_err(construction_error::<M>)?;
		self.apply_extra_include(&mut instance, extra_include)?;
		Ok(instance)
	}

	/// Overwrite the concrete fields present in `validated`
	pub fn model_instance_update(
		&self,
		validated: &Map<String, Value>,
		mut instance: M,
		extra_include: Option<&Map<String, Value>>,
	) -> SerializerResult<M> {
		for field in M::meta().fields() {
			if let Some(value) = validated.get(&field.name) {
				instance
					.set_value(&field.name, value.clone())
					.map_err(construction_error::<M>)?;
			}
		}
		self.apply_extra_include(&mut instance, extra_include)?;
		Ok(instance)
	}

	/// Assign out-of-band values; reverse many-to-many fields are skipped
	pub fn apply_extra_include(
		&self,
		instance: &mut M,
		extra_include: Option<&Map<String, Value>>,
	) -> SerializerResult<()> {
		let Some(extra_include) = extra_include else {
			return Ok(());
		};
		let meta = M::meta();
		for (name, value) in extra_include {
			let field = meta.get_field(name).map_err(construction_error::<M>)?;
			if field.is_reverse_many_to_many() {
				trace!(field = %name, "skipping reverse many-to-many");
				continue;
			}
			instance
				.set_value(name, value.clone())
				.map_err(construction_error::<M>)?;
		}
		Ok(())
	}

	/// Model fields the serializer does not write
	///
	/// Starts from every concrete and many-to-many field and keeps a field
	/// in the model pass only when the serializer writes it and it is either
	/// required or already present on `instance`. Nested serializer fields
	/// stay excluded.
	pub fn validation_exclusions(&self, instance: Option<&M>) -> Vec<String> {
		let mut exclusions = M::meta().validation_field_names();
		for field in self.inner.fields() {
			let name = field.source_name();
			let present = instance.is_some_and(|i| i.value_of(name).is_some());
			if !field.read_only && (field.required || present) && !field.is_nested() {
				exclusions.retain(|excluded| excluded != name);
			}
		}
		exclusions
	}

	/// Reject a relation with validators whose value has no identity yet
	pub fn ensure_includable(&self, field: &FieldMeta, value: &Value) -> SerializerResult<()> {
		if field.is_reverse_many_to_many() {
			return Ok(());
		}
		if field.is_relation()
			&& !field.validators.is_empty()
			&& field.related_identity(value).is_none()
		{
			return Err(SerializerError::configuration(format!(
				"Unsupported validation! Field {} is a relation with validators that need the \
				 database id of the related object, which it does not have yet. Move that logic \
				 into the model's clean() and check the object's fields instead of querying the \
				 database.",
				field.name
			)));
		}
		Ok(())
	}

	/// Whether an out-of-band value can take part in the model pass
	pub fn can_remove_from_exclusions(&self, field: &FieldMeta, value: &Value) -> bool {
		!field.is_relation() || field.related_identity(value).is_some()
	}

	/// Final set of fields `full_clean` skips
	pub fn exclusions(
		&mut self,
		candidate: &M,
		options: &FullCleanOptions,
		extra_include: Option<&Map<String, Value>>,
	) -> SerializerResult<BTreeSet<String>> {
		let instance = self.instance_for_clean().cloned();
		let mut exclude: BTreeSet<String> = self
			.validation_exclusions(instance.as_ref())
			.into_iter()
			.collect();
		debug!(exclude = ?exclude, "serializer fields excluded");
		debug!(exclude = ?options.exclude, "caller exclude");
		exclude.extend(options.exclude.iter().cloned());

		if let Some(extra_include) = extra_include {
			trace!(extra_include = ?extra_include, "extra include");
			let meta = M::meta();
			for (name, value) in extra_include {
				let Ok(field) = meta.get_field(name) else {
					continue;
				};
				self.ensure_includable(field, value)?;
				if self.can_remove_from_exclusions(field, value) {
					exclude.remove(name);
				} else {
					exclude.insert(name.clone());
				}
			}
		}

		debug!(
			model = M::meta().name(),
			pk = ?candidate.pk(),
			exclude = ?exclude,
			"full_clean exclude final"
		);
		Ok(exclude)
	}

	/// Call `full_clean`, converting model errors to serializer errors
	///
	/// `Ok(None)` when the candidate is valid. Failures other than
	/// validation errors are returned as `Err`.
	pub fn run_model_validation(
		&self,
		candidate: &M,
		exclude: &BTreeSet<String>,
		validate_unique: bool,
	) -> SerializerResult<Option<SerializerErrors>> {
		match candidate.full_clean(exclude, validate_unique, self.lookup.as_ref()) {
			Ok(()) => Ok(None),
			Err(OrmError::Validation(err)) => Ok(Some(as_serializer_error(
				&err,
				&self.settings.non_field_errors_key,
			))),
			Err(other) => Err(other.into()),
		}
	}

	/// Candidate built by the last model validation
	pub fn candidate(&self) -> Option<&M> {
		self.candidate.as_ref()
	}

	pub fn model_errors(&self) -> &SerializerErrors {
		&self.model_errors
	}

	/// Field-level errors, or the model errors when fields passed
	pub fn errors(&self) -> &SerializerErrors {
		if self.inner.errors().is_empty() {
			&self.model_errors
		} else {
			self.inner.errors()
		}
	}

	pub fn validated_data(&self) -> SerializerResult<&Map<String, Value>> {
		self.inner.validated_data()
	}

	pub fn serializer(&self) -> &ModelSerializer<M> {
		&self.inner
	}

	pub fn serializer_mut(&mut self) -> &mut ModelSerializer<M> {
		&mut self.inner
	}

	pub fn into_inner(self) -> ModelSerializer<M> {
		self.inner
	}
}

impl<M: Model> std::fmt::Debug for FullCleanModelSerializer<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FullCleanModelSerializer")
			.field("model", &M::meta().name())
			.field("inner", &self.inner)
			.field("settings", &self.settings)
			.field("candidate", &self.candidate)
			.finish()
	}
}

fn construction_error<M: Model>(err: OrmError) -> SerializerError {
	SerializerError::configuration(format!(
		"Cannot build {} instance for model validation: {}",
		M::meta().name(),
		err
	))
}
