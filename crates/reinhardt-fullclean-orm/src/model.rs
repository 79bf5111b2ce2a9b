//! The model trait
//!
//! Instead of attribute reflection, a model exposes its schema through
//! [`Model::meta`] and reads/writes fields through an explicit getter and
//! setter pair. Everything else (construction from a value map, snapshots,
//! `full_clean`) is derived from those.

use crate::exception::{Error, Result};
use crate::fields::ModelMeta;
use crate::full_clean;
use crate::store::UniqueLookup;
use crate::validation::ValidationError;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// A persistent model type
///
/// # Examples
///
/// ```
/// use once_cell::sync::Lazy;
/// use reinhardt_fullclean_orm::{Error, FieldMeta, Model, ModelMeta};
/// use serde_json::{json, Value};
///
/// static TAG_META: Lazy<ModelMeta> = Lazy::new(|| {
///     ModelMeta::new("Tag", "tags")
///         .field(FieldMeta::auto_pk("id"))
///         .field(FieldMeta::new("label").unique())
/// });
///
/// #[derive(Debug, Clone, Default)]
/// struct Tag {
///     id: Option<i64>,
///     label: String,
/// }
///
/// impl Model for Tag {
///     fn meta() -> &'static ModelMeta {
///         &TAG_META
///     }
///     fn blank() -> Self {
///         Self::default()
///     }
///     fn value_of(&self, field: &str) -> Option<Value> {
///         match field {
///             "id" => Some(json!(self.id)),
///             "label" => Some(json!(self.label)),
///             _ => None,
///         }
///     }
///     fn set_value(&mut self, field: &str, value: Value) -> Result<(), Error> {
///         match field {
///             "id" => self.id = value.as_i64(),
///             "label" => {
///                 self.label = value
///                     .as_str()
///                     .ok_or_else(|| Error::assignment("Tag", field, &value, "expected a string"))?
///                     .to_string()
///             }
///             _ => return Err(Self::unknown_field(field)),
///         }
///         Ok(())
///     }
/// }
///
/// let tag = Tag::from_values(json!({"label": "rust"}).as_object().unwrap()).unwrap();
/// assert_eq!(tag.label, "rust");
/// assert!(tag.is_adding());
/// ```
pub trait Model: Clone + Debug + Send + Sync + 'static {
	/// Schema of this model
	fn meta() -> &'static ModelMeta;

	/// A fresh, unsaved instance with default field values
	fn blank() -> Self;

	/// Read a field; `None` when the model has no such attribute
	fn value_of(&self, field: &str) -> Option<Value>;

	/// Assign a field
	fn set_value(&mut self, field: &str, value: Value) -> Result<()>;

	/// Model-wide validation hook, run by `full_clean` after field checks
	///
	/// Return errors keyed on a field or with
	/// [`ValidationError::non_field`](crate::ValidationError::non_field).
	fn clean(&self) -> std::result::Result<(), ValidationError> {
		Ok(())
	}

	/// Construct an unsaved instance from a field → value mapping
	fn from_values(values: &Map<String, Value>) -> Result<Self> {
		let mut instance = Self::blank();
		for (field, value) in values {
			instance.set_value(field, value.clone())?;
		}
		Ok(instance)
	}

	/// Snapshot of concrete field values
	fn values(&self) -> Map<String, Value> {
		Self::meta()
			.fields()
			.map(|f| (f.name.clone(), self.value_of(&f.name).unwrap_or(Value::Null)))
			.collect()
	}

	/// Primary key, if assigned
	fn pk(&self) -> Option<Value> {
		self.value_of(Self::meta().pk_name())
			.filter(|value| !value.is_null())
	}

	/// Whether the instance has not been saved yet
	fn is_adding(&self) -> bool {
		self.pk().is_none()
	}

	/// Error for a field name the setter does not know
	fn unknown_field(field: &str) -> Error {
		Error::FieldDoesNotExist {
			model: Self::meta().name().to_string(),
			field: field.to_string(),
		}
	}

	/// Validate fields, run [`Model::clean`], and check uniqueness
	///
	/// Fields named in `exclude` are skipped by every phase.
	fn full_clean(
		&self,
		exclude: &BTreeSet<String>,
		validate_unique: bool,
		lookup: &dyn UniqueLookup,
	) -> Result<()> {
		full_clean::full_clean(self, exclude, validate_unique, lookup)
	}
}
