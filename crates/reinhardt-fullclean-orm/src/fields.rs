//! Explicit model schema
//!
//! Models describe their fields up front instead of being introspected at
//! runtime. Each [`FieldMeta`] records the name, relation kind, and the
//! constraints `full_clean` enforces; [`ModelMeta`] groups them the way the
//! ORM's `_meta` does (concrete fields, forward many-to-many, reverse
//! relations).

use crate::exception::{Error, Result};
use crate::validation::ErrorDetail;
use crate::validators::{EmailValidator, FieldValidator, MaxLengthValidator};
use serde_json::Value;
use std::sync::Arc;

/// How a field relates to other models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
	/// A plain column
	Concrete,
	/// Many-to-one relation to `to`
	ForeignKey { to: String },
	/// One-to-one relation to `to`
	OneToOne { to: String },
	/// Forward many-to-many relation to `to`
	ManyToMany { to: String },
	/// Reverse side of a many-to-many declared on `from`
	///
	/// Reverse accessors cannot be assigned before the instance is saved.
	ManyToManyRel { from: String },
}

/// Value type stored by a concrete column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
	/// Any JSON value; no type check
	#[default]
	Any,
	Text,
	Email,
	Integer,
	Float,
	Boolean,
}

impl DataType {
	/// Django-style `to_python` check
	fn check(&self, value: &Value) -> std::result::Result<(), ErrorDetail> {
		let (ok, expected) = match self {
			DataType::Any => (true, ""),
			DataType::Text | DataType::Email => (value.is_string(), "a string"),
			DataType::Integer => (value.is_i64() || value.is_u64(), "an integer"),
			DataType::Float => (value.is_number(), "a float"),
			DataType::Boolean => (value.is_boolean(), "either True or False"),
		};
		if ok {
			Ok(())
		} else {
			Err(ErrorDetail::invalid(format!(
				"\u{201c}{}\u{201d} value must be {}.",
				value, expected
			)))
		}
	}
}

/// Metadata for a single model field
#[derive(Debug, Clone)]
pub struct FieldMeta {
	pub name: String,
	pub kind: FieldKind,
	pub data_type: DataType,
	pub max_length: Option<usize>,
	pub verbose_name: Option<String>,
	pub null: bool,
	pub blank: bool,
	pub primary_key: bool,
	pub unique: bool,
	pub editable: bool,
	pub has_default: bool,
	pub choices: Option<Vec<Value>>,
	/// Attribute that carries the identity of a related value
	pub related_pk: String,
	pub validators: Vec<Arc<dyn FieldValidator>>,
}

/// Values Django treats as "empty" for blank/required checks
pub fn is_empty_value(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::Object(map) => map.is_empty(),
		_ => false,
	}
}

fn capfirst(text: &str) -> String {
	let mut chars = text.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

impl FieldMeta {
	/// Create a concrete, required, editable field
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::{FieldKind, FieldMeta};
	///
	/// let field = FieldMeta::new("title").unique();
	/// assert_eq!(field.kind, FieldKind::Concrete);
	/// assert!(field.unique);
	/// assert!(!field.null);
	/// assert!(field.editable);
	/// ```
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind: FieldKind::Concrete,
			data_type: DataType::Any,
			max_length: None,
			verbose_name: None,
			null: false,
			blank: false,
			primary_key: false,
			unique: false,
			editable: true,
			has_default: false,
			choices: None,
			related_pk: "id".to_string(),
			validators: Vec::new(),
		}
	}

	/// Text column bounded by `max_length`
	pub fn char(name: impl Into<String>, max_length: usize) -> Self {
		let mut field = Self::new(name).validator(MaxLengthValidator::new(max_length));
		field.data_type = DataType::Text;
		field.max_length = Some(max_length);
		field
	}

	pub fn text(name: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.data_type = DataType::Text;
		field
	}

	pub fn email(name: impl Into<String>) -> Self {
		let mut field = Self::char(name, 254).validator(EmailValidator::new());
		field.data_type = DataType::Email;
		field
	}

	pub fn integer(name: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.data_type = DataType::Integer;
		field
	}

	pub fn float(name: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.data_type = DataType::Float;
		field
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.data_type = DataType::Boolean;
		field
	}

	/// Auto-incrementing primary key: blank, non-editable, unique
	pub fn auto_pk(name: impl Into<String>) -> Self {
		let mut field = Self::integer(name);
		field.primary_key = true;
		field.unique = true;
		field.blank = true;
		field.editable = false;
		field
	}

	pub fn foreign_key(name: impl Into<String>, to: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.kind = FieldKind::ForeignKey { to: to.into() };
		field
	}

	pub fn one_to_one(name: impl Into<String>, to: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.kind = FieldKind::OneToOne { to: to.into() };
		field.unique = true;
		field
	}

	/// Forward many-to-many; blank because related rows are attached after save
	pub fn many_to_many(name: impl Into<String>, to: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.kind = FieldKind::ManyToMany { to: to.into() };
		field.blank = true;
		field
	}

	pub fn many_to_many_rel(name: impl Into<String>, from: impl Into<String>) -> Self {
		let mut field = Self::new(name);
		field.kind = FieldKind::ManyToManyRel { from: from.into() };
		field.blank = true;
		field.editable = false;
		field
	}

	pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = Some(verbose_name.into());
		self
	}

	pub fn null(mut self) -> Self {
		self.null = true;
		self
	}

	pub fn blank(mut self) -> Self {
		self.blank = true;
		self
	}

	pub fn unique(mut self) -> Self {
		self.unique = true;
		self
	}

	pub fn primary_key(mut self) -> Self {
		self.primary_key = true;
		self.unique = true;
		self
	}

	pub fn not_editable(mut self) -> Self {
		self.editable = false;
		self
	}

	pub fn with_default(mut self) -> Self {
		self.has_default = true;
		self
	}

	pub fn choices(mut self, choices: Vec<Value>) -> Self {
		self.choices = Some(choices);
		self
	}

	pub fn related_pk(mut self, related_pk: impl Into<String>) -> Self {
		self.related_pk = related_pk.into();
		self
	}

	pub fn validator(mut self, validator: impl FieldValidator + 'static) -> Self {
		self.validators.push(Arc::new(validator));
		self
	}

	/// Whether the field points at another model
	pub fn is_relation(&self) -> bool {
		!matches!(self.kind, FieldKind::Concrete)
	}

	/// Concrete columns and forward single-valued relations
	pub fn is_concrete(&self) -> bool {
		matches!(
			self.kind,
			FieldKind::Concrete | FieldKind::ForeignKey { .. } | FieldKind::OneToOne { .. }
		)
	}

	pub fn is_many_to_many(&self) -> bool {
		matches!(self.kind, FieldKind::ManyToMany { .. })
	}

	pub fn is_reverse_many_to_many(&self) -> bool {
		matches!(self.kind, FieldKind::ManyToManyRel { .. })
	}

	/// Human-readable label used in error messages
	pub fn label(&self) -> String {
		let base = self
			.verbose_name
			.clone()
			.unwrap_or_else(|| self.name.replace('_', " "));
		capfirst(&base)
	}

	/// Identity carried by a relation value
	///
	/// Object values are related instances and carry their key under
	/// `related_pk` (or `pk`); bare scalars are already a key.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::FieldMeta;
	/// use serde_json::json;
	///
	/// let author = FieldMeta::foreign_key("author", "User");
	/// assert_eq!(author.related_identity(&json!({"id": 7, "name": "ann"})), Some(&json!(7)));
	/// assert_eq!(author.related_identity(&json!(7)), Some(&json!(7)));
	/// assert_eq!(author.related_identity(&json!({"id": null, "name": "ann"})), None);
	/// assert_eq!(author.related_identity(&json!(null)), None);
	/// ```
	pub fn related_identity<'a>(&self, value: &'a Value) -> Option<&'a Value> {
		match value {
			Value::Null | Value::Array(_) => None,
			Value::Object(map) => map
				.get(&self.related_pk)
				.or_else(|| map.get("pk"))
				.filter(|v| !v.is_null()),
			scalar => Some(scalar),
		}
	}

	/// Value compared by uniqueness lookups
	pub fn lookup_value(&self, value: &Value) -> Option<Value> {
		if self.is_relation() {
			self.related_identity(value).cloned()
		} else if value.is_null() {
			None
		} else {
			Some(value.clone())
		}
	}

	/// Validate a single value against this field's own constraints
	///
	/// Stops at the first constraint violation, then runs every attached
	/// validator and collects their failures.
	pub fn clean(&self, value: &Value) -> std::result::Result<(), Vec<ErrorDetail>> {
		if !value.is_null()
			&& let Err(detail) = self.data_type.check(value)
		{
			return Err(vec![detail]);
		}
		if self.editable {
			self.check_constraints(value).map_err(|detail| vec![detail])?;
		}
		if is_empty_value(value) {
			return Ok(());
		}

		let errors: Vec<ErrorDetail> = self
			.validators
			.iter()
			.filter_map(|validator| validator.validate(value).err())
			.collect();
		if errors.is_empty() {
			Ok(())
		} else {
			Err(errors)
		}
	}

	// Non-editable fields skip these, but their validators still run.
	fn check_constraints(&self, value: &Value) -> std::result::Result<(), ErrorDetail> {
		if let Some(choices) = &self.choices
			&& !is_empty_value(value)
			&& !choices.contains(value)
		{
			return Err(ErrorDetail::new(
				format!("Value {} is not a valid choice.", value),
				"invalid_choice",
			));
		}
		if value.is_null() && !self.null {
			return Err(ErrorDetail::new("This field cannot be null.", "null"));
		}
		if !self.blank && is_empty_value(value) {
			return Err(ErrorDetail::new("This field cannot be blank.", "blank"));
		}
		Ok(())
	}
}

/// Schema of a model type
#[derive(Debug, Clone)]
pub struct ModelMeta {
	name: String,
	table_name: String,
	verbose_name: Option<String>,
	pk_name: String,
	fields: Vec<FieldMeta>,
	unique_together: Vec<Vec<String>>,
}

impl ModelMeta {
	/// Create an empty schema
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_orm::{FieldMeta, ModelMeta};
	///
	/// let meta = ModelMeta::new("Article", "articles")
	///     .field(FieldMeta::auto_pk("id"))
	///     .field(FieldMeta::new("title").unique())
	///     .field(FieldMeta::many_to_many("tags", "Tag"));
	///
	/// assert_eq!(meta.pk_name(), "id");
	/// assert_eq!(meta.validation_field_names(), vec!["id", "title", "tags"]);
	/// assert!(meta.get_field("missing").is_err());
	/// ```
	pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			table_name: table_name.into(),
			verbose_name: None,
			pk_name: "id".to_string(),
			fields: Vec::new(),
			unique_together: Vec::new(),
		}
	}

	/// Add a field; a primary-key field also becomes the model's pk
	pub fn field(mut self, field: FieldMeta) -> Self {
		if field.primary_key {
			self.pk_name = field.name.clone();
		}
		self.fields.push(field);
		self
	}

	pub fn unique_together(mut self, fields: &[&str]) -> Self {
		self.unique_together
			.push(fields.iter().map(|f| f.to_string()).collect());
		self
	}

	pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
		self.verbose_name = Some(verbose_name.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn table_name(&self) -> &str {
		&self.table_name
	}

	pub fn pk_name(&self) -> &str {
		&self.pk_name
	}

	pub fn label(&self) -> String {
		capfirst(self.verbose_name.as_deref().unwrap_or(&self.name))
	}

	/// Concrete fields, including forward foreign keys and one-to-one fields
	pub fn fields(&self) -> impl Iterator<Item = &FieldMeta> {
		self.fields.iter().filter(|f| f.is_concrete())
	}

	/// Forward many-to-many fields
	pub fn many_to_many(&self) -> impl Iterator<Item = &FieldMeta> {
		self.fields.iter().filter(|f| f.is_many_to_many())
	}

	/// Every declared field, reverse relations included
	pub fn all_fields(&self) -> &[FieldMeta] {
		&self.fields
	}

	/// Names `full_clean` can validate: concrete plus many-to-many fields
	pub fn validation_field_names(&self) -> Vec<String> {
		self.fields()
			.chain(self.many_to_many())
			.map(|f| f.name.clone())
			.collect()
	}

	/// Look up a field by name
	pub fn get_field(&self, name: &str) -> Result<&FieldMeta> {
		self.fields
			.iter()
			.find(|f| f.name == name)
			.ok_or_else(|| Error::FieldDoesNotExist {
				model: self.name.clone(),
				field: name.to_string(),
			})
	}

	pub fn has_field(&self, name: &str) -> bool {
		self.fields.iter().any(|f| f.name == name)
	}

	pub fn unique_together_sets(&self) -> &[Vec<String>] {
		&self.unique_together
	}
}
