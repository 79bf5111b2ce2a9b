//! Shared models and fixtures for serializer tests

#![allow(dead_code)]

use once_cell::sync::Lazy;
use reinhardt_fullclean_orm::{
	Error, ErrorDetail, FieldMeta, FnValidator, InMemoryStore, MinValueValidator, Model,
	ModelMeta, UniqueLookup, ValidationError,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub static CUSTOMER_META: Lazy<ModelMeta> = Lazy::new(|| {
	ModelMeta::new("Customer", "customers")
		.field(FieldMeta::auto_pk("id"))
		.field(FieldMeta::char("name", 50).unique())
		.field(FieldMeta::email("email"))
		.field(FieldMeta::text("nickname").blank())
		.field(
			FieldMeta::foreign_key("company", "Company")
				.null()
				.blank()
				.validator(FnValidator::new("active_company", |value| {
					match value.get("active") {
						Some(Value::Bool(false)) => Err(ErrorDetail::invalid("Company is inactive.")),
						_ => Ok(()),
					}
				})),
		)
		.field(FieldMeta::foreign_key("referrer", "Customer").null().blank())
		.field(
			FieldMeta::integer("credit")
				.with_default()
				.validator(MinValueValidator::new(0)),
		)
		.field(FieldMeta::many_to_many("groups", "Group"))
		.field(FieldMeta::many_to_many_rel("followers", "Customer"))
});

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
	pub id: Option<i64>,
	pub name: String,
	pub email: String,
	pub nickname: String,
	pub company: Value,
	pub referrer: Value,
	pub credit: i64,
	pub groups: Vec<i64>,
}

impl Model for Customer {
	fn meta() -> &'static ModelMeta {
		&CUSTOMER_META
	}

	fn blank() -> Self {
		Self {
			id: None,
			name: String::new(),
			email: String::new(),
			nickname: String::new(),
			company: Value::Null,
			referrer: Value::Null,
			credit: 0,
			groups: Vec::new(),
		}
	}

	fn value_of(&self, field: &str) -> Option<Value> {
		match field {
			"id" => Some(json!(self.id)),
			"name" => Some(json!(self.name)),
			"email" => Some(json!(self.email)),
			"nickname" => Some(json!(self.nickname)),
			"company" => Some(self.company.clone()),
			"referrer" => Some(self.referrer.clone()),
			"credit" => Some(json!(self.credit)),
			"groups" => Some(json!(self.groups)),
			_ => None,
		}
	}

	fn set_value(&mut self, field: &str, value: Value) -> Result<(), Error> {
		let text = |value: &Value| {
			value
				.as_str()
				.map(str::to_string)
				.ok_or_else(|| Error::assignment("Customer", field, value, "expected a string"))
		};
		match field {
			"id" => self.id = value.as_i64(),
			"name" => self.name = text(&value)?,
			"email" => self.email = text(&value)?,
			"nickname" => self.nickname = text(&value)?,
			"company" => self.company = value,
			"referrer" => self.referrer = value,
			"credit" => {
				self.credit = value.as_i64().ok_or_else(|| {
					Error::assignment("Customer", field, &value, "expected an integer")
				})?
			}
			"groups" => {
				return Err(Error::assignment(
					"Customer",
					field,
					&value,
					"direct assignment to the forward side of a many-to-many set is prohibited",
				));
			}
			_ => return Err(Self::unknown_field(field)),
		}
		Ok(())
	}

	fn clean(&self) -> Result<(), ValidationError> {
		if !self.nickname.is_empty() && self.nickname == self.name {
			return Err(ValidationError::non_field(
				"Nickname must differ from name.",
				"invalid",
			));
		}
		Ok(())
	}
}

/// A saved customer
pub fn customer(id: i64, name: &str, email: &str) -> Customer {
	Customer {
		id: Some(id),
		name: name.to_string(),
		email: email.to_string(),
		..Customer::blank()
	}
}

/// Store holding customer "a" with id 1
pub fn seeded_store() -> Arc<InMemoryStore> {
	let store = InMemoryStore::new();
	store.insert(&customer(1, "a", "a@example.com"));
	Arc::new(store)
}

/// Lookup that records how often it is queried
#[derive(Debug, Default)]
pub struct CountingLookup {
	pub calls: AtomicUsize,
}

impl CountingLookup {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl UniqueLookup for CountingLookup {
	fn exists(
		&self,
		_meta: &ModelMeta,
		_criteria: &[(String, Value)],
		_exclude_pk: Option<&Value>,
	) -> Result<bool, Error> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Ok(false)
	}
}

/// Lookup whose backing store is unreachable
#[derive(Debug, Default)]
pub struct FailingLookup;

impl UniqueLookup for FailingLookup {
	fn exists(
		&self,
		_meta: &ModelMeta,
		_criteria: &[(String, Value)],
		_exclude_pk: Option<&Value>,
	) -> Result<bool, Error> {
		Err(Error::Database("connection refused".to_string()))
	}
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
		.with_test_writer()
		.try_init();
}
