//! Uniqueness lookups
//!
//! `validate_unique` asks a [`UniqueLookup`] whether another row already holds
//! a value combination. Applications back it with their database; the
//! [`InMemoryStore`] serves tests and prototypes.

use crate::exception::Result;
use crate::fields::ModelMeta;
use crate::model::Model;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Storage seam queried by uniqueness checks
pub trait UniqueLookup: Send + Sync {
	/// Whether a stored row of `meta` matches every `(field, value)` criterion,
	/// ignoring the row whose primary key equals `exclude_pk`
	fn exists(
		&self,
		meta: &ModelMeta,
		criteria: &[(String, Value)],
		exclude_pk: Option<&Value>,
	) -> Result<bool>;
}

/// Lookup that never reports a collision
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLookup;

impl UniqueLookup for NoopLookup {
	fn exists(
		&self,
		_meta: &ModelMeta,
		_criteria: &[(String, Value)],
		_exclude_pk: Option<&Value>,
	) -> Result<bool> {
		Ok(false)
	}
}

/// Row snapshots grouped by table
///
/// # Examples
///
/// ```
/// use reinhardt_fullclean_orm::{FieldMeta, InMemoryStore, ModelMeta, UniqueLookup};
/// use serde_json::json;
///
/// let meta = ModelMeta::new("User", "users")
///     .field(FieldMeta::auto_pk("id"))
///     .field(FieldMeta::new("email").unique());
///
/// let store = InMemoryStore::new();
/// store.insert_row("users", json!({"id": 1, "email": "a@example.com"}).as_object().unwrap().clone());
///
/// let criteria = vec![("email".to_string(), json!("a@example.com"))];
/// assert!(store.exists(&meta, &criteria, None).unwrap());
/// assert!(!store.exists(&meta, &criteria, Some(&json!(1))).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
	tables: RwLock<HashMap<String, Vec<Map<String, Value>>>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a snapshot of `instance`
	pub fn insert<M: Model>(&self, instance: &M) {
		self.insert_row(M::meta().table_name(), instance.values());
	}

	pub fn insert_row(&self, table: &str, row: Map<String, Value>) {
		self.tables
			.write()
			.entry(table.to_string())
			.or_default()
			.push(row);
	}

	pub fn len(&self, table: &str) -> usize {
		self.tables.read().get(table).map(Vec::len).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.tables.read().values().all(Vec::is_empty)
	}

	pub fn clear(&self) {
		self.tables.write().clear();
	}
}

fn row_matches(meta: &ModelMeta, row: &Map<String, Value>, criteria: &[(String, Value)]) -> bool {
	criteria.iter().all(|(name, expected)| {
		let stored = row.get(name).unwrap_or(&Value::Null);
		let stored = match meta.get_field(name) {
			Ok(field) => field.lookup_value(stored),
			Err(_) => Some(stored.clone()),
		};
		stored.as_ref() == Some(expected)
	})
}

impl UniqueLookup for InMemoryStore {
	fn exists(
		&self,
		meta: &ModelMeta,
		criteria: &[(String, Value)],
		exclude_pk: Option<&Value>,
	) -> Result<bool> {
		let tables = self.tables.read();
		let Some(rows) = tables.get(meta.table_name()) else {
			return Ok(false);
		};
		Ok(rows.iter().any(|row| {
			let excluded = exclude_pk.is_some_and(|pk| row.get(meta.pk_name()) == Some(pk));
			!excluded && row_matches(meta, row, criteria)
		}))
	}
}
