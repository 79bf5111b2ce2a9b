//! Model validation lifecycle
//!
//! `full_clean` runs three phases and reports everything it found at once:
//!
//! 1. [`clean_fields`]: per-field null/blank/choices checks and validators
//! 2. [`Model::clean`]: the model's own cross-field rules
//! 3. [`validate_unique`]: `unique` and `unique_together` lookups
//!
//! Fields that failed phase 1 are not looked up in phase 3.

use crate::exception::{Error, Result};
use crate::fields::ModelMeta;
use crate::model::Model;
use crate::store::UniqueLookup;
use crate::validation::{ErrorDetail, NON_FIELD_ERRORS, ValidationError};
use serde_json::Value;
use std::collections::BTreeSet;

/// Run every validation phase on `instance`
pub fn full_clean<M: Model>(
	instance: &M,
	exclude: &BTreeSet<String>,
	validate_unique_checks: bool,
	lookup: &dyn UniqueLookup,
) -> Result<()> {
	let meta = M::meta();
	tracing::debug!(
		model = meta.name(),
		exclude = ?exclude,
		validate_unique = validate_unique_checks,
		"full_clean"
	);

	let mut errors = ValidationError::new();
	let mut exclude = exclude.clone();

	if let Err(field_errors) = clean_fields(instance, &exclude) {
		errors.merge(field_errors);
	}

	if let Err(clean_errors) = instance.clean() {
		errors.merge(clean_errors);
	}

	if validate_unique_checks {
		// Skip lookups for fields that already failed
		exclude.extend(errors.fields().map(str::to_string));
		if let Err(err) = validate_unique(instance, &exclude, lookup) {
			match err {
				Error::Validation(unique_errors) => errors.merge(unique_errors),
				other => return Err(other),
			}
		}
	}

	if errors.is_empty() {
		Ok(())
	} else {
		tracing::debug!(model = meta.name(), errors = %errors, "full_clean failed");
		Err(Error::Validation(errors))
	}
}

/// Validate every concrete field not named in `exclude`
pub fn clean_fields<M: Model>(
	instance: &M,
	exclude: &BTreeSet<String>,
) -> std::result::Result<(), ValidationError> {
	let mut errors = ValidationError::new();

	for field in M::meta().fields() {
		if exclude.contains(&field.name) {
			continue;
		}
		let raw = instance.value_of(&field.name).unwrap_or(Value::Null);
		if field.blank && crate::fields::is_empty_value(&raw) {
			continue;
		}
		if let Err(details) = field.clean(&raw) {
			for detail in details {
				errors.add(field.name.clone(), detail);
			}
		}
	}

	if errors.is_empty() {
		Ok(())
	} else {
		Err(errors)
	}
}

/// Collect the uniqueness checks that apply when `exclude` is skipped
///
/// A `unique_together` set is dropped entirely when any of its fields is
/// excluded.
pub fn unique_checks(meta: &ModelMeta, exclude: &BTreeSet<String>) -> Vec<Vec<String>> {
	let mut checks: Vec<Vec<String>> = meta
		.unique_together_sets()
		.iter()
		.filter(|set| !set.iter().any(|name| exclude.contains(name)))
		.cloned()
		.collect();

	checks.extend(
		meta.fields()
			.filter(|f| f.unique && !exclude.contains(&f.name))
			.map(|f| vec![f.name.clone()]),
	);
	checks
}

/// Check `unique` and `unique_together` constraints against `lookup`
pub fn validate_unique<M: Model>(
	instance: &M,
	exclude: &BTreeSet<String>,
	lookup: &dyn UniqueLookup,
) -> Result<()> {
	let meta = M::meta();
	let adding = instance.is_adding();
	let current_pk = instance.pk();
	let mut errors = ValidationError::new();

	'checks: for check in unique_checks(meta, exclude) {
		let mut criteria = Vec::with_capacity(check.len());
		for name in &check {
			let field = meta.get_field(name)?;
			let raw = instance.value_of(name).unwrap_or(Value::Null);
			let Some(value) = field.lookup_value(&raw) else {
				// Null components never collide
				continue 'checks;
			};
			if field.primary_key && !adding {
				continue 'checks;
			}
			criteria.push((name.clone(), value));
		}

		let exclude_pk = if adding { None } else { current_pk.as_ref() };
		if lookup.exists(meta, &criteria, exclude_pk)? {
			tracing::trace!(model = meta.name(), check = ?check, "unique check collided");
			let (key, detail) = unique_error(meta, &check)?;
			errors.add(key, detail);
		}
	}

	if errors.is_empty() {
		Ok(())
	} else {
		Err(Error::Validation(errors))
	}
}

fn unique_error(meta: &ModelMeta, check: &[String]) -> Result<(String, ErrorDetail)> {
	let labels = check
		.iter()
		.map(|name| meta.get_field(name).map(|f| f.label()))
		.collect::<Result<Vec<_>>>()?;

	let message = format!(
		"{} with this {} already exists.",
		meta.label(),
		labels.join(" and ")
	);
	if let [single] = check {
		Ok((single.clone(), ErrorDetail::new(message, "unique")))
	} else {
		Ok((
			NON_FIELD_ERRORS.to_string(),
			ErrorDetail::new(message, "unique_together"),
		))
	}
}
