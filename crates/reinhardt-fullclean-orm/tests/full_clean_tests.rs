//! Integration tests for the full_clean lifecycle

use once_cell::sync::Lazy;
use reinhardt_fullclean_orm::{
	Error, FieldMeta, InMemoryStore, MaxLengthValidator, Model, ModelMeta, NON_FIELD_ERRORS,
	NoopLookup, ValidationError,
};
use rstest::{fixture, rstest};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

static EVENT_META: Lazy<ModelMeta> = Lazy::new(|| {
	ModelMeta::new("Event", "events")
		.field(FieldMeta::auto_pk("id"))
		.field(
			FieldMeta::new("title")
				.unique()
				.validator(MaxLengthValidator::new(20)),
		)
		.field(FieldMeta::new("room"))
		.field(FieldMeta::new("starts"))
		.field(FieldMeta::new("ends"))
		.field(FieldMeta::foreign_key("venue", "Venue").null().blank())
		.unique_together(&["room", "starts"])
});

#[derive(Debug, Clone, Default, PartialEq)]
struct Event {
	id: Option<i64>,
	title: String,
	room: String,
	starts: i64,
	ends: i64,
	venue: Value,
}

impl Model for Event {
	fn meta() -> &'static ModelMeta {
		&EVENT_META
	}

	fn blank() -> Self {
		Self {
			venue: Value::Null,
			..Default::default()
		}
	}

	fn value_of(&self, field: &str) -> Option<Value> {
		match field {
			"id" => Some(json!(self.id)),
			"title" => Some(json!(self.title)),
			"room" => Some(json!(self.room)),
			"starts" => Some(json!(self.starts)),
			"ends" => Some(json!(self.ends)),
			"venue" => Some(self.venue.clone()),
			_ => None,
		}
	}

	fn set_value(&mut self, field: &str, value: Value) -> Result<(), Error> {
		let text = |value: &Value| {
			value
				.as_str()
				.map(str::to_string)
				.ok_or_else(|| Error::assignment("Event", field, value, "expected a string"))
		};
		let int = |value: &Value| {
			value
				.as_i64()
				.ok_or_else(|| Error::assignment("Event", field, value, "expected an integer"))
		};
		match field {
			"id" => self.id = value.as_i64(),
			"title" => self.title = text(&value)?,
			"room" => self.room = text(&value)?,
			"starts" => self.starts = int(&value)?,
			"ends" => self.ends = int(&value)?,
			"venue" => self.venue = value,
			_ => return Err(Self::unknown_field(field)),
		}
		Ok(())
	}

	fn clean(&self) -> Result<(), ValidationError> {
		if self.ends < self.starts {
			return Err(ValidationError::non_field(
				"An event cannot end before it starts.",
				"invalid",
			));
		}
		Ok(())
	}
}

fn event(values: Value) -> Event {
	let map: Map<String, Value> = values.as_object().cloned().unwrap();
	Event::from_values(&map).unwrap()
}

#[fixture]
fn store() -> InMemoryStore {
	let store = InMemoryStore::new();
	store.insert(&event(json!({
		"id": 1, "title": "Kickoff", "room": "A", "starts": 9, "ends": 10
	})));
	store
}

fn no_exclude() -> BTreeSet<String> {
	BTreeSet::new()
}

fn validation(err: Error) -> ValidationError {
	match err {
		Error::Validation(errors) => errors,
		other => panic!("expected validation error, got {other:?}"),
	}
}

#[rstest]
fn test_valid_instance_passes(store: InMemoryStore) {
	let candidate = event(json!({"title": "Retro", "room": "B", "starts": 9, "ends": 11}));
	assert!(candidate.full_clean(&no_exclude(), true, &store).is_ok());
}

#[rstest]
fn test_unique_field_collision(store: InMemoryStore) {
	let candidate = event(json!({"title": "Kickoff", "room": "B", "starts": 1, "ends": 2}));
	let errors = validation(candidate.full_clean(&no_exclude(), true, &store).unwrap_err());
	assert_eq!(
		errors.messages_for("title"),
		vec!["Event with this Title already exists."]
	);
	assert_eq!(errors.error_dict()["title"][0].code, "unique");
}

#[rstest]
fn test_unique_together_collision(store: InMemoryStore) {
	let candidate = event(json!({"title": "Other", "room": "A", "starts": 9, "ends": 12}));
	let errors = validation(candidate.full_clean(&no_exclude(), true, &store).unwrap_err());
	assert_eq!(
		errors.messages_for(NON_FIELD_ERRORS),
		vec!["Event with this Room and Starts already exists."]
	);
}

#[rstest]
fn test_unique_together_skipped_when_member_excluded(store: InMemoryStore) {
	let candidate = event(json!({"title": "Other", "room": "A", "starts": 9, "ends": 12}));
	let exclude = BTreeSet::from(["starts".to_string()]);
	assert!(candidate.full_clean(&exclude, true, &store).is_ok());
}

#[rstest]
fn test_validate_unique_disabled(store: InMemoryStore) {
	let candidate = event(json!({"title": "Kickoff", "room": "A", "starts": 9, "ends": 10}));
	assert!(candidate.full_clean(&no_exclude(), false, &store).is_ok());
}

#[rstest]
fn test_editing_excludes_own_row(store: InMemoryStore) {
	let candidate = event(json!({
		"id": 1, "title": "Kickoff", "room": "A", "starts": 9, "ends": 10
	}));
	assert!(!candidate.is_adding());
	assert!(candidate.full_clean(&no_exclude(), true, &store).is_ok());
}

#[rstest]
fn test_model_clean_errors_are_collected_with_field_errors() {
	let candidate = event(json!({"title": "", "room": "A", "starts": 5, "ends": 1}));
	let errors = validation(
		candidate
			.full_clean(&no_exclude(), true, &NoopLookup)
			.unwrap_err(),
	);
	assert_eq!(
		errors.messages_for("title"),
		vec!["This field cannot be blank."]
	);
	assert_eq!(
		errors.messages_for(NON_FIELD_ERRORS),
		vec!["An event cannot end before it starts."]
	);
}

#[rstest]
fn test_excluded_field_is_not_validated() {
	let candidate = event(json!({"title": "", "room": "A", "starts": 1, "ends": 2}));
	let exclude = BTreeSet::from(["title".to_string()]);
	assert!(candidate.full_clean(&exclude, true, &NoopLookup).is_ok());
}

#[rstest]
fn test_failed_field_skips_unique_lookup(store: InMemoryStore) {
	// Too long for the validator; the lookup must not add a second message
	let candidate = Event {
		title: "Kickoff".repeat(5),
		room: "Z".to_string(),
		starts: 1,
		ends: 2,
		..Event::blank()
	};
	store.insert(&Event {
		id: Some(2),
		..candidate.clone()
	});
	let errors = validation(candidate.full_clean(&no_exclude(), true, &store).unwrap_err());
	assert_eq!(errors.error_dict()["title"].len(), 1);
	assert_eq!(errors.error_dict()["title"][0].code, "max_length");
}

#[rstest]
fn test_from_values_reports_bad_assignment() {
	let map = json!({"starts": "nine"}).as_object().cloned().unwrap();
	let err = Event::from_values(&map).unwrap_err();
	assert!(matches!(err, Error::Assignment { .. }));
	assert!(!err.is_validation_error());
}

#[rstest]
fn test_from_values_reports_unknown_field() {
	let map = json!({"capacity": 10}).as_object().cloned().unwrap();
	let err = Event::from_values(&map).unwrap_err();
	assert!(matches!(err, Error::FieldDoesNotExist { .. }));
}

#[rstest]
fn test_values_snapshot_lists_concrete_fields() {
	let snapshot = event(json!({"title": "T", "room": "R", "starts": 1, "ends": 2})).values();
	let keys: Vec<&str> = snapshot.keys().map(String::as_str).collect();
	assert_eq!(keys, vec!["id", "title", "room", "starts", "ends", "venue"]);
}
