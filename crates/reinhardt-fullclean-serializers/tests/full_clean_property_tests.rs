//! Property-based tests for FullCleanModelSerializer

mod common;

use common::{Customer, customer, seeded_store};
use proptest::prelude::*;
use reinhardt_fullclean_serializers::{FullCleanModelSerializer, FullCleanOptions, ModelSerializer};
use serde_json::{Value, json};

/// Any JSON value that is not an object
fn non_mapping() -> impl Strategy<Value = Value> {
	prop_oneof![
		Just(Value::Null),
		any::<bool>().prop_map(Value::Bool),
		any::<i64>().prop_map(Value::from),
		"[a-z]{0,12}".prop_map(Value::String),
		prop::collection::vec(any::<i64>(), 0..4).prop_map(|items| json!(items)),
	]
}

fn input() -> impl Strategy<Value = Value> {
	prop_oneof![
		Just(json!({"name": "a", "email": "b@example.com"})),
		Just(json!({"name": "b", "email": "b@example.com"})),
		Just(json!({"name": "", "email": "nope"})),
		Just(json!({})),
	]
}

proptest! {
	/// A non-mapping `extra_include` is rejected whatever the data and flags
	#[test]
	fn prop_non_mapping_extra_include_is_configuration_error(
		extra in non_mapping(),
		data in input(),
		raise_exception in any::<bool>(),
		validate_unique in any::<bool>(),
	) {
		let mut serializer = FullCleanModelSerializer::<Customer>::new(
			ModelSerializer::new().data(data),
			seeded_store(),
		);
		let options = FullCleanOptions::new()
			.validate_unique(validate_unique)
			.extra_include(extra);

		let result = serializer.is_valid(raise_exception, &options);
		prop_assert!(result.is_err());
		prop_assert!(result.unwrap_err().is_configuration_error());
	}

	/// Validating twice gives the same outcome and never touches the instance
	#[test]
	fn prop_validation_is_idempotent(
		email in "[a-z]{1,8}@example\\.com",
		name in prop_oneof![Just("a".to_string()), Just("b".to_string()), "[c-z]{1,8}"],
		credit in -3i64..3,
	) {
		let original = customer(2, "b", "b@example.com");
		let mut serializer = FullCleanModelSerializer::new(
			ModelSerializer::new()
				.instance(original.clone())
				.partial(true)
				.data(json!({"name": &name, "email": email})),
			seeded_store(),
		);
		let options = FullCleanOptions::new().extra_include(json!({"credit": credit}));

		let first = serializer.is_valid(false, &options).unwrap();
		let first_errors = serializer.errors().clone();
		let first_candidate = serializer.candidate().cloned();
		let second = serializer.is_valid(false, &options).unwrap();

		prop_assert_eq!(first, second);
		prop_assert_eq!(&first_errors, serializer.errors());
		prop_assert_eq!(first_candidate, serializer.candidate().cloned());
		prop_assert_eq!(serializer.serializer().get_instance(), Some(&original));
		// "a" is taken by customer 1; negative credit fails its validator
		prop_assert_eq!(first, name != "a" && credit >= 0);
	}
}
