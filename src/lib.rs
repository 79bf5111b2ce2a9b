//! # Reinhardt FullClean
//!
//! Model-level validation for Reinhardt-style `ModelSerializer`s.
//!
//! A `ModelSerializer` only checks field types and formats. Business rules
//! that live on the model (field constraints, the `clean()` hook, `unique` and
//! `unique_together`) run in `full_clean`, which serializers never call.
//! [`FullCleanModelSerializer`](serializers::FullCleanModelSerializer) closes
//! that gap: after the serializer's own checks pass it builds an unsaved
//! candidate instance, runs `full_clean` on it, and reports failures in the
//! serializer's `{"field": ["message"]}` shape.
//!
//! ## Crates
//!
//! - [`orm`]: explicit model schema, the [`Model`](orm::Model) trait,
//!   validators, `full_clean`, and uniqueness lookups
//! - [`serializers`]: `ModelSerializer`, error types, settings, and the
//!   full-clean adapter
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use reinhardt_fullclean::prelude::*;
//!
//! let serializer = ModelSerializer::<Customer>::new()
//!     .data(json!({"name": "a", "email": "b@example.com"}));
//! let mut serializer = FullCleanModelSerializer::new(serializer, Arc::new(store));
//!
//! if !serializer.is_valid(false, &FullCleanOptions::new())? {
//!     // {"name": ["Customer with this Name already exists."]}
//!     println!("{}", serializer.errors());
//! }
//! ```

pub use reinhardt_fullclean_orm as orm;
pub use reinhardt_fullclean_serializers as serializers;

pub use reinhardt_fullclean_orm::{Model, ModelMeta, ValidationError};
pub use reinhardt_fullclean_serializers::{
	FullCleanModelSerializer, FullCleanOptions, FullCleanSettings, ModelSerializer,
	SerializerError, SerializerErrors,
};

/// Commonly used types
pub mod prelude {
	pub use reinhardt_fullclean_orm::{
		DataType, Error, ErrorDetail, FieldKind, FieldMeta, FieldValidator, InMemoryStore,
		Model, ModelMeta, NON_FIELD_ERRORS, NoopLookup, UniqueLookup, ValidationError,
	};
	pub use reinhardt_fullclean_serializers::{
		FullCleanModelSerializer, FullCleanOptions, FullCleanSettings, ModelSerializer,
		SerializerError, SerializerErrors, SerializerField, SerializerResult,
	};
}
