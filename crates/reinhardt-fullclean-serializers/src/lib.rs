//! Serializers with model-level validation
//!
//! [`ModelSerializer`] performs field-level checks only, like its REST
//! framework counterpart. [`FullCleanModelSerializer`] adds the model's
//! `full_clean` (field constraints, `Model::clean`, uniqueness) on top and
//! reports its errors in the same field-keyed shape.
//!
//! ## Example
//!
//! ```ignore
//! let serializer = ModelSerializer::<Customer>::new()
//!     .instance(customer)
//!     .partial(true)
//!     .data(json!({"email": "x@example.com"}));
//! let mut serializer = FullCleanModelSerializer::new(serializer, Arc::new(store));
//!
//! if !serializer.is_valid(false, &FullCleanOptions::new())? {
//!     return Err(serializer.errors().to_json());
//! }
//! ```

pub mod fields;
pub mod full_clean;
pub mod model_serializer;
pub mod serializer;
pub mod settings;

pub use fields::{FieldType, SerializerField};
pub use full_clean::{FullCleanModelSerializer, FullCleanOptions};
pub use model_serializer::ModelSerializer;
pub use serializer::{
	SerializerError, SerializerErrors, SerializerResult, as_serializer_error,
};
pub use settings::{ENV_PREFIX, FullCleanSettings, SettingsError};

pub use reinhardt_fullclean_orm::ErrorDetail;
