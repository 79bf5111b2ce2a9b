//! Model layer for reinhardt-fullclean
//!
//! Provides the pieces of a Django-style ORM that model validation needs:
//!
//! - [`ModelMeta`] / [`FieldMeta`]: an explicit schema per model type
//! - [`Model`]: explicit field getter/setter plus the `full_clean` lifecycle
//! - [`ValidationError`]: field-keyed validation messages
//! - [`UniqueLookup`]: the storage seam used by uniqueness checks

pub mod exception;
pub mod fields;
pub mod full_clean;
pub mod model;
pub mod store;
pub mod validation;
pub mod validators;

pub use exception::{Error, Result};
pub use fields::{DataType, FieldKind, FieldMeta, ModelMeta, is_empty_value};
pub use full_clean::{clean_fields, unique_checks, validate_unique};
pub use model::Model;
pub use store::{InMemoryStore, NoopLookup, UniqueLookup};
pub use validation::{ErrorDetail, NON_FIELD_ERRORS, ValidationError};
pub use validators::{
	EmailValidator, FieldValidator, FnValidator, MaxLengthValidator, MaxValueValidator,
	MinLengthValidator, MinValueValidator, RegexValidator,
};
