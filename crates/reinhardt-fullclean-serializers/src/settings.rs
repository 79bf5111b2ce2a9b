//! Settings for model validation from serializers
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables prefixed with [`ENV_PREFIX`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Prefix of environment variables that override settings
pub const ENV_PREFIX: &str = "REINHARDT_FULLCLEAN_";

/// Error type for loading settings
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid value for {key}: {value:?}")]
	InvalidValue { key: String, value: String },
}

/// Model validation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullCleanSettings {
	/// Key that model-wide errors are reported under
	pub non_field_errors_key: String,
	/// Default for the uniqueness pass when callers do not choose
	pub validate_unique: bool,
	/// Log a snapshot of each candidate instance at debug level
	pub log_candidates: bool,
}

impl Default for FullCleanSettings {
	fn default() -> Self {
		Self {
			non_field_errors_key: "non_field_errors".to_string(),
			validate_unique: true,
			log_candidates: true,
		}
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(SettingsError::InvalidValue {
			key: key.to_string(),
			value: value.to_string(),
		}),
	}
}

impl FullCleanSettings {
	/// Parse settings from TOML
	///
	/// Keys may sit at the top level or inside a `[fullclean]` table.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fullclean_serializers::FullCleanSettings;
	///
	/// let settings = FullCleanSettings::from_toml_str(
	///     "[fullclean]\nnon_field_errors_key = \"detail\"\n",
	/// )
	/// .unwrap();
	/// assert_eq!(settings.non_field_errors_key, "detail");
	/// assert!(settings.validate_unique);
	/// ```
	pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
		let mut root: toml::Table = toml::from_str(content)?;
		let settings = match root.remove("fullclean") {
			Some(toml::Value::Table(table)) => toml::Value::Table(table).try_into()?,
			Some(other) => {
				return Err(SettingsError::InvalidValue {
					key: "fullclean".to_string(),
					value: other.to_string(),
				});
			}
			None => toml::Value::Table(root).try_into()?,
		};
		Ok(settings)
	}

	/// Load settings from a TOML file; a missing file yields the defaults
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		if !path.exists() {
			tracing::debug!(path = %path.display(), "settings file not found, using defaults");
			return Ok(Self::default());
		}
		let content = fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Apply overrides from the process environment
	pub fn with_env_overrides(self) -> Result<Self, SettingsError> {
		self.with_env_vars(std::env::vars())
	}

	/// Apply overrides from `(name, value)` pairs; names without
	/// [`ENV_PREFIX`] are ignored
	pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Result<Self, SettingsError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		for (name, value) in vars {
			let Some(key) = name.as_ref().strip_prefix(ENV_PREFIX) else {
				continue;
			};
			let key = key.to_lowercase();
			let value = value.as_ref();
			match key.as_str() {
				"non_field_errors_key" => self.non_field_errors_key = value.to_string(),
				"validate_unique" => self.validate_unique = parse_bool(&key, value)?,
				"log_candidates" => self.log_candidates = parse_bool(&key, value)?,
				_ => tracing::trace!(key = %key, "ignoring unknown settings override"),
			}
		}
		self.validate()?;
		Ok(self)
	}

	/// Reject settings that would produce unusable error output
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.non_field_errors_key.trim().is_empty() {
			return Err(SettingsError::InvalidValue {
				key: "non_field_errors_key".to_string(),
				value: self.non_field_errors_key.clone(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let settings = FullCleanSettings::default();
		assert_eq!(settings.non_field_errors_key, "non_field_errors");
		assert!(settings.validate_unique);
		assert!(settings.log_candidates);
	}

	#[rstest]
	#[case("validate_unique = false\n")]
	#[case("[fullclean]\nvalidate_unique = false\n")]
	fn test_from_toml_str_layouts(#[case] content: &str) {
		let settings = FullCleanSettings::from_toml_str(content).unwrap();
		assert!(!settings.validate_unique);
		assert_eq!(settings.non_field_errors_key, "non_field_errors");
	}

	#[rstest]
	fn test_from_toml_str_rejects_bad_types() {
		let err = FullCleanSettings::from_toml_str("validate_unique = \"maybe\"\n").unwrap_err();
		assert!(matches!(err, SettingsError::Toml(_)));
	}

	#[rstest]
	fn test_env_vars_override() {
		let settings = FullCleanSettings::default()
			.with_env_vars([
				("REINHARDT_FULLCLEAN_NON_FIELD_ERRORS_KEY", "errors"),
				("REINHARDT_FULLCLEAN_LOG_CANDIDATES", "off"),
				("UNRELATED", "1"),
			])
			.unwrap();
		assert_eq!(settings.non_field_errors_key, "errors");
		assert!(!settings.log_candidates);
	}

	#[rstest]
	#[case("REINHARDT_FULLCLEAN_VALIDATE_UNIQUE", "sometimes")]
	#[case("REINHARDT_FULLCLEAN_NON_FIELD_ERRORS_KEY", "  ")]
	fn test_env_vars_invalid(#[case] name: &str, #[case] value: &str) {
		let err = FullCleanSettings::default()
			.with_env_vars([(name, value)])
			.unwrap_err();
		assert!(matches!(err, SettingsError::InvalidValue { .. }));
	}
}
