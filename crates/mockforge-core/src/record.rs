//! Mapping-shaped values and the override merger.
//!
//! Every generator function produces a [`Record`] and every override object
//! is one. [`merge`] lays overrides on top of generated output, one level
//! deep, with explicit `null` overrides winning like any other value.

use serde_json::{Map, Value};

use crate::error::{FactoryError, FactoryResult};

/// A JSON object: the shape generators produce and overrides are written in.
pub type Record = Map<String, Value>;

/// Builds a [`Record`] from JSON object syntax.
///
/// # Examples
///
/// ```
/// use mockforge_core::record;
///
/// let overrides = record! { "name": "X", "nickname": null };
/// assert_eq!(overrides["name"], "X");
/// assert!(overrides["nickname"].is_null());
/// ```
#[macro_export]
macro_rules! record {
	() => {
		$crate::Record::new()
	};
	($($body:tt)+) => {
		match $crate::__private::serde_json::json!({ $($body)+ }) {
			$crate::__private::serde_json::Value::Object(map) => map,
			_ => unreachable!("object literal always produces an object"),
		}
	};
}

/// Shallow-merges `overrides` onto `base`.
///
/// Every key present in `overrides` replaces the key in `base`, including
/// keys whose override value is `null`. Keys absent from `overrides` keep the
/// generated value. Nested objects are replaced, never merged.
pub fn merge(mut base: Record, overrides: &Record) -> Record {
	for (key, value) in overrides {
		base.insert(key.clone(), value.clone());
	}
	base
}

/// Converts generator output into a [`Record`].
///
/// # Errors
///
/// Returns [`FactoryError::NotAMapping`] for anything but a JSON object.
pub fn into_record(value: Value) -> FactoryResult<Record> {
	match value {
		Value::Object(map) => Ok(map),
		other => Err(FactoryError::NotAMapping {
			found: kind_of(&other),
		}),
	}
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
