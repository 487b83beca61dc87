//! Error types for the factory engine.
//!
//! Errors raised by user-supplied generator functions and hooks pass through
//! the engine untouched; the variants below only describe failures the engine
//! itself detects.

use thiserror::Error;

/// Errors that can occur while building, deriving or persisting factory output.
#[derive(Debug, Error)]
pub enum FactoryError {
	/// A call-site argument was rejected.
	#[error("Validation error: {argument}: {message}")]
	Validation {
		/// Argument that failed validation.
		argument: String,
		/// Validation error message.
		message: String,
	},

	/// The factory is not set up for the requested operation.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// Nested builds went deeper than an unbounded factory graph may go.
	#[error(
		"Circular reference detected: nested build depth {depth} exceeds {limit} without a configured max_depth"
	)]
	CircularReference {
		/// Depth at which the nested build was rejected.
		depth: usize,
		/// Hard ceiling that was exceeded.
		limit: usize,
	},

	/// A generator function returned something other than a mapping.
	#[error("Generator must return a mapping, got {found}")]
	NotAMapping {
		/// JSON kind of the value that was returned.
		found: &'static str,
	},

	/// Generated output could not be converted to or from the factory's type.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// A persistence adapter failed.
	#[error("Persistence error: {0}")]
	Persistence(String),

	/// Error raised by a generator function or hook.
	#[error(transparent)]
	Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl FactoryError {
	/// Creates a validation error for `argument`.
	pub fn validation(argument: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation {
			argument: argument.into(),
			message: message.into(),
		}
	}

	/// Creates the error returned when `iterate`/`sample` get no values.
	pub fn empty_source(operation: &str) -> Self {
		Self::validation(
			"values",
			format!("{} requires at least one value", operation),
		)
	}

	/// Creates the error returned when a synchronous entry point meets an
	/// asynchronous generator or hook.
	pub(crate) fn requires_async(entry_point: &str, reason: &str) -> Self {
		Self::Configuration(format!(
			"{}; use {}_async() instead of {}()",
			reason, entry_point, entry_point
		))
	}

	/// Wraps any user error so it can be returned from a generator or hook.
	pub fn custom<E>(error: E) -> Self
	where
		E: Into<Box<dyn std::error::Error + Send + Sync>>,
	{
		Self::Custom(error.into())
	}

	/// Returns true for [`FactoryError::Validation`].
	pub fn is_validation(&self) -> bool {
		matches!(self, Self::Validation { .. })
	}

	/// Returns true for [`FactoryError::Configuration`].
	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::Configuration(_))
	}
}

/// Result type alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;
