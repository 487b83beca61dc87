//! Factory options and where they can be loaded from.
//!
//! Options are plain data. They can be written in code, read from a `.toml`
//! or `.json` file, and adjusted from `MOCKFORGE_*` environment variables:
//!
//! ```toml
//! max_depth = 3
//! seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FactoryError, FactoryResult};

/// Environment variable overriding [`FactoryOptions::max_depth`].
pub const MAX_DEPTH_ENV: &str = "MOCKFORGE_MAX_DEPTH";

/// Environment variable overriding [`FactoryOptions::seed`].
pub const SEED_ENV: &str = "MOCKFORGE_SEED";

/// Construction-time settings of a factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryOptions {
	/// Deepest level nested builds may reach before they are truncated.
	///
	/// `None` leaves recursion unbounded up to
	/// [`MAX_UNBOUNDED_DEPTH`](crate::depth::MAX_UNBOUNDED_DEPTH).
	pub max_depth: Option<usize>,

	/// Seed for the factory's capability provider.
	pub seed: Option<u64>,
}

impl FactoryOptions {
	/// Creates default options: unbounded depth, entropy-seeded provider.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the maximum nesting depth.
	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = Some(max_depth);
		self
	}

	/// Sets the provider seed.
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	/// Parses options from TOML.
	pub fn from_toml_str(contents: &str) -> FactoryResult<Self> {
		toml::from_str(contents)
			.map_err(|e| FactoryError::Configuration(format!("TOML parse error: {}", e)))
	}

	/// Parses options from JSON.
	pub fn from_json_str(contents: &str) -> FactoryResult<Self> {
		serde_json::from_str(contents)
			.map_err(|e| FactoryError::Configuration(format!("JSON parse error: {}", e)))
	}

	/// Loads options from a `.toml` or `.json` file.
	pub fn from_file(path: impl AsRef<Path>) -> FactoryResult<Self> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path).map_err(|e| {
			FactoryError::Configuration(format!("Failed to read {}: {}", path.display(), e))
		})?;

		match path.extension().and_then(|ext| ext.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => Self::from_json_str(&contents),
			_ => Err(FactoryError::Configuration(format!(
				"Unsupported options file {}: supported formats are .toml and .json",
				path.display()
			))),
		}
	}

	/// Applies `MOCKFORGE_MAX_DEPTH` and `MOCKFORGE_SEED` when they are set.
	pub fn with_env_overrides(self) -> FactoryResult<Self> {
		self.with_overrides_from(|name| std::env::var(name).ok())
	}

	fn with_overrides_from(
		mut self,
		lookup: impl Fn(&str) -> Option<String>,
	) -> FactoryResult<Self> {
		if let Some(raw) = lookup(MAX_DEPTH_ENV) {
			self.max_depth = Some(parse_env(MAX_DEPTH_ENV, &raw)?);
		}
		if let Some(raw) = lookup(SEED_ENV) {
			self.seed = Some(parse_env(SEED_ENV, &raw)?);
		}
		Ok(self)
	}
}

fn parse_env<N: std::str::FromStr>(name: &str, raw: &str) -> FactoryResult<N> {
	raw.trim().parse().map_err(|_| {
		FactoryError::Configuration(format!(
			"{} must be a non-negative integer, got {:?}",
			name, raw
		))
	})
}
