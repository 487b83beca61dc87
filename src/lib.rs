//! # mockforge
//!
//! Mock-data factories for Rust.
//!
//! A factory wraps a generator function and produces single values or
//! batches of synthetic data, with caller overrides, lifecycle hooks,
//! depth-limited recursion between factories, derived factories and
//! optional persistence.
//!
//! ## Crates
//!
//! - [`mockforge_core`]: the build engine ([`Factory`], [`Context`], hooks,
//!   depth tracking, derivation, persistence adapters).
//! - [`mockforge_faker`]: the seedable fake-value [`Provider`] handed to
//!   generator functions.
//!
//! ## Quick Start
//!
//! ```
//! use mockforge::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Post {
//!     id: u64,
//!     title: String,
//!     status: String,
//! }
//!
//! let posts = Factory::<Post>::new(|ctx| {
//!     Ok(json!({
//!         "id": ctx.iteration() + 1,
//!         "title": ctx.faker().sentence(),
//!         "status": "draft",
//!     }))
//! });
//!
//! let published = posts.build_with(record! { "status": "published" }).unwrap();
//! assert_eq!(published.id, 1);
//! assert_eq!(published.status, "published");
//!
//! let drafts = posts.batch(3).unwrap();
//! assert!(drafts.iter().all(|post| post.status == "draft"));
//! ```
//!
//! ## Configuration
//!
//! [`FactoryOptions`] can be written in code, loaded from a TOML or JSON
//! file, and adjusted from `MOCKFORGE_MAX_DEPTH` / `MOCKFORGE_SEED`:
//!
//! ```
//! use mockforge::prelude::*;
//!
//! let options = FactoryOptions::from_toml_str("max_depth = 2\nseed = 7")
//!     .unwrap()
//!     .with_env_overrides()
//!     .unwrap();
//! let users: Factory = Factory::new(|ctx| Ok(json!({ "name": ctx.faker().name() })))
//!     .with_options(options);
//! # let _ = users;
//! ```

#![warn(missing_docs)]

pub use mockforge_core::{
	BatchOverrides, Context, Cycle, DepthTracker, Factory, FactoryError, FactoryOptions,
	FactoryOutput, FactoryResult, HookContext, IntoBatchSize, MAX_UNBOUNDED_DEPTH, MemoryAdapter, Partial,
	PersistenceAdapter, Record, Sample, Shape, merge, record,
};
pub use mockforge_core::{adapter, depth, derive, error, hooks, options, sequence};

pub use mockforge_faker::Provider;

/// The `fake` crate, as used by [`Provider`].
#[cfg(feature = "faker")]
pub use mockforge_faker::fake;

/// Convenience re-exports for writing factories.
pub mod prelude {
	pub use mockforge_core::prelude::*;

	// External
	pub use async_trait::async_trait;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::json;
}
