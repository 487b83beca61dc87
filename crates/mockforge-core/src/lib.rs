//! Factory build engine for mock data.
//!
//! A [`Factory`] turns a generator function into single values or batches of
//! synthetic data:
//!
//! - **Overrides**: caller-supplied fields are shallow-merged over generated
//!   ones ([`merge`]).
//! - **Hooks**: before-build hooks rewrite overrides, after-build hooks rewrite
//!   results, synchronously or asynchronously.
//! - **Depth limits**: nested and mutually recursive factories stop at
//!   `max_depth` and yield a sentinel instead of recursing forever
//!   ([`DepthTracker`]).
//! - **Derivation**: [`Factory::extend`], [`Factory::compose`] and
//!   [`Factory::partial`].
//! - **Persistence**: built values can be handed to a
//!   [`PersistenceAdapter`].
//!
//! # Quick Start
//!
//! ```
//! use mockforge_core::prelude::*;
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//!     role: String,
//! }
//!
//! let users = Factory::<User>::new(|ctx| {
//!     let mut roles = ctx.iterate(["admin", "member"])?;
//!     Ok(json!({
//!         "id": ctx.iteration() + 1,
//!         "name": ctx.faker().name(),
//!         "role": roles.nth(ctx.iteration() as usize),
//!     }))
//! });
//!
//! let batch = users.batch(3).unwrap();
//! assert_eq!(batch[0].role, "admin");
//! assert_eq!(batch[1].role, "member");
//!
//! let named = users.build_with(record! { "name": "Ada" }).unwrap();
//! assert_eq!(named.name, "Ada");
//! ```
//!
//! # Recursive factories
//!
//! Generators reach other factories (or themselves) through
//! [`Context::defer`], which hands over the depth tracker of the build in
//! flight:
//!
//! ```
//! use mockforge_core::prelude::*;
//! use serde_json::json;
//!
//! let nodes: Factory = Factory::new(|ctx| {
//!     let child = ctx.build()?;
//!     Ok(json!({ "depth": ctx.depth().current(), "child": child }))
//! })
//! .with_max_depth(2);
//!
//! let root = nodes.build().unwrap();
//! assert_eq!(root["child"]["child"]["child"], serde_json::Value::Null);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod context;
pub mod depth;
pub mod derive;
pub mod error;
pub mod factory;
pub mod generator;
pub mod hooks;
pub mod options;
mod persist;
pub mod prelude;
pub mod record;
pub mod sequence;

// Re-export commonly used types at crate root
pub use adapter::{MemoryAdapter, PersistenceAdapter};
pub use context::Context;
pub use depth::{DepthGuard, DepthTracker, MAX_UNBOUNDED_DEPTH};
pub use derive::{Partial, Shape};
pub use error::{FactoryError, FactoryResult};
pub use factory::{BatchOverrides, Factory, FactoryOutput, IntoBatchSize};
pub use hooks::HookContext;
pub use options::FactoryOptions;
pub use record::{Record, into_record, merge};
pub use sequence::{Cycle, Sample};

pub use mockforge_faker::Provider;

#[doc(hidden)]
pub mod __private {
	pub use serde_json;
}
