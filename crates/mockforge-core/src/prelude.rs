//! Convenience re-exports for common usage.
//!
//! ```
//! use mockforge_core::prelude::*;
//!
//! let users: Factory = Factory::new(|ctx: &Context| {
//!     Ok(serde_json::json!({ "name": ctx.faker().name() }))
//! });
//! # let _ = users;
//! ```

// Error types
pub use crate::error::{FactoryError, FactoryResult};

// Engine types
pub use crate::context::Context;
pub use crate::depth::DepthTracker;
pub use crate::derive::{Partial, Shape};
pub use crate::factory::{BatchOverrides, Factory, FactoryOutput, IntoBatchSize};
pub use crate::hooks::HookContext;
pub use crate::options::FactoryOptions;
pub use crate::record::{Record, merge};

// Persistence
pub use crate::adapter::{MemoryAdapter, PersistenceAdapter};

// Capability provider
pub use mockforge_faker::Provider;

pub use crate::record;
