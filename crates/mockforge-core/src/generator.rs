//! Generator functions, tagged sync or async at construction.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde::Serialize;
use serde_json::Value;

use crate::context::Context;
use crate::error::{FactoryError, FactoryResult};

/// Type-erased synchronous generator.
pub type SyncGeneratorFn = Arc<dyn Fn(&Context) -> FactoryResult<Value> + Send + Sync>;

/// Type-erased asynchronous generator.
pub type AsyncGeneratorFn =
	Arc<dyn Fn(Context) -> BoxFuture<'static, FactoryResult<Value>> + Send + Sync>;

/// A factory's generator function.
#[derive(Clone)]
pub enum Generator {
	/// Produces its value without suspending.
	Sync(SyncGeneratorFn),
	/// Produces its value through a future.
	Async(AsyncGeneratorFn),
}

impl Generator {
	/// Wraps a synchronous generator whose output serializes to a mapping.
	pub fn from_fn<F, S>(generator: F) -> Self
	where
		F: Fn(&Context) -> FactoryResult<S> + Send + Sync + 'static,
		S: Serialize,
	{
		Self::Sync(Arc::new(move |ctx| to_value(generator(ctx)?)))
	}

	/// Wraps an asynchronous generator whose output serializes to a mapping.
	pub fn from_async_fn<F, Fut, S>(generator: F) -> Self
	where
		F: Fn(Context) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = FactoryResult<S>> + Send + 'static,
		S: Serialize,
	{
		Self::Async(Arc::new(move |ctx| {
			generator(ctx)
				.map(|generated| generated.and_then(to_value))
				.boxed()
		}))
	}

	/// True when the generator must be awaited.
	pub fn is_async(&self) -> bool {
		matches!(self, Self::Async(_))
	}

	/// Invokes a synchronous generator.
	///
	/// # Errors
	///
	/// Fails with a configuration error for async generators, before invoking
	/// anything.
	pub fn call(&self, ctx: &Context) -> FactoryResult<Value> {
		match self {
			Self::Sync(generator) => generator(ctx),
			Self::Async(_) => Err(FactoryError::requires_async(
				"build",
				"factory generator is asynchronous",
			)),
		}
	}

	/// Invokes either kind of generator, returning a future.
	pub fn call_async(&self, ctx: Context) -> BoxFuture<'static, FactoryResult<Value>> {
		match self {
			Self::Sync(generator) => future::ready(generator(&ctx)).boxed(),
			Self::Async(generator) => generator(ctx),
		}
	}
}

impl fmt::Debug for Generator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sync(_) => f.write_str("Generator::Sync(..)"),
			Self::Async(_) => f.write_str("Generator::Async(..)"),
		}
	}
}

fn to_value<S: Serialize>(generated: S) -> FactoryResult<Value> {
	Ok(serde_json::to_value(generated)?)
}
