//! The capability bag handed to generator functions.
//!
//! A [`Context`] aggregates the value-generation [`Provider`] with what the
//! engine itself injects: the iteration index, the (hook-processed) override
//! record, the factory options, sequence helpers, the deferred-reference
//! wrapper and nested builds of the current factory. Nested builds share the
//! root call's [`DepthTracker`].

use std::fmt;
use std::sync::Arc;

use mockforge_faker::Provider;
use serde_json::Value;

use crate::depth::DepthTracker;
use crate::error::{FactoryError, FactoryResult};
use crate::factory::{BatchOverrides, ErasedFactory, IntoBatchSize};
use crate::options::FactoryOptions;
use crate::record::Record;
use crate::sequence::{self, Cycle, Sample};

/// Everything a generator function may use to produce one value.
///
/// # Examples
///
/// ```
/// use mockforge_core::Factory;
/// use serde_json::json;
///
/// let users: Factory = Factory::new(|ctx| {
///     Ok(json!({
///         "id": ctx.iteration() + 1,
///         "name": ctx.faker().name(),
///     }))
/// });
///
/// let first = users.build().unwrap();
/// assert_eq!(first["id"], 1);
/// ```
#[derive(Clone)]
pub struct Context {
	current: Arc<dyn ErasedFactory>,
	provider: Provider,
	iteration: u64,
	overrides: Record,
	depth: DepthTracker,
	options: FactoryOptions,
}

impl Context {
	pub(crate) fn new(
		current: Arc<dyn ErasedFactory>,
		provider: Provider,
		iteration: u64,
		overrides: Record,
		depth: DepthTracker,
		options: FactoryOptions,
	) -> Self {
		Self {
			current,
			provider,
			iteration,
			overrides,
			depth,
			options,
		}
	}

	/// The capability provider.
	pub fn faker(&self) -> &Provider {
		&self.provider
	}

	/// Zero-based index of this build within the factory's lifetime.
	pub fn iteration(&self) -> u64 {
		self.iteration
	}

	/// Overrides for this build, after before-build hooks ran.
	///
	/// They are merged over the generator's output afterwards; reading them
	/// here lets a generator derive other fields from an overridden one.
	pub fn overrides(&self) -> &Record {
		&self.overrides
	}

	/// Options of the factory being built.
	pub fn options(&self) -> &FactoryOptions {
		&self.options
	}

	/// Depth tracker of the current root call.
	pub fn depth(&self) -> &DepthTracker {
		&self.depth
	}

	/// Starts a new cycling cursor over `values`.
	pub fn iterate<T, I>(&self, values: I) -> FactoryResult<Cycle<T>>
	where
		T: Clone,
		I: IntoIterator<Item = T>,
	{
		sequence::iterate(values)
	}

	/// Starts a new non-repeating sampler over `values`, drawing from
	/// [`faker`](Self::faker).
	pub fn sample<T, I>(&self, values: I) -> FactoryResult<Sample<T>>
	where
		T: Clone + PartialEq,
		I: IntoIterator<Item = T>,
	{
		sequence::sample(values, &self.provider)
	}

	/// Deferred reference to another factory ("use").
	///
	/// Runs `callback` with this build's depth tracker, so nested builds made
	/// through [`Factory::build_nested`](crate::Factory::build_nested) or
	/// [`Factory::batch_nested`](crate::Factory::batch_nested) count towards
	/// the same limit as the outer build. That is what lets two factories
	/// that reference each other terminate. Whatever `callback` returns is
	/// returned unchanged.
	pub fn defer<R>(&self, callback: impl FnOnce(&DepthTracker) -> R) -> R {
		tracing::trace!(depth = self.depth.current(), "resolving deferred reference");
		callback(&self.depth)
	}

	/// Async counterpart of [`defer`](Self::defer); the callback receives an
	/// owned handle to the depth tracker.
	pub fn defer_async<F, Fut>(&self, callback: F) -> Fut
	where
		F: FnOnce(DepthTracker) -> Fut,
	{
		tracing::trace!(depth = self.depth.current(), "resolving deferred reference");
		callback(self.depth.clone())
	}

	/// Builds another value of the current factory one level deeper.
	///
	/// Returns `Ok(None)` when the depth limit is reached.
	pub fn build(&self) -> FactoryResult<Option<Value>> {
		self.build_with(Record::new())
	}

	/// Like [`build`](Self::build), with overrides.
	pub fn build_with(&self, overrides: Record) -> FactoryResult<Option<Value>> {
		self.depth
			.descend(|| self.current.build_value(&self.depth, overrides))
	}

	/// Builds `size` values of the current factory one level deeper.
	///
	/// Returns an empty list when the depth limit is reached.
	pub fn batch(&self, size: impl IntoBatchSize) -> FactoryResult<Vec<Value>> {
		self.batch_with(size, BatchOverrides::None)
	}

	/// Like [`batch`](Self::batch), with overrides.
	pub fn batch_with(
		&self,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<Value>> {
		let size = size.into_batch_size()?;
		let overrides = overrides.into();
		let items = self.depth.descend(|| {
			(0..size)
				.map(|index| {
					self.current
						.build_value(&self.depth, overrides.for_index(index))
				})
				.collect::<FactoryResult<Vec<_>>>()
		})?;
		Ok(items.unwrap_or_default())
	}

	/// Async counterpart of [`build`](Self::build).
	pub async fn build_async(&self) -> FactoryResult<Option<Value>> {
		self.build_async_with(Record::new()).await
	}

	/// Async counterpart of [`build_with`](Self::build_with).
	pub async fn build_async_with(&self, overrides: Record) -> FactoryResult<Option<Value>> {
		self.depth
			.descend_async(|| {
				self.current
					.build_value_async(self.depth.clone(), overrides)
			})
			.await
	}

	/// Async counterpart of [`batch`](Self::batch).
	pub async fn batch_async(&self, size: impl IntoBatchSize) -> FactoryResult<Vec<Value>> {
		self.batch_async_with(size, BatchOverrides::None).await
	}

	/// Async counterpart of [`batch_with`](Self::batch_with).
	pub async fn batch_async_with(
		&self,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<Value>> {
		let size = size.into_batch_size()?;
		let overrides = overrides.into();
		let items = self
			.depth
			.descend_async(|| async {
				let mut items = Vec::new();
				for index in 0..size {
					let item = self
						.current
						.build_value_async(self.depth.clone(), overrides.for_index(index))
						.await?;
					items.push(item);
				}
				Ok::<_, FactoryError>(items)
			})
			.await?;
		Ok(items.unwrap_or_default())
	}
}

impl fmt::Debug for Context {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("iteration", &self.iteration)
			.field("overrides", &self.overrides)
			.field("depth", &self.depth.current())
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
