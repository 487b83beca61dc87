//! The factory build engine.
//!
//! A [`Factory`] owns a generator function, its options, a capability
//! provider, an iteration counter and its hook pipeline. Each build runs:
//!
//! 1. before-build hooks over the override record,
//! 2. the generator with a fresh [`Context`],
//! 3. the override merge ([`merge`]),
//! 4. deserialization into `T`,
//! 5. after-build hooks.
//!
//! Root calls (`build*`, `batch*`) start a new [`DepthTracker`]; the
//! `*_nested` entry points join the tracker of a build already in flight.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use mockforge_faker::Provider;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::adapter::PersistenceAdapter;
use crate::context::Context;
use crate::depth::DepthTracker;
use crate::error::{FactoryError, FactoryResult};
use crate::generator::Generator;
use crate::hooks::{self, HookContext, HookPipeline};
use crate::options::FactoryOptions;
use crate::record::{Record, into_record, merge};

/// Types a factory can produce.
///
/// Generated records are deserialized into the output type, and nested
/// builds serialize it back into JSON.
pub trait FactoryOutput: Serialize + DeserializeOwned + Send + 'static {}

impl<T> FactoryOutput for T where T: Serialize + DeserializeOwned + Send + 'static {}

/// Conversion of a requested batch size into a count.
///
/// Implemented for integers and floats so that negative and fractional sizes
/// are rejected at runtime instead of being silently truncated.
pub trait IntoBatchSize {
	/// Validates and converts the size.
	fn into_batch_size(self) -> FactoryResult<usize>;
}

fn invalid_size(size: impl fmt::Display) -> FactoryError {
	FactoryError::validation(
		"size",
		format!("batch size must be a non-negative integer, got {}", size),
	)
}

macro_rules! impl_into_batch_size {
	($($ty:ty),*) => {
		$(
			impl IntoBatchSize for $ty {
				fn into_batch_size(self) -> FactoryResult<usize> {
					usize::try_from(self).map_err(|_| invalid_size(self))
				}
			}
		)*
	};
}

impl_into_batch_size!(usize, u8, u16, u32, u64, i8, i16, i32, i64, isize);

impl IntoBatchSize for f64 {
	fn into_batch_size(self) -> FactoryResult<usize> {
		if self.is_finite() && self >= 0.0 && self.fract() == 0.0 && self <= usize::MAX as f64 {
			Ok(self as usize)
		} else {
			Err(invalid_size(self))
		}
	}
}

impl IntoBatchSize for f32 {
	fn into_batch_size(self) -> FactoryResult<usize> {
		f64::from(self).into_batch_size()
	}
}

/// Overrides applied to the items of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BatchOverrides {
	/// No overrides.
	#[default]
	None,
	/// The same overrides for every item.
	Uniform(Record),
	/// Overrides by position. A list shorter than the batch wraps around;
	/// an empty list applies nothing.
	PerItem(Vec<Record>),
}

impl BatchOverrides {
	/// Overrides for the item at `index`.
	pub fn for_index(&self, index: usize) -> Record {
		match self {
			Self::None => Record::new(),
			Self::Uniform(overrides) => overrides.clone(),
			Self::PerItem(items) if items.is_empty() => Record::new(),
			Self::PerItem(items) => items[index % items.len()].clone(),
		}
	}
}

impl From<Record> for BatchOverrides {
	fn from(overrides: Record) -> Self {
		Self::Uniform(overrides)
	}
}

impl From<Vec<Record>> for BatchOverrides {
	fn from(items: Vec<Record>) -> Self {
		Self::PerItem(items)
	}
}

impl From<Option<Record>> for BatchOverrides {
	fn from(overrides: Option<Record>) -> Self {
		overrides.map_or(Self::None, Self::Uniform)
	}
}

impl TryFrom<Value> for BatchOverrides {
	type Error = FactoryError;

	/// Accepts `null`, an object (uniform) or an array of objects (per item).
	fn try_from(value: Value) -> FactoryResult<Self> {
		match value {
			Value::Null => Ok(Self::None),
			Value::Object(overrides) => Ok(Self::Uniform(overrides)),
			Value::Array(items) => items
				.into_iter()
				.map(|item| match item {
					Value::Object(overrides) => Ok(overrides),
					other => Err(FactoryError::validation(
						"overrides",
						format!(
							"per-item overrides must be objects, got {}",
							crate::record::kind_of(&other)
						),
					)),
				})
				.collect::<FactoryResult<Vec<_>>>()
				.map(Self::PerItem),
			other => Err(FactoryError::validation(
				"overrides",
				format!(
					"batch overrides must be an object or an array of objects, got {}",
					crate::record::kind_of(&other)
				),
			)),
		}
	}
}

/// Object-safe view of a factory used for nested builds whose output is
/// embedded into another record.
pub(crate) trait ErasedFactory: Send + Sync {
	fn is_async(&self) -> bool;

	fn build_value(&self, depth: &DepthTracker, overrides: Record) -> FactoryResult<Value>;

	fn build_value_async(
		&self,
		depth: DepthTracker,
		overrides: Record,
	) -> BoxFuture<'_, FactoryResult<Value>>;
}

pub(crate) struct FactoryInner<T> {
	pub(crate) generator: Generator,
	pub(crate) options: FactoryOptions,
	pub(crate) provider: Provider,
	pub(crate) hooks: HookPipeline<T>,
	pub(crate) adapter: Option<Arc<dyn PersistenceAdapter<T>>>,
	pub(crate) iteration: Arc<AtomicU64>,
}

impl<T> Clone for FactoryInner<T> {
	fn clone(&self) -> Self {
		Self {
			generator: self.generator.clone(),
			options: self.options.clone(),
			provider: self.provider.clone(),
			hooks: self.hooks.clone(),
			adapter: self.adapter.clone(),
			iteration: Arc::clone(&self.iteration),
		}
	}
}

/// Produces mock values of `T` from a generator function.
///
/// `Factory` is a cheap handle; clones share the iteration counter. The
/// chainable registration methods consume the handle and return it, copying
/// the hook lists first if the handle was shared.
///
/// # Examples
///
/// ```
/// use mockforge_core::{Factory, record};
/// use serde_json::json;
///
/// let people: Factory = Factory::new(|_| Ok(json!({ "age": 30, "name": "Default Name" })));
///
/// let person = people.build_with(record! { "name": "X" }).unwrap();
/// assert_eq!(serde_json::Value::Object(person), json!({ "age": 30, "name": "X" }));
/// ```
pub struct Factory<T = Record> {
	pub(crate) inner: Arc<FactoryInner<T>>,
}

impl<T> Clone for Factory<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: FactoryOutput> Factory<T> {
	/// Creates a factory from a synchronous generator function.
	///
	/// The generator may return anything that serializes to a JSON object,
	/// usually a `serde_json::json!` literal.
	pub fn new<F, S>(generator: F) -> Self
	where
		F: Fn(&Context) -> FactoryResult<S> + Send + Sync + 'static,
		S: Serialize,
	{
		Self::from_generator(Generator::from_fn(generator))
	}

	/// Creates a factory from an asynchronous generator function.
	///
	/// Such a factory can only be built through the `*_async` entry points.
	pub fn new_async<F, Fut, S>(generator: F) -> Self
	where
		F: Fn(Context) -> Fut + Send + Sync + 'static,
		Fut: std::future::Future<Output = FactoryResult<S>> + Send + 'static,
		S: Serialize,
	{
		Self::from_generator(Generator::from_async_fn(generator))
	}

	/// Creates a factory around an already-wrapped generator.
	pub fn from_generator(generator: Generator) -> Self {
		Self::from_parts(generator, FactoryOptions::default(), Provider::new())
	}

	pub(crate) fn from_parts(
		generator: Generator,
		options: FactoryOptions,
		provider: Provider,
	) -> Self {
		Self::from_inner(FactoryInner {
			generator,
			options,
			provider,
			hooks: HookPipeline::new(),
			adapter: None,
			iteration: Arc::new(AtomicU64::new(0)),
		})
	}

	pub(crate) fn from_inner(inner: FactoryInner<T>) -> Self {
		Self {
			inner: Arc::new(inner),
		}
	}

	fn inner_mut(&mut self) -> &mut FactoryInner<T> {
		Arc::make_mut(&mut self.inner)
	}

	/// Replaces the options. A configured seed gives this factory its own
	/// seeded provider.
	pub fn with_options(mut self, options: FactoryOptions) -> Self {
		let inner = self.inner_mut();
		if let Some(seed) = options.seed {
			inner.provider = Provider::seeded(seed);
		}
		inner.options = options;
		self
	}

	/// Sets the maximum nesting depth.
	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.inner_mut().options.max_depth = Some(max_depth);
		self
	}

	/// Replaces the capability provider.
	pub fn with_provider(mut self, provider: Provider) -> Self {
		self.inner_mut().provider = provider;
		self
	}

	/// Registers a synchronous before-build hook.
	///
	/// Hooks run in registration order over the override record before the
	/// generator sees it. The [`HookContext`] carries the depth tracker of the
	/// build in flight; pass it to the `*_nested` entry points when a hook
	/// builds other factories.
	pub fn before_build<F>(mut self, hook: F) -> Self
	where
		F: Fn(Record, &HookContext) -> FactoryResult<Record> + Send + Sync + 'static,
	{
		self.inner_mut().hooks.push_before(hooks::sync_before(hook));
		self
	}

	/// Registers an asynchronous before-build hook.
	///
	/// Afterwards only the `*_async` entry points can build this factory.
	pub fn before_build_async<F, Fut>(mut self, hook: F) -> Self
	where
		F: Fn(Record, HookContext) -> Fut + Send + Sync + 'static,
		Fut: std::future::Future<Output = FactoryResult<Record>> + Send + 'static,
	{
		self.inner_mut().hooks.push_before(hooks::async_before(hook));
		self
	}

	/// Registers a synchronous after-build hook.
	pub fn after_build<F>(mut self, hook: F) -> Self
	where
		F: Fn(T, &HookContext) -> FactoryResult<T> + Send + Sync + 'static,
	{
		self.inner_mut().hooks.push_after(hooks::sync_after(hook));
		self
	}

	/// Registers an asynchronous after-build hook.
	///
	/// Afterwards only the `*_async` entry points can build this factory.
	pub fn after_build_async<F, Fut>(mut self, hook: F) -> Self
	where
		F: Fn(T, HookContext) -> Fut + Send + Sync + 'static,
		Fut: std::future::Future<Output = FactoryResult<T>> + Send + 'static,
	{
		self.inner_mut().hooks.push_after(hooks::async_after(hook));
		self
	}

	/// Sets the default persistence adapter used by `create*`.
	pub fn with_adapter<A>(mut self, adapter: A) -> Self
	where
		A: PersistenceAdapter<T> + 'static,
	{
		self.inner_mut().adapter = Some(Arc::new(adapter));
		self
	}

	/// The factory's options.
	pub fn options(&self) -> &FactoryOptions {
		&self.inner.options
	}

	/// The factory's capability provider.
	pub fn provider(&self) -> &Provider {
		&self.inner.provider
	}

	/// The registered hooks.
	pub fn hooks(&self) -> &HookPipeline<T> {
		&self.inner.hooks
	}

	/// Iteration index the next build will receive.
	///
	/// The index is claimed when the generator is invoked, so a build whose
	/// generator fails still uses one up.
	pub fn iteration(&self) -> u64 {
		self.inner.iteration.load(Ordering::SeqCst)
	}

	/// True when the generator or any hook is asynchronous.
	pub fn is_async(&self) -> bool {
		self.inner.generator.is_async() || self.inner.hooks.has_async()
	}

	fn ensure_sync(&self, entry_point: &str) -> FactoryResult<()> {
		if self.inner.generator.is_async() {
			return Err(FactoryError::requires_async(
				entry_point,
				"factory generator is asynchronous",
			));
		}
		if self.inner.hooks.has_async() {
			return Err(FactoryError::requires_async(
				entry_point,
				"factory has asynchronous hooks",
			));
		}
		Ok(())
	}

	fn root_tracker(&self) -> DepthTracker {
		DepthTracker::new(self.inner.options.max_depth)
	}

	/// Builds one value.
	pub fn build(&self) -> FactoryResult<T> {
		self.build_with(Record::new())
	}

	/// Builds one value with `overrides` merged over the generated fields.
	///
	/// # Errors
	///
	/// Fails with a configuration error if the generator or any hook is
	/// asynchronous. Errors from the generator or hooks are returned as-is.
	pub fn build_with(&self, overrides: Record) -> FactoryResult<T> {
		self.ensure_sync("build")?;
		self.run(&self.root_tracker(), overrides)
	}

	/// Builds one value, awaiting async generators and hooks.
	pub async fn build_async(&self) -> FactoryResult<T> {
		self.build_async_with(Record::new()).await
	}

	/// Async counterpart of [`build_with`](Self::build_with).
	pub async fn build_async_with(&self, overrides: Record) -> FactoryResult<T> {
		self.run_async(self.root_tracker(), overrides).await
	}

	/// Builds `size` values.
	///
	/// # Errors
	///
	/// Fails with a validation error for negative or fractional sizes.
	pub fn batch(&self, size: impl IntoBatchSize) -> FactoryResult<Vec<T>> {
		self.batch_with(size, BatchOverrides::None)
	}

	/// Builds `size` values with uniform or per-item overrides.
	pub fn batch_with(
		&self,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<T>> {
		let size = size.into_batch_size()?;
		self.ensure_sync("batch")?;
		self.run_batch(&self.root_tracker(), size, &overrides.into())
	}

	/// Async counterpart of [`batch`](Self::batch).
	pub async fn batch_async(&self, size: impl IntoBatchSize) -> FactoryResult<Vec<T>> {
		self.batch_async_with(size, BatchOverrides::None).await
	}

	/// Async counterpart of [`batch_with`](Self::batch_with).
	///
	/// Items are built one after another, so iteration indices follow item
	/// positions.
	pub async fn batch_async_with(
		&self,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<T>> {
		let size = size.into_batch_size()?;
		let overrides = overrides.into();
		self.run_batch_async(&self.root_tracker(), size, &overrides)
			.await
	}

	/// Builds one value inside a build already in flight.
	///
	/// Returns `Ok(None)` when `depth` is at its limit.
	pub fn build_nested(&self, depth: &DepthTracker, overrides: Record) -> FactoryResult<Option<T>> {
		self.ensure_sync("build")?;
		depth.descend(|| self.run(depth, overrides))
	}

	/// Builds `size` values inside a build already in flight.
	///
	/// Returns an empty list when `depth` is at its limit.
	pub fn batch_nested(
		&self,
		depth: &DepthTracker,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<T>> {
		let size = size.into_batch_size()?;
		self.ensure_sync("batch")?;
		let overrides = overrides.into();
		let items = depth.descend(|| self.run_batch(depth, size, &overrides))?;
		Ok(items.unwrap_or_default())
	}

	/// Async counterpart of [`build_nested`](Self::build_nested).
	pub async fn build_nested_async(
		&self,
		depth: &DepthTracker,
		overrides: Record,
	) -> FactoryResult<Option<T>> {
		depth
			.descend_async(|| self.run_async(depth.clone(), overrides))
			.await
	}

	/// Async counterpart of [`batch_nested`](Self::batch_nested).
	pub async fn batch_nested_async(
		&self,
		depth: &DepthTracker,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<T>> {
		let size = size.into_batch_size()?;
		let overrides = overrides.into();
		let items = depth
			.descend_async(|| self.run_batch_async(depth, size, &overrides))
			.await?;
		Ok(items.unwrap_or_default())
	}

	fn context(&self, depth: &DepthTracker, overrides: Record) -> Context {
		let iteration = self.inner.iteration.fetch_add(1, Ordering::SeqCst);
		tracing::trace!(iteration, depth = depth.current(), "building factory item");
		Context::new(
			Arc::new(self.clone()),
			self.inner.provider.clone(),
			iteration,
			overrides,
			depth.clone(),
			self.inner.options.clone(),
		)
	}

	fn hook_context(&self, depth: &DepthTracker) -> HookContext {
		HookContext::new(depth.clone(), self.inner.options.clone())
	}

	fn assemble(generated: Value, overrides: &Record) -> FactoryResult<T> {
		let merged = merge(into_record(generated)?, overrides);
		Ok(serde_json::from_value(Value::Object(merged))?)
	}

	fn run(&self, depth: &DepthTracker, overrides: Record) -> FactoryResult<T> {
		let hook_ctx = self.hook_context(depth);
		let overrides = self.inner.hooks.run_before(overrides, &hook_ctx)?;
		let ctx = self.context(depth, overrides);
		let generated = self.inner.generator.call(&ctx)?;
		let value = Self::assemble(generated, ctx.overrides())?;
		self.inner.hooks.run_after(value, &hook_ctx)
	}

	fn run_batch(
		&self,
		depth: &DepthTracker,
		size: usize,
		overrides: &BatchOverrides,
	) -> FactoryResult<Vec<T>> {
		(0..size)
			.map(|index| self.run(depth, overrides.for_index(index)))
			.collect()
	}

	async fn run_async(&self, depth: DepthTracker, overrides: Record) -> FactoryResult<T> {
		let hook_ctx = self.hook_context(&depth);
		let overrides = self
			.inner
			.hooks
			.run_before_async(overrides, &hook_ctx)
			.await?;
		let ctx = self.context(&depth, overrides.clone());
		let generated = self.inner.generator.call_async(ctx).await?;
		let value = Self::assemble(generated, &overrides)?;
		self.inner.hooks.run_after_async(value, &hook_ctx).await
	}

	async fn run_batch_async(
		&self,
		depth: &DepthTracker,
		size: usize,
		overrides: &BatchOverrides,
	) -> FactoryResult<Vec<T>> {
		let mut items = Vec::new();
		for index in 0..size {
			items.push(
				self.run_async(depth.clone(), overrides.for_index(index))
					.await?,
			);
		}
		Ok(items)
	}
}

impl<T: FactoryOutput> ErasedFactory for Factory<T> {
	fn is_async(&self) -> bool {
		Factory::is_async(self)
	}

	fn build_value(&self, depth: &DepthTracker, overrides: Record) -> FactoryResult<Value> {
		self.ensure_sync("build")?;
		let value = self.run(depth, overrides)?;
		Ok(serde_json::to_value(value)?)
	}

	fn build_value_async(
		&self,
		depth: DepthTracker,
		overrides: Record,
	) -> BoxFuture<'_, FactoryResult<Value>> {
		async move {
			let value = self.run_async(depth, overrides).await?;
			Ok(serde_json::to_value(value)?)
		}
		.boxed()
	}
}

impl<T> fmt::Debug for Factory<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Factory")
			.field("generator", &self.inner.generator)
			.field("options", &self.inner.options)
			.field("iteration", &self.inner.iteration.load(Ordering::SeqCst))
			.field("has_adapter", &self.inner.adapter.is_some())
			.finish_non_exhaustive()
	}
}
