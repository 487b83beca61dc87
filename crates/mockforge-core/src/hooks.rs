//! Pre- and post-build hook pipeline.
//!
//! Before-build hooks transform the override record handed to the generator;
//! after-build hooks transform the finished value. Each hook is tagged sync
//! or async when it is registered, so the synchronous entry points can refuse
//! to run before touching anything.
//!
//! Every hook also receives a [`HookContext`] carrying the depth tracker of
//! the build it runs in. Factories built from a hook through the `*_nested`
//! entry points count towards the same depth limit as the outer build.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::depth::DepthTracker;
use crate::error::{FactoryError, FactoryResult};
use crate::options::FactoryOptions;
use crate::record::Record;

/// State of the build a hook runs in.
///
/// # Examples
///
/// ```
/// use mockforge_core::{Factory, Record};
/// use serde_json::json;
///
/// let tags: Factory = Factory::new(|_| Ok(json!({ "tag": "rust" })));
/// let posts: Factory = Factory::new(|_| Ok(json!({ "title": "Hello" })))
///     .after_build(move |mut post: Record, hook| {
///         let tag = tags.build_nested(hook.depth(), Record::new())?;
///         post.insert("tag".into(), serde_json::to_value(tag)?);
///         Ok(post)
///     });
///
/// assert_eq!(posts.build().unwrap()["tag"]["tag"], "rust");
/// ```
#[derive(Debug, Clone)]
pub struct HookContext {
	depth: DepthTracker,
	options: FactoryOptions,
}

impl HookContext {
	pub(crate) fn new(depth: DepthTracker, options: FactoryOptions) -> Self {
		Self { depth, options }
	}

	/// Depth tracker of the build in flight.
	pub fn depth(&self) -> &DepthTracker {
		&self.depth
	}

	/// Options of the factory running the hook.
	pub fn options(&self) -> &FactoryOptions {
		&self.options
	}
}

/// Synchronous before-build transform.
pub type BeforeFn = Arc<dyn Fn(Record, &HookContext) -> FactoryResult<Record> + Send + Sync>;

/// Asynchronous before-build transform.
pub type AsyncBeforeFn =
	Arc<dyn Fn(Record, HookContext) -> BoxFuture<'static, FactoryResult<Record>> + Send + Sync>;

/// Synchronous after-build transform.
pub type AfterFn<T> = Arc<dyn Fn(T, &HookContext) -> FactoryResult<T> + Send + Sync>;

/// Asynchronous after-build transform.
pub type AsyncAfterFn<T> =
	Arc<dyn Fn(T, HookContext) -> BoxFuture<'static, FactoryResult<T>> + Send + Sync>;

/// A hook together with its sync/async tag.
pub enum Hook<S, A> {
	/// Runs to completion without suspending.
	Sync(S),
	/// Must be awaited.
	Async(A),
}

impl<S: Clone, A: Clone> Clone for Hook<S, A> {
	fn clone(&self) -> Self {
		match self {
			Self::Sync(hook) => Self::Sync(hook.clone()),
			Self::Async(hook) => Self::Async(hook.clone()),
		}
	}
}

impl<S, A> Hook<S, A> {
	/// True for hooks that must be awaited.
	pub fn is_async(&self) -> bool {
		matches!(self, Self::Async(_))
	}
}

/// Tagged before-build hook.
pub type BeforeHook = Hook<BeforeFn, AsyncBeforeFn>;

/// Tagged after-build hook.
pub type AfterHook<T> = Hook<AfterFn<T>, AsyncAfterFn<T>>;

pub(crate) fn sync_before<F>(hook: F) -> BeforeHook
where
	F: Fn(Record, &HookContext) -> FactoryResult<Record> + Send + Sync + 'static,
{
	Hook::Sync(Arc::new(hook))
}

pub(crate) fn sync_after<T, F>(hook: F) -> AfterHook<T>
where
	F: Fn(T, &HookContext) -> FactoryResult<T> + Send + Sync + 'static,
{
	Hook::Sync(Arc::new(hook))
}

/// Wraps an async closure into a boxed before-build hook.
pub(crate) fn async_before<F, Fut>(hook: F) -> BeforeHook
where
	F: Fn(Record, HookContext) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = FactoryResult<Record>> + Send + 'static,
{
	Hook::Async(Arc::new(move |overrides, ctx| hook(overrides, ctx).boxed()))
}

/// Wraps an async closure into a boxed after-build hook.
pub(crate) fn async_after<T, F, Fut>(hook: F) -> AfterHook<T>
where
	F: Fn(T, HookContext) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = FactoryResult<T>> + Send + 'static,
{
	Hook::Async(Arc::new(move |value, ctx| hook(value, ctx).boxed()))
}

/// Ordered before/after hook lists of one factory.
pub struct HookPipeline<T> {
	before: Vec<BeforeHook>,
	after: Vec<AfterHook<T>>,
}

impl<T> Clone for HookPipeline<T> {
	fn clone(&self) -> Self {
		Self {
			before: self.before.clone(),
			after: self.after.clone(),
		}
	}
}

impl<T> Default for HookPipeline<T> {
	fn default() -> Self {
		Self {
			before: Vec::new(),
			after: Vec::new(),
		}
	}
}

impl<T: Send + 'static> HookPipeline<T> {
	/// Creates an empty pipeline.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a before-build hook.
	pub fn push_before(&mut self, hook: BeforeHook) {
		self.before.push(hook);
	}

	/// Appends an after-build hook.
	pub fn push_after(&mut self, hook: AfterHook<T>) {
		self.after.push(hook);
	}

	/// Registered before-build hooks, in execution order.
	pub fn before(&self) -> &[BeforeHook] {
		&self.before
	}

	/// Registered after-build hooks, in execution order.
	pub fn after(&self) -> &[AfterHook<T>] {
		&self.after
	}

	/// Total number of registered hooks.
	pub fn len(&self) -> usize {
		self.before.len() + self.after.len()
	}

	/// True when no hooks are registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// True when any registered hook must be awaited.
	pub fn has_async(&self) -> bool {
		self.before.iter().any(Hook::is_async) || self.after.iter().any(Hook::is_async)
	}

	/// Folds `overrides` through every before-build hook.
	///
	/// Stops at the first failing hook.
	pub fn run_before(&self, overrides: Record, ctx: &HookContext) -> FactoryResult<Record> {
		self.before
			.iter()
			.try_fold(overrides, |overrides, hook| match hook {
				Hook::Sync(hook) => hook(overrides, ctx),
				Hook::Async(_) => Err(FactoryError::requires_async(
					"build",
					"factory has asynchronous before-build hooks",
				)),
			})
	}

	/// Folds `value` through every after-build hook.
	///
	/// Stops at the first failing hook.
	pub fn run_after(&self, value: T, ctx: &HookContext) -> FactoryResult<T> {
		self.after.iter().try_fold(value, |value, hook| match hook {
			Hook::Sync(hook) => hook(value, ctx),
			Hook::Async(_) => Err(FactoryError::requires_async(
				"build",
				"factory has asynchronous after-build hooks",
			)),
		})
	}

	/// Awaits every before-build hook in registration order, sync or async.
	pub async fn run_before_async(
		&self,
		mut overrides: Record,
		ctx: &HookContext,
	) -> FactoryResult<Record> {
		for hook in &self.before {
			overrides = match hook {
				Hook::Sync(hook) => hook(overrides, ctx)?,
				Hook::Async(hook) => hook(overrides, ctx.clone()).await?,
			};
		}
		Ok(overrides)
	}

	/// Awaits every after-build hook in registration order, sync or async.
	pub async fn run_after_async(&self, mut value: T, ctx: &HookContext) -> FactoryResult<T> {
		for hook in &self.after {
			value = match hook {
				Hook::Sync(hook) => hook(value, ctx)?,
				Hook::Async(hook) => hook(value, ctx.clone()).await?,
			};
		}
		Ok(value)
	}

	/// Rebuilds the pipeline for another output type.
	///
	/// Before-build hooks carry over unchanged; after-build hooks are rewrapped
	/// by `adapt`.
	pub(crate) fn map_after<U>(&self, adapt: impl Fn(&AfterHook<T>) -> AfterHook<U>) -> HookPipeline<U> {
		HookPipeline {
			before: self.before.clone(),
			after: self.after.iter().map(adapt).collect(),
		}
	}
}
