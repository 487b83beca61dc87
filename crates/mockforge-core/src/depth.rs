//! Per-build depth tracking for self-referential factory graphs.
//!
//! Every root `build`/`batch` call (sync or async) creates a fresh
//! [`DepthTracker`] and threads it through the [`Context`](crate::Context)
//! handed to generator functions, and through the
//! [`HookContext`](crate::HookContext) handed to hooks. Nested builds started
//! from inside a generator or hook share that tracker and go one level deeper
//! for as long as they run.
//!
//! ## Truncation
//!
//! - With `max_depth = Some(k)`, a nested call made while the tracker sits at
//!   `k` does not recurse. It yields the truncation sentinel instead (`None`
//!   for single builds, an empty list for batches). This is not an error.
//! - With no configured limit, entering past [`MAX_UNBOUNDED_DEPTH`] fails
//!   with [`FactoryError::CircularReference`] rather than overflowing the
//!   stack.
//! - Levels are released by an RAII [`DepthGuard`], so early returns and
//!   errors restore the counter.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{FactoryError, FactoryResult};

/// Ceiling for nested builds when no `max_depth` is configured.
pub const MAX_UNBOUNDED_DEPTH: usize = 100;

/// Depth counter shared by every nested build of one root call.
///
/// Cloning yields another handle to the same counter.
#[derive(Debug, Clone)]
pub struct DepthTracker {
	current: Arc<AtomicUsize>,
	max_depth: Option<usize>,
}

impl DepthTracker {
	/// Creates a tracker at depth 0.
	pub fn new(max_depth: Option<usize>) -> Self {
		Self {
			current: Arc::new(AtomicUsize::new(0)),
			max_depth,
		}
	}

	/// Current nesting level; 0 at the root.
	pub fn current(&self) -> usize {
		self.current.load(Ordering::SeqCst)
	}

	/// Configured limit, if any.
	pub fn max_depth(&self) -> Option<usize> {
		self.max_depth
	}

	/// True when nested calls must return the truncation sentinel.
	pub fn at_limit(&self) -> bool {
		self.max_depth
			.is_some_and(|max_depth| self.current() >= max_depth)
	}

	/// Goes one level deeper until the returned guard is dropped.
	///
	/// # Errors
	///
	/// Returns [`FactoryError::CircularReference`] when no `max_depth` is set
	/// and the new depth would exceed [`MAX_UNBOUNDED_DEPTH`].
	pub fn enter(&self) -> FactoryResult<DepthGuard> {
		let depth = self.current.fetch_add(1, Ordering::SeqCst) + 1;
		if self.max_depth.is_none() && depth > MAX_UNBOUNDED_DEPTH {
			self.current.fetch_sub(1, Ordering::SeqCst);
			return Err(FactoryError::CircularReference {
				depth,
				limit: MAX_UNBOUNDED_DEPTH,
			});
		}
		Ok(DepthGuard {
			current: Arc::clone(&self.current),
			depth,
		})
	}

	/// Runs `nested` one level deeper, or returns `Ok(None)` at the limit.
	pub fn descend<R>(&self, nested: impl FnOnce() -> FactoryResult<R>) -> FactoryResult<Option<R>> {
		if self.at_limit() {
			self.log_truncation();
			return Ok(None);
		}
		let _guard = self.enter()?;
		nested().map(Some)
	}

	/// Async counterpart of [`descend`](Self::descend).
	pub async fn descend_async<R, F, Fut>(&self, nested: F) -> FactoryResult<Option<R>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = FactoryResult<R>>,
	{
		if self.at_limit() {
			self.log_truncation();
			return Ok(None);
		}
		let _guard = self.enter()?;
		nested().await.map(Some)
	}

	fn log_truncation(&self) {
		tracing::debug!(
			depth = self.current(),
			max_depth = ?self.max_depth,
			"depth limit reached, truncating nested build"
		);
	}
}

/// RAII guard for one nesting level.
#[derive(Debug)]
pub struct DepthGuard {
	current: Arc<AtomicUsize>,
	depth: usize,
}

impl DepthGuard {
	/// Depth reached when this guard was created.
	pub fn depth(&self) -> usize {
		self.depth
	}
}

impl Drop for DepthGuard {
	fn drop(&mut self) {
		self.current.fetch_sub(1, Ordering::SeqCst);
	}
}
