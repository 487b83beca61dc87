//! Persistence adapter interface.
//!
//! Adapters take built values and store them somewhere (a database, an HTTP
//! API, a fixture file). The engine only calls them; concrete storage lives
//! outside this crate, except for [`MemoryAdapter`].

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::FactoryResult;

/// Stores values produced by a factory.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use mockforge_core::{FactoryResult, PersistenceAdapter, Record};
///
/// struct Stamping;
///
/// #[async_trait]
/// impl PersistenceAdapter<Record> for Stamping {
///     async fn create(&self, mut value: Record) -> FactoryResult<Record> {
///         value.insert("persisted".into(), true.into());
///         Ok(value)
///     }
/// }
/// ```
#[async_trait]
pub trait PersistenceAdapter<T>: Send + Sync {
	/// Persists a single value.
	///
	/// # Arguments
	///
	/// * `value` - The built value to store
	///
	/// # Returns
	///
	/// Returns the value as stored, which may carry fields assigned by the
	/// backend (primary keys, timestamps).
	async fn create(&self, value: T) -> FactoryResult<T>;

	/// Persists several values.
	///
	/// The default implementation creates values sequentially.
	/// Override this for bulk inserts.
	async fn create_many(&self, values: Vec<T>) -> FactoryResult<Vec<T>>
	where
		T: Send + 'static,
	{
		let mut created = Vec::with_capacity(values.len());
		for value in values {
			created.push(self.create(value).await?);
		}
		Ok(created)
	}
}

/// Adapter that keeps persisted values in memory.
#[derive(Debug)]
pub struct MemoryAdapter<T> {
	records: Mutex<Vec<T>>,
}

impl<T> Default for MemoryAdapter<T> {
	fn default() -> Self {
		Self {
			records: Mutex::new(Vec::new()),
		}
	}
}

impl<T: Clone> MemoryAdapter<T> {
	/// Creates an empty adapter.
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of everything persisted so far, in insertion order.
	pub fn records(&self) -> Vec<T> {
		self.records.lock().clone()
	}

	/// Number of persisted values.
	pub fn len(&self) -> usize {
		self.records.lock().len()
	}

	/// True when nothing has been persisted.
	pub fn is_empty(&self) -> bool {
		self.records.lock().is_empty()
	}

	/// Forgets every persisted value.
	pub fn clear(&self) {
		self.records.lock().clear();
	}
}

#[async_trait]
impl<T> PersistenceAdapter<T> for MemoryAdapter<T>
where
	T: Clone + Send + 'static,
{
	async fn create(&self, value: T) -> FactoryResult<T> {
		self.records.lock().push(value.clone());
		Ok(value)
	}

	async fn create_many(&self, values: Vec<T>) -> FactoryResult<Vec<T>> {
		self.records.lock().extend(values.iter().cloned());
		Ok(values)
	}
}

#[async_trait]
impl<T, A> PersistenceAdapter<T> for std::sync::Arc<A>
where
	T: Send + 'static,
	A: PersistenceAdapter<T> + ?Sized,
{
	async fn create(&self, value: T) -> FactoryResult<T> {
		(**self).create(value).await
	}

	async fn create_many(&self, values: Vec<T>) -> FactoryResult<Vec<T>> {
		(**self).create_many(values).await
	}
}
