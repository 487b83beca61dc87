//! Build-then-persist entry points.
//!
//! `create*` builds through the async pipeline and hands the result to a
//! [`PersistenceAdapter`]. An adapter passed to the call wins over the
//! factory's default adapter.

use crate::adapter::PersistenceAdapter;
use crate::error::{FactoryError, FactoryResult};
use crate::factory::{BatchOverrides, Factory, FactoryOutput, IntoBatchSize};
use crate::record::Record;

const NO_ADAPTER: &str =
	"no persistence adapter configured; pass one to create_using() or register a default with with_adapter()";

impl<T: FactoryOutput> Factory<T> {
	fn resolve_adapter<'a>(
		&'a self,
		explicit: Option<&'a dyn PersistenceAdapter<T>>,
	) -> FactoryResult<&'a dyn PersistenceAdapter<T>> {
		explicit
			.or(self.inner.adapter.as_deref())
			.ok_or_else(|| FactoryError::Configuration(NO_ADAPTER.to_string()))
	}

	/// Builds one value and persists it with the default adapter.
	pub async fn create(&self) -> FactoryResult<T> {
		self.create_with(Record::new()).await
	}

	/// Builds one value with overrides and persists it with the default
	/// adapter.
	///
	/// # Errors
	///
	/// Fails with a configuration error when no default adapter is
	/// registered. Nothing is built in that case.
	pub async fn create_with(&self, overrides: Record) -> FactoryResult<T> {
		self.persist_one(None, overrides).await
	}

	/// Builds one value and persists it with `adapter`.
	pub async fn create_using(
		&self,
		adapter: &dyn PersistenceAdapter<T>,
		overrides: Record,
	) -> FactoryResult<T> {
		self.persist_one(Some(adapter), overrides).await
	}

	/// Builds `size` values and persists them with the default adapter.
	pub async fn create_many(&self, size: impl IntoBatchSize) -> FactoryResult<Vec<T>> {
		self.create_many_with(size, BatchOverrides::None).await
	}

	/// Builds `size` values with overrides and persists them with the default
	/// adapter.
	pub async fn create_many_with(
		&self,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<T>> {
		self.persist_many(None, size.into_batch_size()?, overrides.into())
			.await
	}

	/// Builds `size` values and persists them with `adapter`.
	pub async fn create_many_using(
		&self,
		adapter: &dyn PersistenceAdapter<T>,
		size: impl IntoBatchSize,
		overrides: impl Into<BatchOverrides>,
	) -> FactoryResult<Vec<T>> {
		self.persist_many(Some(adapter), size.into_batch_size()?, overrides.into())
			.await
	}

	async fn persist_one(
		&self,
		explicit: Option<&dyn PersistenceAdapter<T>>,
		overrides: Record,
	) -> FactoryResult<T> {
		let adapter = self.resolve_adapter(explicit)?;
		let value = self.build_async_with(overrides).await?;
		tracing::debug!(explicit = explicit.is_some(), "persisting built value");
		adapter.create(value).await
	}

	async fn persist_many(
		&self,
		explicit: Option<&dyn PersistenceAdapter<T>>,
		size: usize,
		overrides: BatchOverrides,
	) -> FactoryResult<Vec<T>> {
		let adapter = self.resolve_adapter(explicit)?;
		let values = self.batch_async_with(size, overrides).await?;
		tracing::debug!(
			count = values.len(),
			explicit = explicit.is_some(),
			"persisting built values"
		);
		adapter.create_many(values).await
	}
}
