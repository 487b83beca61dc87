//! Persistence through adapters: default vs explicit adapters and failures.

use std::sync::Arc;

use async_trait::async_trait;
use mockforge_core::prelude::*;
use rstest::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
	#[serde(default)]
	id: Option<u64>,
	total: u32,
}

/// Assigns ids the way a database would.
#[derive(Default)]
struct SequenceAdapter {
	stored: MemoryAdapter<Order>,
}

#[async_trait]
impl PersistenceAdapter<Order> for SequenceAdapter {
	async fn create(&self, mut order: Order) -> FactoryResult<Order> {
		order.id = Some(self.stored.len() as u64 + 1);
		self.stored.create(order).await
	}
}

struct Unavailable;

#[async_trait]
impl PersistenceAdapter<Order> for Unavailable {
	async fn create(&self, _order: Order) -> FactoryResult<Order> {
		Err(FactoryError::Persistence("connection refused".into()))
	}
}

#[fixture]
fn orders() -> Factory<Order> {
	Factory::new(|ctx| Ok(json!({ "total": 100 + ctx.iteration() })))
}

#[rstest]
#[tokio::test]
async fn test_create_uses_default_adapter(orders: Factory<Order>) {
	// Arrange
	let adapter = Arc::new(SequenceAdapter::default());
	let orders = orders.with_adapter(Arc::clone(&adapter));

	// Act
	let order = orders.create().await.unwrap();

	// Assert
	assert_eq!(order, Order { id: Some(1), total: 100 });
	assert_eq!(adapter.stored.records(), vec![order]);
}

#[rstest]
#[tokio::test]
async fn test_create_many_with_per_item_overrides(orders: Factory<Order>) {
	// Arrange
	let adapter = Arc::new(SequenceAdapter::default());
	let orders = orders.with_adapter(Arc::clone(&adapter));

	// Act
	let created = orders
		.create_many_with(3, vec![record! { "total": 1 }, record! { "total": 2 }])
		.await
		.unwrap();

	// Assert
	let summary: Vec<_> = created.iter().map(|order| (order.id, order.total)).collect();
	assert_eq!(summary, [(Some(1), 1), (Some(2), 2), (Some(3), 1)]);
	assert_eq!(adapter.stored.len(), 3);
}

#[rstest]
#[tokio::test]
async fn test_explicit_adapter_overrides_default(orders: Factory<Order>) {
	// Arrange
	let default = Arc::new(MemoryAdapter::<Order>::new());
	let explicit = MemoryAdapter::<Order>::new();
	let orders = orders.with_adapter(Arc::clone(&default));

	// Act
	orders
		.create_many_using(&explicit, 2, BatchOverrides::None)
		.await
		.unwrap();

	// Assert
	assert_eq!(explicit.len(), 2);
	assert!(default.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_missing_adapter_is_configuration_error(orders: Factory<Order>) {
	let error = orders.create_many(2).await.unwrap_err();

	assert!(error.is_configuration());
	assert_eq!(orders.iteration(), 0);
}

#[rstest]
#[tokio::test]
async fn test_adapter_failure_reaches_caller(orders: Factory<Order>) {
	let error = orders
		.create_using(&Unavailable, Record::new())
		.await
		.unwrap_err();

	assert_eq!(error.to_string(), "Persistence error: connection refused");
}

#[rstest]
#[tokio::test]
async fn test_invalid_size_is_rejected_before_persisting(orders: Factory<Order>) {
	let adapter = Arc::new(MemoryAdapter::<Order>::new());
	let orders = orders.with_adapter(Arc::clone(&adapter));

	let error = orders.create_many(-3).await.unwrap_err();

	assert!(error.is_validation());
	assert!(adapter.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_create_runs_async_hooks(orders: Factory<Order>) {
	// Arrange
	let adapter = Arc::new(MemoryAdapter::<Order>::new());
	let orders = orders
		.after_build_async(|mut order: Order, _| async move {
			order.total *= 2;
			Ok(order)
		})
		.with_adapter(Arc::clone(&adapter));

	// Act
	let order = orders.create_with(record! { "total": 21 }).await.unwrap();

	// Assert
	assert_eq!(order.total, 42);
	assert_eq!(adapter.records()[0].total, 42);
}

#[rstest]
#[tokio::test]
async fn test_partial_factory_persists_through_inner_adapter(orders: Factory<Order>) {
	// Arrange
	let adapter = Arc::new(SequenceAdapter::default());
	let partial = orders.with_adapter(Arc::clone(&adapter)).partial();

	// Act
	let created = partial.create().await.unwrap();

	// Assert
	assert_eq!(created.get::<u64>("id").unwrap(), Some(1));
	assert_eq!(adapter.stored.len(), 1);
}
