//! Batch tests: size validation, per-item overrides and iteration order.

use mockforge_core::prelude::*;
use rstest::*;
use serde_json::{Value, json};

#[fixture]
fn numbered() -> Factory {
	Factory::new(|ctx| Ok(json!({ "n": ctx.iteration(), "kind": "plain" })))
}

fn field(items: &[Record], key: &str) -> Vec<Value> {
	items.iter().map(|item| item[key].clone()).collect()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
fn test_batch_has_requested_length(numbered: Factory, #[case] size: usize) {
	let items = numbered.batch(size).unwrap();

	assert_eq!(items.len(), size);
}

#[rstest]
fn test_batch_items_receive_consecutive_iterations(numbered: Factory) {
	let items = numbered.batch(3).unwrap();

	assert_eq!(field(&items, "n"), [json!(0), json!(1), json!(2)]);
}

#[rstest]
fn test_uniform_overrides_apply_to_every_item(numbered: Factory) {
	let items = numbered.batch_with(3, record! { "kind": "special" }).unwrap();

	assert!(items.iter().all(|item| item["kind"] == "special"));
}

#[rstest]
fn test_per_item_overrides_cycle(numbered: Factory) {
	// Arrange
	let overrides = vec![record! { "kind": "a" }, record! { "kind": "b" }];

	// Act
	let items = numbered.batch_with(5, overrides).unwrap();

	// Assert
	assert_eq!(
		field(&items, "kind"),
		[json!("a"), json!("b"), json!("a"), json!("b"), json!("a")]
	);
}

#[rstest]
fn test_overrides_from_json_array(numbered: Factory) {
	let overrides = BatchOverrides::try_from(json!([{ "kind": "x" }, {}])).unwrap();

	let items = numbered.batch_with(2, overrides).unwrap();

	assert_eq!(field(&items, "kind"), [json!("x"), json!("plain")]);
}

#[rstest]
#[case::negative(-1.0)]
#[case::fractional(1.5)]
fn test_invalid_size_rejected_by_sync_batch(numbered: Factory, #[case] size: f64) {
	let error = numbered.batch(size).unwrap_err();

	assert!(error.is_validation());
	assert_eq!(numbered.iteration(), 0);
}

#[rstest]
#[case::negative(-1.0)]
#[case::fractional(1.5)]
#[tokio::test]
async fn test_invalid_size_rejected_by_async_batch(numbered: Factory, #[case] size: f64) {
	let error = numbered.batch_async(size).await.unwrap_err();

	assert!(error.is_validation());
}

#[rstest]
fn test_negative_integer_size_rejected(numbered: Factory) {
	let error = numbered.batch(-1_i32).unwrap_err();

	assert_eq!(
		error.to_string(),
		"Validation error: size: batch size must be a non-negative integer, got -1"
	);
}

#[rstest]
fn test_failing_item_aborts_batch() {
	// Arrange
	let flaky: Factory = Factory::new(|ctx| {
		if ctx.iteration() == 2 {
			return Err(FactoryError::custom("item 2 failed"));
		}
		Ok(json!({ "n": ctx.iteration() }))
	});

	// Act
	let error = flaky.batch(5).unwrap_err();

	// Assert
	assert_eq!(error.to_string(), "item 2 failed");
	assert_eq!(flaky.iteration(), 3);
}

#[rstest]
#[tokio::test]
async fn test_async_batch_is_sequential() {
	// Arrange
	let slow: Factory = Factory::new_async(|ctx: Context| async move {
		// Later items finish sooner; order must still follow the iteration.
		let wait = 30 - ctx.iteration() * 10;
		tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
		Ok(json!({ "n": ctx.iteration() }))
	});

	// Act
	let items = slow
		.batch_async_with(3, vec![record! { "tag": "first" }])
		.await
		.unwrap();

	// Assert
	assert_eq!(field(&items, "n"), [json!(0), json!(1), json!(2)]);
	assert!(items.iter().all(|item| item["tag"] == "first"));
}

#[rstest]
fn test_sync_batch_of_async_factory_is_configuration_error() {
	let slow: Factory = Factory::new_async(|_| async { Ok(json!({})) });

	let error = slow.batch(2).unwrap_err();

	assert!(error.to_string().contains("use batch_async() instead of batch()"));
}

#[rstest]
#[tokio::test]
async fn test_oversized_async_batch_stops_at_first_error() {
	// Arrange
	let limited: Factory = Factory::new(|ctx| {
		if ctx.iteration() == 2 {
			return Err(FactoryError::custom("stop"));
		}
		Ok(json!({ "n": ctx.iteration() }))
	});

	// Act
	let error = limited.batch_async(usize::MAX).await.unwrap_err();

	// Assert
	assert_eq!(error.to_string(), "stop");
	assert_eq!(limited.iteration(), 3);
}

#[rstest]
#[tokio::test]
async fn test_oversized_nested_async_batch_stops_at_first_error() {
	// Arrange
	let tree: Factory = Factory::new_async(|ctx: Context| async move {
		if ctx.depth().current() > 0 {
			return Err(FactoryError::custom("nested stop"));
		}
		let children = ctx.batch_async(usize::MAX).await?;
		Ok::<_, FactoryError>(json!({ "children": children }))
	});

	// Act
	let error = tree.build_async().await.unwrap_err();

	// Assert
	assert_eq!(error.to_string(), "nested stop");
}
