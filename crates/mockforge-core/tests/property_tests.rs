//! Property-based tests for the build engine.

use std::collections::BTreeMap;

use mockforge_core::prelude::*;
use mockforge_core::sequence;
use proptest::prelude::*;
use serde_json::{Value, json};

fn to_record(entries: &BTreeMap<String, i64>) -> Record {
	entries
		.iter()
		.map(|(key, value)| (key.clone(), Value::from(*value)))
		.collect()
}

// ============================================================================
// Property-Based Tests: override merge
// ============================================================================

proptest! {
	/// Test: merge law
	///
	/// Category: Property
	/// Every override key takes the override value; every other generated key
	/// keeps its generated value; no other keys appear.
	#[test]
	fn prop_merge_law(
		generated in prop::collection::btree_map("[a-f]", any::<i64>(), 0..6),
		overrides in prop::collection::btree_map("[a-f]", any::<i64>(), 0..6),
	) {
		let merged = merge(to_record(&generated), &to_record(&overrides));

		for (key, value) in &merged {
			let expected = overrides.get(key).or_else(|| generated.get(key));
			prop_assert_eq!(value.as_i64(), expected.copied());
		}
		let expected_len = generated
			.keys()
			.chain(overrides.keys())
			.collect::<std::collections::BTreeSet<_>>()
			.len();
		prop_assert_eq!(merged.len(), expected_len);
	}

	/// Test: build applies the merge law
	///
	/// Category: Property
	/// Building with overrides equals merging the overrides over the
	/// generator's output.
	#[test]
	fn prop_build_matches_merge(
		overrides in prop::collection::btree_map("[a-f]", any::<i64>(), 0..6),
	) {
		let factory: Factory = Factory::new(|_| Ok(json!({ "a": 1, "b": 2, "z": "fixed" })));
		let expected = merge(factory.build().unwrap(), &to_record(&overrides));

		let built = factory.build_with(to_record(&overrides)).unwrap();

		prop_assert_eq!(built, expected);
	}
}

// ============================================================================
// Property-Based Tests: batches
// ============================================================================

proptest! {
	/// Test: batch length
	///
	/// Category: Property
	/// A batch of size n has n items with iteration indices 0..n.
	#[test]
	fn prop_batch_length(size in 0usize..40) {
		let factory: Factory = Factory::new(|ctx| Ok(json!({ "i": ctx.iteration() })));

		let items = factory.batch(size).unwrap();

		prop_assert_eq!(items.len(), size);
		for (index, item) in items.iter().enumerate() {
			prop_assert_eq!(item["i"].as_u64(), Some(index as u64));
		}
	}

	/// Test: negative sizes
	///
	/// Category: Property
	/// Every negative size is a validation error.
	#[test]
	fn prop_negative_size_rejected(size in i64::MIN..0) {
		let factory: Factory = Factory::new(|_| Ok(json!({})));

		prop_assert!(factory.batch(size).unwrap_err().is_validation());
	}
}

// ============================================================================
// Property-Based Tests: sequences
// ============================================================================

proptest! {
	/// Test: iterate periodicity
	///
	/// Category: Property
	/// The n-th emission equals values[n mod len].
	#[test]
	fn prop_iterate_periodic(values in prop::collection::vec(any::<i32>(), 1..8)) {
		let emitted: Vec<_> = sequence::iterate(values.clone()).unwrap().take(values.len() * 3).collect();

		for (index, value) in emitted.iter().enumerate() {
			prop_assert_eq!(*value, values[index % values.len()]);
		}
	}

	/// Test: sample non-repetition
	///
	/// Category: Property
	/// With at least two distinct values, consecutive emissions differ, and
	/// every emission comes from the source.
	#[test]
	fn prop_sample_never_repeats(
		values in prop::collection::btree_set(any::<u16>(), 2..8),
		seed in any::<u64>(),
	) {
		let values: Vec<u16> = values.into_iter().collect();
		let provider = Provider::seeded(seed);

		let emitted: Vec<_> = sequence::sample(values.clone(), &provider).unwrap().take(50).collect();

		for pair in emitted.windows(2) {
			prop_assert_ne!(pair[0], pair[1]);
		}
		prop_assert!(emitted.iter().all(|value| values.contains(value)));
	}
}

// ============================================================================
// Property-Based Tests: derivation
// ============================================================================

proptest! {
	/// Test: extend hook policy
	///
	/// Category: Property
	/// However many hooks the parent has, an extended factory starts with
	/// none and its output is untouched by them.
	#[test]
	fn prop_extend_drops_parent_hooks(before in 0usize..4, after in 0usize..4) {
		let mut parent: Factory = Factory::new(|_| Ok(json!({ "base": true })));
		for _ in 0..before {
			parent = parent.before_build(|mut overrides: Record, _| {
				overrides.insert("from_before".into(), true.into());
				Ok(overrides)
			});
		}
		for _ in 0..after {
			parent = parent.after_build(|mut value: Record, _| {
				value.insert("from_after".into(), true.into());
				Ok(value)
			});
		}

		let child: Factory = parent.extend(|_, _| Ok(json!({ "child": true })));
		let value = child.build().unwrap();

		prop_assert_eq!(parent.hooks().len(), before + after);
		prop_assert!(child.hooks().is_empty());
		prop_assert_eq!(Value::Object(value), json!({ "base": true, "child": true }));
	}
}
