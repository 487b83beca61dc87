//! Factories derived from a parent factory.
//!
//! - [`Factory::extend`] layers a child generator over the parent's output.
//! - [`Factory::compose`] merges static values and other factories' output
//!   over the parent's output.
//! - [`Factory::partial`] keeps the parent as-is but produces [`Partial<T>`],
//!   where any key may be absent or null.
//!
//! Derived factories inherit the parent's options and provider. `extend` and
//! `compose` start with empty hook lists and no default adapter: their output
//! type is new, so the parent's hooks and adapter do not apply to it.
//! `partial` keeps every hook and the adapter, adapted through
//! [`Partial::complete`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::adapter::PersistenceAdapter;
use crate::context::Context;
use crate::depth::DepthTracker;
use crate::error::{FactoryError, FactoryResult};
use crate::factory::{ErasedFactory, Factory, FactoryInner, FactoryOutput};
use crate::generator::Generator;
use crate::hooks::{self, AfterHook, Hook, HookContext, HookPipeline};
use crate::record::{Record, into_record, merge};

impl<T: FactoryOutput> Factory<T> {
	fn derive<U: FactoryOutput>(&self, generator: Generator) -> Factory<U> {
		Factory::from_parts(
			generator,
			self.inner.options.clone(),
			self.inner.provider.clone(),
		)
	}

	/// Derives a factory whose generator adds or replaces keys of this
	/// factory's generated record.
	///
	/// `child` receives the context and the parent's generated record (before
	/// overrides); its output is shallow-merged over the parent's. The derived
	/// factory is asynchronous when this one's generator is.
	///
	/// # Examples
	///
	/// ```
	/// use mockforge_core::{Factory, record};
	/// use serde_json::json;
	///
	/// let users: Factory = Factory::new(|ctx| Ok(json!({ "id": ctx.iteration() + 1 })));
	/// let admins: Factory = users.extend(|_, _| Ok(json!({ "role": "admin" })));
	///
	/// let admin = admins.build_with(record! { "id": 99 }).unwrap();
	/// assert_eq!(admin["id"], 99);
	/// assert_eq!(admin["role"], "admin");
	/// ```
	pub fn extend<U, F, S>(&self, child: F) -> Factory<U>
	where
		U: FactoryOutput,
		F: Fn(&Context, &Record) -> FactoryResult<S> + Send + Sync + 'static,
		S: Serialize,
	{
		let child = Arc::new(child);
		let generator = match self.inner.generator.clone() {
			Generator::Sync(parent) => Generator::from_fn(move |ctx| {
				let base = into_record(parent(ctx)?)?;
				let extra = into_record(serde_json::to_value(child(ctx, &base)?)?)?;
				Ok(merge(base, &extra))
			}),
			parent @ Generator::Async(_) => Generator::from_async_fn(move |ctx: Context| {
				let parent = parent.clone();
				let child = Arc::clone(&child);
				async move {
					let base = into_record(parent.call_async(ctx.clone()).await?)?;
					let extra = into_record(serde_json::to_value(child(&ctx, &base)?)?)?;
					Ok::<_, FactoryError>(merge(base, &extra))
				}
			}),
		};
		self.derive(generator)
	}

	/// Like [`extend`](Self::extend), with an asynchronous child generator.
	pub fn extend_async<U, F, Fut, S>(&self, child: F) -> Factory<U>
	where
		U: FactoryOutput,
		F: Fn(Context, Record) -> Fut + Send + Sync + 'static,
		Fut: std::future::Future<Output = FactoryResult<S>> + Send + 'static,
		S: Serialize,
	{
		let parent = self.inner.generator.clone();
		let child = Arc::new(child);
		self.derive(Generator::from_async_fn(move |ctx: Context| {
			let parent = parent.clone();
			let child = Arc::clone(&child);
			async move {
				let base = into_record(parent.call_async(ctx.clone()).await?)?;
				let extra = into_record(serde_json::to_value(child(ctx, base.clone()).await?)?)?;
				Ok::<_, FactoryError>(merge(base, &extra))
			}
		}))
	}

	/// Derives a factory that merges `shape` over this factory's generated
	/// record.
	///
	/// Static entries are copied as-is; factory entries are built on every
	/// build, one level deeper than the composing build. At the depth limit
	/// they yield `null` (single builds) or `[]` (batches).
	///
	/// # Examples
	///
	/// ```
	/// use mockforge_core::{Factory, Shape};
	/// use serde_json::json;
	///
	/// let users: Factory = Factory::new(|_| Ok(json!({ "name": "Ada" })));
	/// let active: Factory = users.compose(Shape::new().value("status", "active"));
	///
	/// assert_eq!(active.build().unwrap()["status"], "active");
	/// ```
	pub fn compose<U>(&self, shape: impl Into<Shape>) -> Factory<U>
	where
		U: FactoryOutput,
	{
		let shape = Arc::new(shape.into());
		let parent = self.inner.generator.clone();
		let generator = if parent.is_async() || shape.is_async() {
			Generator::from_async_fn(move |ctx: Context| {
				let parent = parent.clone();
				let shape = Arc::clone(&shape);
				async move {
					let base = into_record(parent.call_async(ctx.clone()).await?)?;
					let extra = shape.evaluate_async(ctx.depth()).await?;
					Ok::<_, FactoryError>(merge(base, &extra))
				}
			})
		} else {
			Generator::from_fn(move |ctx| {
				let base = into_record(parent.call(ctx)?)?;
				let extra = shape.evaluate(ctx.depth())?;
				Ok(merge(base, &extra))
			})
		};
		self.derive(generator)
	}

	/// Derives a factory producing [`Partial<T>`].
	///
	/// The generator, options, provider and before-build hooks are kept.
	/// After-build hooks and the default adapter still operate on `T`: the
	/// partial value is completed into a `T`, handed over, and converted back.
	pub fn partial(&self) -> Factory<Partial<T>> {
		let hooks: HookPipeline<Partial<T>> = self.inner.hooks.map_after(partial_hook);
		let adapter = self.inner.adapter.clone().map(|inner| {
			Arc::new(PartialAdapter { inner }) as Arc<dyn PersistenceAdapter<Partial<T>>>
		});
		Factory::from_inner(FactoryInner {
			generator: self.inner.generator.clone(),
			options: self.inner.options.clone(),
			provider: self.inner.provider.clone(),
			hooks,
			adapter,
			iteration: Arc::new(AtomicU64::new(0)),
		})
	}
}

fn partial_hook<T: FactoryOutput>(hook: &AfterHook<T>) -> AfterHook<Partial<T>> {
	match hook {
		Hook::Sync(hook) => {
			let hook = Arc::clone(hook);
			hooks::sync_after(move |partial: Partial<T>, ctx: &HookContext| {
				Partial::from_output(&hook(partial.complete()?, ctx)?)
			})
		}
		Hook::Async(hook) => {
			let hook = Arc::clone(hook);
			hooks::async_after(move |partial: Partial<T>, ctx: HookContext| {
				let hook = Arc::clone(&hook);
				async move { Partial::from_output(&hook(partial.complete()?, ctx).await?) }
			})
		}
	}
}

struct PartialAdapter<T> {
	inner: Arc<dyn PersistenceAdapter<T>>,
}

#[async_trait]
impl<T: FactoryOutput> PersistenceAdapter<Partial<T>> for PartialAdapter<T> {
	async fn create(&self, value: Partial<T>) -> FactoryResult<Partial<T>> {
		let created = self.inner.create(value.complete()?).await?;
		Partial::from_output(&created)
	}

	async fn create_many(&self, values: Vec<Partial<T>>) -> FactoryResult<Vec<Partial<T>>> {
		let values = values
			.into_iter()
			.map(|value| value.complete())
			.collect::<FactoryResult<Vec<_>>>()?;
		self.inner
			.create_many(values)
			.await?
			.iter()
			.map(Partial::from_output)
			.collect()
	}
}

enum ShapeEntry {
	Value(Value),
	Build(Arc<dyn ErasedFactory>),
	Batch(Arc<dyn ErasedFactory>, usize),
}

/// Keys merged over a parent factory's output by [`Factory::compose`].
///
/// Entries are applied in insertion order; a later entry for the same key
/// replaces an earlier one.
#[derive(Default)]
pub struct Shape {
	entries: Vec<(String, ShapeEntry)>,
}

impl Shape {
	/// Creates an empty shape.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a static value.
	pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.entries.push((key.into(), ShapeEntry::Value(value.into())));
		self
	}

	/// Adds a value built by `factory` on every build.
	pub fn build<U: FactoryOutput>(mut self, key: impl Into<String>, factory: &Factory<U>) -> Self {
		self.entries
			.push((key.into(), ShapeEntry::Build(Arc::new(factory.clone()))));
		self
	}

	/// Adds a list of `size` values built by `factory` on every build.
	pub fn batch<U: FactoryOutput>(
		mut self,
		key: impl Into<String>,
		factory: &Factory<U>,
		size: usize,
	) -> Self {
		self.entries
			.push((key.into(), ShapeEntry::Batch(Arc::new(factory.clone()), size)));
		self
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// True when the shape has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn is_async(&self) -> bool {
		self.entries.iter().any(|(_, entry)| match entry {
			ShapeEntry::Value(_) => false,
			ShapeEntry::Build(factory) | ShapeEntry::Batch(factory, _) => factory.is_async(),
		})
	}

	fn evaluate(&self, depth: &DepthTracker) -> FactoryResult<Record> {
		let mut record = Record::new();
		for (key, entry) in &self.entries {
			let value = match entry {
				ShapeEntry::Value(value) => value.clone(),
				ShapeEntry::Build(factory) => depth
					.descend(|| factory.build_value(depth, Record::new()))?
					.unwrap_or(Value::Null),
				ShapeEntry::Batch(factory, size) => {
					let items = depth.descend(|| {
						(0..*size)
							.map(|_| factory.build_value(depth, Record::new()))
							.collect::<FactoryResult<Vec<_>>>()
					})?;
					Value::Array(items.unwrap_or_default())
				}
			};
			record.insert(key.clone(), value);
		}
		Ok(record)
	}

	async fn evaluate_async(&self, depth: &DepthTracker) -> FactoryResult<Record> {
		let mut record = Record::new();
		for (key, entry) in &self.entries {
			let value = match entry {
				ShapeEntry::Value(value) => value.clone(),
				ShapeEntry::Build(factory) => depth
					.descend_async(|| factory.build_value_async(depth.clone(), Record::new()))
					.await?
					.unwrap_or(Value::Null),
				ShapeEntry::Batch(factory, size) => {
					let items = depth
						.descend_async(|| async move {
							let mut items = Vec::new();
							for _ in 0..*size {
								items.push(
									factory
										.build_value_async(depth.clone(), Record::new())
										.await?,
								);
							}
							Ok::<_, FactoryError>(items)
						})
						.await?;
					Value::Array(items.unwrap_or_default())
				}
			};
			record.insert(key.clone(), value);
		}
		Ok(record)
	}
}

impl From<Record> for Shape {
	fn from(record: Record) -> Self {
		record
			.into_iter()
			.fold(Self::new(), |shape, (key, value)| shape.value(key, value))
	}
}

impl fmt::Debug for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.entries.iter().map(|(key, entry)| {
				let kind = match entry {
					ShapeEntry::Value(_) => "value",
					ShapeEntry::Build(_) => "build",
					ShapeEntry::Batch(..) => "batch",
				};
				(key, kind)
			}))
			.finish()
	}
}

/// Output of a [`partial`](Factory::partial) factory.
///
/// Holds the generated fields as a [`Record`] so that any key of `T` may be
/// missing or `null`.
pub struct Partial<T> {
	fields: Record,
	marker: PhantomData<fn() -> T>,
}

impl<T> Partial<T> {
	/// Wraps already-generated fields.
	pub fn new(fields: Record) -> Self {
		Self {
			fields,
			marker: PhantomData,
		}
	}

	/// Reads a field, treating absent and `null` alike.
	///
	/// # Errors
	///
	/// Returns [`FactoryError::Json`](crate::FactoryError::Json) when the
	/// field exists but does not fit `V`.
	pub fn get<V: DeserializeOwned>(&self, key: &str) -> FactoryResult<Option<V>> {
		match self.fields.get(key) {
			None | Some(Value::Null) => Ok(None),
			Some(value) => Ok(Some(V::deserialize(value)?)),
		}
	}

	/// True when `key` exists, even if it is `null`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.fields.contains_key(key)
	}

	/// True when `key` exists and is not `null`.
	pub fn is_present(&self, key: &str) -> bool {
		self.fields.get(key).is_some_and(|value| !value.is_null())
	}

	/// The raw fields.
	pub fn fields(&self) -> &Record {
		&self.fields
	}

	/// Unwraps the raw fields.
	pub fn into_record(self) -> Record {
		self.fields
	}
}

impl<T: Serialize> Partial<T> {
	/// Captures every field of a complete value.
	pub fn from_output(value: &T) -> FactoryResult<Self> {
		Ok(Self::new(into_record(serde_json::to_value(value)?)?))
	}
}

impl<T: DeserializeOwned> Partial<T> {
	/// Converts back into `T`.
	///
	/// # Errors
	///
	/// Returns [`FactoryError::Json`](crate::FactoryError::Json) when a field
	/// `T` requires is missing or has the wrong type.
	pub fn complete(&self) -> FactoryResult<T> {
		Ok(T::deserialize(&Value::Object(self.fields.clone()))?)
	}
}

impl<T> Clone for Partial<T> {
	fn clone(&self) -> Self {
		Self::new(self.fields.clone())
	}
}

impl<T> PartialEq for Partial<T> {
	fn eq(&self, other: &Self) -> bool {
		self.fields == other.fields
	}
}

impl<T> fmt::Debug for Partial<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Partial").field(&self.fields).finish()
	}
}

impl<T> From<Record> for Partial<T> {
	fn from(fields: Record) -> Self {
		Self::new(fields)
	}
}

impl<T> Serialize for Partial<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.fields.serialize(serializer)
	}
}

impl<'de, T> Deserialize<'de> for Partial<T> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Record::deserialize(deserializer).map(Self::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record;
	use rstest::rstest;
	use serde_json::json;

	#[derive(Debug, Serialize, Deserialize, PartialEq)]
	struct User {
		id: u64,
		name: String,
	}

	#[rstest]
	fn test_partial_get_treats_null_as_absent() {
		let partial = Partial::<User>::new(record! { "id": 1, "name": null });

		assert_eq!(partial.get::<u64>("id").unwrap(), Some(1));
		assert_eq!(partial.get::<String>("name").unwrap(), None);
		assert!(partial.contains_key("name"));
		assert!(!partial.is_present("name"));
		assert!(!partial.contains_key("email"));
	}

	#[rstest]
	fn test_partial_complete_requires_every_field() {
		let partial = Partial::<User>::new(record! { "id": 1 });

		assert!(partial.complete().is_err());
	}

	#[rstest]
	fn test_partial_round_trips_through_output() {
		let user = User {
			id: 3,
			name: "Ada".into(),
		};

		let partial = Partial::from_output(&user).unwrap();

		assert_eq!(partial.complete().unwrap(), user);
	}

	#[rstest]
	fn test_shape_from_record_keeps_static_values() {
		// Arrange
		let base: Factory = Factory::new(|_| Ok(json!({ "a": 1, "b": 2 })));

		// Act
		let composed: Factory = base.compose(record! { "b": 20, "c": 30 });

		// Assert
		assert_eq!(
			Value::Object(composed.build().unwrap()),
			json!({ "a": 1, "b": 20, "c": 30 })
		);
	}

	#[rstest]
	fn test_shape_debug_lists_entry_kinds() {
		let other: Factory = Factory::new(|_| Ok(json!({})));

		let shape = Shape::new().value("a", 1).build("b", &other).batch("c", &other, 2);

		assert_eq!(
			format!("{:?}", shape),
			r#"[("a", "value"), ("b", "build"), ("c", "batch")]"#
		);
		assert_eq!(shape.len(), 3);
	}

	#[rstest]
	fn test_sync_parent_with_async_shape_factory_is_async() {
		let base: Factory = Factory::new(|_| Ok(json!({})));
		let remote: Factory = Factory::new_async(|_| async { Ok(json!({ "x": 1 })) });

		let composed: Factory = base.compose(Shape::new().build("remote", &remote));

		assert!(composed.is_async());
		assert!(composed.build().unwrap_err().is_configuration());
	}
}
