//! Endless value sequences for generator functions.
//!
//! [`Cycle`] walks a fixed list in order and wraps around; [`Sample`] draws
//! uniformly from a list while never emitting the same value twice in a row.
//! Both iterators never return `None`, and each constructor call starts an
//! independent cursor.

use mockforge_faker::Provider;

use crate::error::{FactoryError, FactoryResult};

/// Cycles through `values` in order, forever.
///
/// # Errors
///
/// Returns a validation error if `values` is empty.
///
/// # Examples
///
/// ```
/// use mockforge_core::sequence::iterate;
///
/// let roles: Vec<_> = iterate(["admin", "editor"]).unwrap().take(3).collect();
/// assert_eq!(roles, ["admin", "editor", "admin"]);
/// ```
pub fn iterate<T, I>(values: I) -> FactoryResult<Cycle<T>>
where
	T: Clone,
	I: IntoIterator<Item = T>,
{
	Cycle::new(values.into_iter().collect())
}

/// Samples `values` at random, never repeating the previous emission.
///
/// Randomness comes from `provider`; the sampler keeps a clone of it.
///
/// # Errors
///
/// Returns a validation error if `values` is empty.
pub fn sample<T, I>(values: I, provider: &Provider) -> FactoryResult<Sample<T>>
where
	T: Clone + PartialEq,
	I: IntoIterator<Item = T>,
{
	Sample::new(values.into_iter().collect(), provider.clone())
}

/// Cursor over a fixed, non-empty list that wraps modulo its length.
#[derive(Debug, Clone)]
pub struct Cycle<T> {
	values: Vec<T>,
	cursor: usize,
}

impl<T: Clone> Cycle<T> {
	/// Creates a cursor positioned at the first value.
	pub fn new(values: Vec<T>) -> FactoryResult<Self> {
		if values.is_empty() {
			return Err(FactoryError::empty_source("iterate"));
		}
		Ok(Self { values, cursor: 0 })
	}

	/// Number of distinct positions before the sequence repeats.
	pub fn period(&self) -> usize {
		self.values.len()
	}
}

impl<T: Clone> Iterator for Cycle<T> {
	type Item = T;

	fn next(&mut self) -> Option<T> {
		let value = self.values[self.cursor].clone();
		self.cursor = (self.cursor + 1) % self.values.len();
		Some(value)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(usize::MAX, None)
	}
}

/// Random sampler that avoids immediate repetition.
#[derive(Debug, Clone)]
pub struct Sample<T> {
	values: Vec<T>,
	last: Option<T>,
	provider: Provider,
}

impl<T: Clone + PartialEq> Sample<T> {
	/// Creates a sampler with no previous emission.
	pub fn new(values: Vec<T>, provider: Provider) -> FactoryResult<Self> {
		if values.is_empty() {
			return Err(FactoryError::empty_source("sample"));
		}
		Ok(Self {
			values,
			last: None,
			provider,
		})
	}

	fn candidates(&self) -> Vec<usize> {
		let fresh: Vec<usize> = (0..self.values.len())
			.filter(|&index| self.last.as_ref() != Some(&self.values[index]))
			.collect();
		// Only one distinct value: repetition cannot be avoided.
		if fresh.is_empty() {
			(0..self.values.len()).collect()
		} else {
			fresh
		}
	}
}

impl<T: Clone + PartialEq> Iterator for Sample<T> {
	type Item = T;

	fn next(&mut self) -> Option<T> {
		let candidates = self.candidates();
		let slot = self.provider.pick_index(candidates.len())?;
		let value = self.values[candidates[slot]].clone();
		self.last = Some(value.clone());
		Some(value)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(usize::MAX, None)
	}
}
