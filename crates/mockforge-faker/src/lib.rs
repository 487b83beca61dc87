//! Capability provider for mockforge generator functions.
//!
//! [`Provider`] is the value-generation half of the context a factory hands
//! to its generator function. It wraps the [`fake`] crate behind a single,
//! seedable random number generator so that a whole factory graph can be
//! made reproducible by fixing one seed.
//!
//! # Examples
//!
//! ```
//! use mockforge_faker::Provider;
//!
//! let provider = Provider::seeded(42);
//! let name = provider.name();
//! let age = provider.int(18..=99);
//!
//! assert!(!name.is_empty());
//! assert!((18..=99).contains(&age));
//! ```
//!
//! Anything the [`fake`] crate can produce is reachable through
//! [`Provider::fake`] and [`Provider::fake_with`]:
//!
//! ```
//! use fake::faker::address::en::CityName;
//! use mockforge_faker::Provider;
//!
//! let provider = Provider::seeded(7);
//! let city: String = provider.fake_with(CityName());
//! let flag: bool = provider.fake();
//! # let _ = (city, flag);
//! ```

#![warn(missing_docs)]

use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::{Dummy, Fake, Faker};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

pub use fake;

/// Seedable source of realistic fake values.
///
/// Cloning a provider is cheap and the clones share one RNG, so values drawn
/// from any clone advance the same sequence.
#[derive(Clone)]
pub struct Provider {
	rng: Arc<Mutex<StdRng>>,
	seed: Option<u64>,
}

impl Provider {
	/// Creates a provider seeded from operating system entropy.
	pub fn new() -> Self {
		Self {
			rng: Arc::new(Mutex::new(StdRng::from_entropy())),
			seed: None,
		}
	}

	/// Creates a deterministic provider.
	///
	/// Two providers built from the same seed produce identical sequences.
	pub fn seeded(seed: u64) -> Self {
		Self {
			rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
			seed: Some(seed),
		}
	}

	/// Returns the seed this provider was created with, if any.
	pub fn seed(&self) -> Option<u64> {
		self.seed
	}

	/// Resets the shared RNG to a new seed.
	///
	/// Every clone of this provider observes the new sequence.
	pub fn reseed(&mut self, seed: u64) {
		*self.rng.lock() = StdRng::seed_from_u64(seed);
		self.seed = Some(seed);
	}

	/// Runs `f` with exclusive access to the underlying RNG.
	pub fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
		let mut rng = self.rng.lock();
		f(&mut rng)
	}

	/// Produces an arbitrary value of `U` using the [`fake`] crate's default
	/// dummy generator.
	pub fn fake<U>(&self) -> U
	where
		U: Dummy<Faker>,
	{
		self.with_rng(|rng| Faker.fake_with_rng(rng))
	}

	/// Produces a value of `U` from a specific [`fake`] faker, e.g.
	/// `fake::faker::address::en::CityName()`.
	pub fn fake_with<U, D>(&self, dummy: D) -> U
	where
		U: Dummy<D>,
	{
		self.with_rng(|rng| dummy.fake_with_rng(rng))
	}

	/// A given name.
	pub fn first_name(&self) -> String {
		self.fake_with(FirstName())
	}

	/// A family name.
	pub fn last_name(&self) -> String {
		self.fake_with(LastName())
	}

	/// A full name.
	pub fn name(&self) -> String {
		self.fake_with(Name())
	}

	/// An account-style user name.
	pub fn username(&self) -> String {
		self.fake_with(Username())
	}

	/// An email address on a reserved example domain.
	pub fn email(&self) -> String {
		self.fake_with(SafeEmail())
	}

	/// A company name.
	pub fn company(&self) -> String {
		self.fake_with(CompanyName())
	}

	/// A single lorem word.
	pub fn word(&self) -> String {
		self.fake_with(Word())
	}

	/// A lorem sentence of 4 to 10 words.
	pub fn sentence(&self) -> String {
		self.fake_with(Sentence(4..10))
	}

	/// A lorem paragraph of 3 to 6 sentences.
	pub fn paragraph(&self) -> String {
		self.fake_with(Paragraph(3..6))
	}

	/// A random (version 4) UUID drawn from the provider's RNG.
	pub fn uuid(&self) -> Uuid {
		let bytes: [u8; 16] = self.with_rng(|rng| rng.r#gen());
		uuid::Builder::from_random_bytes(bytes).into_uuid()
	}

	/// An integer within `range`.
	///
	/// # Panics
	///
	/// Panics if `range` is empty, e.g. `5..=4`.
	pub fn int(&self, range: RangeInclusive<i64>) -> i64 {
		assert!(!range.is_empty(), "Provider::int called with empty range {:?}", range);
		self.with_rng(|rng| rng.gen_range(range))
	}

	/// A float within `range`.
	///
	/// # Panics
	///
	/// Panics if `range` is empty or not finite, e.g. `1.0..1.0`.
	pub fn float(&self, range: Range<f64>) -> f64 {
		assert!(
			range.start < range.end && (range.end - range.start).is_finite(),
			"Provider::float called with empty range {:?}",
			range
		);
		self.with_rng(|rng| rng.gen_range(range))
	}

	/// A fair coin flip.
	pub fn boolean(&self) -> bool {
		self.chance(0.5)
	}

	/// `true` with the given probability, clamped into `0.0..=1.0`.
	pub fn chance(&self, probability: f64) -> bool {
		let probability = if probability.is_nan() {
			0.0
		} else {
			probability.clamp(0.0, 1.0)
		};
		self.with_rng(|rng| rng.gen_bool(probability))
	}

	/// A UTC timestamp.
	pub fn date_time(&self) -> DateTime<Utc> {
		self.fake_with(fake::faker::chrono::en::DateTime())
	}

	/// A uniformly chosen index into a collection of `len` elements.
	///
	/// Returns `None` when `len` is zero.
	pub fn pick_index(&self, len: usize) -> Option<usize> {
		if len == 0 {
			return None;
		}
		Some(self.with_rng(|rng| rng.gen_range(0..len)))
	}

	/// A uniformly chosen element of `values`.
	pub fn pick<'a, T>(&self, values: &'a [T]) -> Option<&'a T> {
		self.pick_index(values.len()).map(|index| &values[index])
	}
}

impl Default for Provider {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Provider")
			.field("seed", &self.seed)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_seeded_providers_are_deterministic() {
		// Arrange
		let first = Provider::seeded(1234);
		let second = Provider::seeded(1234);

		// Act
		let a: Vec<String> = (0..5).map(|_| first.name()).collect();
		let b: Vec<String> = (0..5).map(|_| second.name()).collect();

		// Assert
		assert_eq!(a, b);
		assert_eq!(first.seed(), Some(1234));
	}

	#[rstest]
	fn test_clones_share_one_sequence() {
		// Arrange
		let provider = Provider::seeded(9);
		let clone = provider.clone();
		let reference = Provider::seeded(9);

		// Act
		let first = provider.int(0..=1_000_000);
		let second = clone.int(0..=1_000_000);

		// Assert
		assert_eq!(first, reference.int(0..=1_000_000));
		assert_eq!(second, reference.int(0..=1_000_000));
	}

	#[rstest]
	fn test_reseed_restarts_sequence() {
		// Arrange
		let mut provider = Provider::seeded(5);
		let before = provider.uuid();

		// Act
		provider.reseed(5);

		// Assert
		assert_eq!(provider.uuid(), before);
	}

	#[rstest]
	#[case(0..=0)]
	#[case(-10..=10)]
	#[case(100..=200)]
	fn test_int_stays_in_range(#[case] range: RangeInclusive<i64>) {
		let provider = Provider::seeded(3);

		for _ in 0..50 {
			assert!(range.contains(&provider.int(range.clone())));
		}
	}

	#[rstest]
	fn test_pick_on_empty_slice_is_none() {
		let provider = Provider::new();
		let empty: [u8; 0] = [];

		assert!(provider.pick(&empty).is_none());
		assert!(provider.pick_index(0).is_none());
	}

	#[rstest]
	fn test_chance_extremes() {
		let provider = Provider::seeded(11);

		assert!((0..20).all(|_| provider.chance(1.0)));
		assert!((0..20).all(|_| !provider.chance(0.0)));
		assert!(!provider.chance(f64::NAN));
	}

	#[rstest]
	fn test_email_looks_like_an_address() {
		let provider = Provider::seeded(21);

		let email = provider.email();

		assert!(email.contains('@'));
	}

	#[rstest]
	fn test_uuid_is_version_four() {
		let provider = Provider::seeded(8);

		assert_eq!(provider.uuid().get_version_num(), 4);
	}

	#[rstest]
	#[should_panic(expected = "Provider::int called with empty range 5..=4")]
	fn test_int_rejects_empty_range() {
		Provider::seeded(1).int(5..=4);
	}

	#[rstest]
	#[case(1.0..1.0)]
	#[case(2.0..1.0)]
	#[should_panic(expected = "Provider::float called with empty range")]
	fn test_float_rejects_empty_range(#[case] range: Range<f64>) {
		Provider::seeded(1).float(range);
	}

	#[rstest]
	fn test_single_value_int_range() {
		let provider = Provider::seeded(3);

		assert_eq!(provider.int(7..=7), 7);
	}
}
