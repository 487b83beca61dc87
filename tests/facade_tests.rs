//! The facade prelude is enough to write, derive and persist factories.

use mockforge::prelude::*;
use rstest::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Comment {
	id: u64,
	body: String,
	approved: bool,
}

struct Approving;

#[async_trait]
impl PersistenceAdapter<Comment> for Approving {
	async fn create(&self, mut comment: Comment) -> FactoryResult<Comment> {
		comment.approved = true;
		Ok(comment)
	}
}

#[fixture]
fn comments() -> Factory<Comment> {
	Factory::new(|ctx| {
		Ok(json!({
			"id": ctx.iteration() + 1,
			"body": ctx.faker().sentence(),
			"approved": false,
		}))
	})
	.with_provider(Provider::seeded(99))
}

#[rstest]
fn test_prelude_builds_typed_values(comments: Factory<Comment>) {
	let comment = comments.build_with(record! { "body": "first!" }).unwrap();

	assert_eq!(
		comment,
		Comment {
			id: 1,
			body: "first!".into(),
			approved: false
		}
	);
}

#[rstest]
#[tokio::test]
async fn test_prelude_persists_through_custom_adapter(comments: Factory<Comment>) {
	// Arrange
	let comments = comments.with_adapter(Approving);

	// Act
	let saved = comments.create_many(2).await.unwrap();

	// Assert
	assert!(saved.iter().all(|comment| comment.approved));
	assert_eq!(saved[1].id, 2);
}

#[rstest]
fn test_faker_crate_is_reexported() {
	use mockforge::fake::faker::address::en::CityName;

	let city: String = Provider::seeded(1).fake_with(CityName());

	assert!(!city.is_empty());
}
