mod common;

use common::{count, create_ingredient, create_user, new_recipe};
use foodgram_sdk::{
    actions::{create_recipe, get_recipe, is_subscribed, list_subscriptions, subscribe, unsubscribe},
    error::ActionError,
    form::{recipes_limit, Form},
    schema::MeasurementUnit,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn self_subscription_is_rejected_first(pool: PgPool) {
    let user = create_user(&pool, "user").await;

    let error = subscribe(&user, user.user_id, None, &pool).await.unwrap_err();
    assert!(matches!(error, ActionError::Validation(_)));
    assert_eq!(count(&pool, "subscriptions").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn subscribe_twice_is_a_conflict(pool: PgPool) {
    let reader = create_user(&pool, "reader").await;
    let author = create_user(&pool, "author").await;

    let entry = subscribe(&reader, author.user_id, None, &pool).await.unwrap();
    assert!(entry.author.is_subscribed);
    assert_eq!(entry.recipes_count, 0);

    let error = subscribe(&reader, author.user_id, None, &pool).await.unwrap_err();
    assert!(error.is_conflict());

    let error = subscribe(&reader, 9999, None, &pool).await.unwrap_err();
    assert!(error.is_not_found());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn unsubscribe_requires_an_edge(pool: PgPool) {
    let reader = create_user(&pool, "reader").await;
    let author = create_user(&pool, "author").await;
    let other = create_user(&pool, "other").await;

    let error = unsubscribe(&reader, author.user_id, &pool).await.unwrap_err();
    assert!(error.is_not_found());

    subscribe(&reader, author.user_id, None, &pool).await.unwrap();
    subscribe(&reader, other.user_id, None, &pool).await.unwrap();
    assert!(is_subscribed(Some(&reader), author.user_id, &pool).await.unwrap());
    assert!(!is_subscribed(None, author.user_id, &pool).await.unwrap());

    unsubscribe(&reader, author.user_id, &pool).await.unwrap();
    assert!(!is_subscribed(Some(&reader), author.user_id, &pool).await.unwrap());

    let followed: Vec<_> = list_subscriptions(&reader, None, &pool)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.author.id)
        .collect();
    assert_eq!(followed, vec![other.user_id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "Requires a running Postgres (DATABASE_URL)"]
async fn listing_limits_recipes_but_counts_all(pool: PgPool) {
    let reader = create_user(&pool, "reader").await;
    let prolific = create_user(&pool, "prolific").await;
    let quiet = create_user(&pool, "quiet").await;
    let flour = create_ingredient(&pool, "мука", MeasurementUnit::Gram).await;

    let mut ids = vec![];
    for name in ["Первый", "Второй", "Третий"] {
        let recipe = create_recipe(&prolific, new_recipe(name, &[(flour, 1)], &[]), &pool)
            .await
            .unwrap();
        ids.push(recipe.id);
    }

    subscribe(&reader, quiet.user_id, None, &pool).await.unwrap();
    subscribe(&reader, prolific.user_id, None, &pool).await.unwrap();

    let limit = recipes_limit(&Form::from_query("recipes_limit=2"));
    let authors = list_subscriptions(&reader, limit, &pool).await.unwrap();

    assert_eq!(
        authors.iter().map(|a| a.author.id).collect::<Vec<_>>(),
        vec![prolific.user_id, quiet.user_id]
    );
    assert_eq!(authors[0].recipes_count, 3);
    assert_eq!(
        authors[0].recipes.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1]]
    );
    assert_eq!(authors[1].recipes_count, 0);

    let unlimited = recipes_limit(&Form::from_query("recipes_limit=abc"));
    let authors = list_subscriptions(&reader, unlimited, &pool).await.unwrap();
    assert_eq!(authors[0].recipes.len(), 3);

    let recipe = get_recipe(ids[0], Some(&reader), &pool).await.unwrap();
    assert!(recipe.author.is_subscribed);
}
