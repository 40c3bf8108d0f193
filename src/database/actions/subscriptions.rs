use std::collections::HashMap;

use log::info;
use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::ActionError,
    jwt::SessionData,
    schema::{Author, AuthorRecipeSummary, Id, RecipeSummary, SubscribedAuthor},
};

use super::users::get_user_by_id;

/// Groups newest-first recipes under their authors. `recipes_count` counts
/// every recipe; `recipes` keeps at most `recipes_limit` of them.
pub fn attach_recipes(
    authors: Vec<Author>,
    recipes: Vec<AuthorRecipeSummary>,
    recipes_limit: Option<usize>,
) -> Vec<SubscribedAuthor> {
    let mut by_author: HashMap<Id, Vec<RecipeSummary>> = HashMap::new();
    recipes
        .into_iter()
        .for_each(|recipe| by_author.entry(recipe.author_id).or_default().push(recipe.into()));

    authors
        .into_iter()
        .map(|author| {
            let mut recipes = by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = recipes.len() as i64;
            if let Some(limit) = recipes_limit {
                recipes.truncate(limit);
            }

            SubscribedAuthor {
                author,
                recipes,
                recipes_count,
            }
        })
        .collect()
}

async fn list_author_recipes(
    author_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<AuthorRecipeSummary>, ActionError> {
    let rows: Vec<AuthorRecipeSummary> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time
        FROM recipes
        WHERE author_id = ANY($1)
        ORDER BY id DESC
    ",
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Authors followed by `session`, ordered by author id.
pub async fn list_subscriptions(
    session: &SessionData,
    recipes_limit: Option<usize>,
    pool: &Pool<Postgres>,
) -> Result<Vec<SubscribedAuthor>, ActionError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let authors: Vec<Author> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, TRUE AS is_subscribed
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.subscriber_id = $1
        ORDER BY u.id
    ",
    )
    .bind(session.user_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Id> = authors.iter().map(|author| author.id).collect();
    let recipes = list_author_recipes(&ids, pool).await?;

    Ok(attach_recipes(authors, recipes, recipes_limit))
}

pub async fn subscribe(
    session: &SessionData,
    author_id: Id,
    recipes_limit: Option<usize>,
    pool: &Pool<Postgres>,
) -> Result<SubscribedAuthor, ActionError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    if session.user_id == author_id {
        return Err(ActionError::validation("Cannot subscribe to yourself"));
    }

    let author = get_user_by_id(author_id, pool)
        .await?
        .ok_or_else(|| ActionError::not_found("Author doesn't exist"))?;

    let query = sqlx::query(
        "
        INSERT INTO subscriptions (subscriber_id, author_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(session.user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if query.rows_affected() == 0 {
        return Err(ActionError::conflict("Already subscribed to this author"));
    }

    info!("{} subscribed to {}", session.username, author.username);

    let author = Author {
        id: author.id,
        email: author.email,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
    };
    let recipes = list_author_recipes(&[author_id], pool).await?;

    attach_recipes(vec![author], recipes, recipes_limit)
        .pop()
        .ok_or_else(|| ActionError::not_found("Author doesn't exist"))
}

pub async fn unsubscribe(
    session: &SessionData,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ActionError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let query = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if query.rows_affected() == 0 {
        return Err(ActionError::not_found("Not subscribed to this author"));
    }
    Ok(())
}

/// Always `false` for an anonymous viewer.
pub async fn is_subscribed(
    viewer: Option<&SessionData>,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ActionError> {
    let Some(session) = viewer else {
        return Ok(false);
    };

    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE subscriber_id = $1 AND author_id = $2)",
    )
    .bind(session.user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
