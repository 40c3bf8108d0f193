use log::info;
use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::ActionError,
    jwt::SessionData,
    schema::{Id, RecipeSummary},
};

use super::recipes::get_recipe_summary;

/// A strict `(user, recipe)` relation: adding twice or removing a missing
/// row is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Favorite,
    ShoppingCart,
}

impl Membership {
    fn table(self) -> &'static str {
        match self {
            Membership::Favorite => "favorites",
            Membership::ShoppingCart => "shopping_cart",
        }
    }

    fn action(self) -> ActionType {
        match self {
            Membership::Favorite => ActionType::ManageOwnFavorites,
            Membership::ShoppingCart => ActionType::ManageOwnShoppingCart,
        }
    }

    fn already_added(self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is already in favorites",
            Membership::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn not_added(self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is not in favorites",
            Membership::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

pub async fn add_membership(
    membership: Membership,
    session: &SessionData,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, ActionError> {
    session.authenticate(membership.action())?;

    let recipe = get_recipe_summary(recipe_id, pool)
        .await?
        .ok_or_else(|| ActionError::not_found("Recipe doesn't exist"))?;

    let query = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        membership.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if query.rows_affected() == 0 {
        return Err(ActionError::conflict(membership.already_added()));
    }

    info!(
        "Recipe {recipe_id} added to {} of {}",
        membership.table(),
        session.username
    );
    Ok(recipe)
}

pub async fn remove_membership(
    membership: Membership,
    session: &SessionData,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ActionError> {
    session.authenticate(membership.action())?;

    let query = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        membership.table()
    ))
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if query.rows_affected() == 0 {
        return Err(ActionError::not_found(membership.not_added()));
    }
    Ok(())
}

pub async fn has_membership(
    membership: Membership,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ActionError> {
    let (exists,): (bool,) = sqlx::query_as(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND recipe_id = $2)",
        membership.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn add_to_favorites(
    session: &SessionData,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, ActionError> {
    add_membership(Membership::Favorite, session, recipe_id, pool).await
}

pub async fn remove_from_favorites(
    session: &SessionData,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ActionError> {
    remove_membership(Membership::Favorite, session, recipe_id, pool).await
}

pub async fn add_to_shopping_cart(
    session: &SessionData,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, ActionError> {
    add_membership(Membership::ShoppingCart, session, recipe_id, pool).await
}

pub async fn remove_from_shopping_cart(
    session: &SessionData,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ActionError> {
    remove_membership(Membership::ShoppingCart, session, recipe_id, pool).await
}

pub async fn is_favorite(
    viewer: Option<&SessionData>,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ActionError> {
    match viewer {
        Some(session) => has_membership(Membership::Favorite, session.user_id, recipe_id, pool).await,
        None => Ok(false),
    }
}

pub async fn is_in_shopping_cart(
    viewer: Option<&SessionData>,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ActionError> {
    match viewer {
        Some(session) => {
            has_membership(Membership::ShoppingCart, session.user_id, recipe_id, pool).await
        }
        None => Ok(false),
    }
}
