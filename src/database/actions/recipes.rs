use std::collections::HashMap;

use log::{info, warn};
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    authentication::permissions::ActionType,
    error::{ActionError, QueryError},
    form::{unique_ids, IngredientAmountForm, NewRecipe, RecipeChanges, RecipeFilter},
    jwt::SessionData,
    schema::{Id, IngredientAmount, Recipe, RecipeRow, RecipeSummary},
};

use super::{
    ingredients::ensure_ingredients_exist,
    tags::{ensure_tags_exist, insert_recipe_tags, list_recipe_tags, reconcile_recipe_tags},
};

/// Recipe columns plus author and viewer flags. A `NULL` viewer matches no
/// membership or subscription row, so every flag reads `false`.
fn push_recipe_select(query_builder: &mut QueryBuilder<'_, Postgres>, viewer: Option<Id>) {
    query_builder.push(
        "
        SELECT r.id, r.name, r.image, r.text, r.cooking_time,
            u.id AS author_id, u.email AS author_email, u.username AS author_username,
            u.first_name AS author_first_name, u.last_name AS author_last_name,
            EXISTS (SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.subscriber_id = ",
    );
    query_builder.push_bind(viewer);
    query_builder.push(
        ") AS author_is_subscribed,
            EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    query_builder.push_bind(viewer);
    query_builder.push(
        ") AS is_favorited,
            EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ",
    );
    query_builder.push_bind(viewer);
    query_builder.push(
        ") AS is_in_shopping_cart
        FROM recipes r
        INNER JOIN users u ON u.id = r.author_id
        WHERE TRUE",
    );
}

fn push_membership_filter(
    query_builder: &mut QueryBuilder<'_, Postgres>,
    table: &str,
    included: bool,
    viewer: Option<Id>,
) {
    let negation = if included { "" } else { "NOT " };

    query_builder.push(format!(
        " AND {negation}EXISTS (SELECT 1 FROM {table} m WHERE m.recipe_id = r.id AND m.user_id = "
    ));
    query_builder.push_bind(viewer);
    query_builder.push(")");
}

/// Ingredient lines of every listed recipe, keyed by recipe id, in insertion order.
pub async fn list_recipe_parts(
    recipe_ids: &[Id],
    conn: &mut PgConnection,
) -> Result<HashMap<Id, Vec<IngredientAmount>>, ActionError> {
    let rows: Vec<IngredientAmount> = sqlx::query_as(
        "
        SELECT ia.recipe_id, i.id, i.name, i.measurement_unit, ia.amount
        FROM ingredient_amounts ia
        INNER JOIN ingredients i ON i.id = ia.ingredient_id
        WHERE ia.recipe_id = ANY($1)
        ORDER BY ia.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut map: HashMap<Id, Vec<IngredientAmount>> = HashMap::new();
    rows.into_iter()
        .for_each(|row| map.entry(row.recipe_id).or_default().push(row));

    Ok(map)
}

async fn attach_relations(
    rows: Vec<RecipeRow>,
    conn: &mut PgConnection,
) -> Result<Vec<Recipe>, ActionError> {
    let ids: Vec<Id> = rows.iter().map(|row| row.id).collect();
    let mut tags = list_recipe_tags(&ids, conn).await?;
    let mut parts = list_recipe_parts(&ids, conn).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            Recipe::from_row(
                row,
                tags.remove(&id).unwrap_or_default(),
                parts.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

async fn load_recipe(
    recipe_id: Id,
    viewer: Option<Id>,
    conn: &mut PgConnection,
) -> Result<Recipe, ActionError> {
    let mut query_builder = QueryBuilder::new("");
    push_recipe_select(&mut query_builder, viewer);
    query_builder.push(" AND r.id = ").push_bind(recipe_id);

    let row: Option<RecipeRow> = query_builder
        .build_query_as::<RecipeRow>()
        .fetch_optional(&mut *conn)
        .await?;
    let row = row.ok_or_else(|| ActionError::not_found("Recipe doesn't exist"))?;

    attach_relations(vec![row], conn)
        .await?
        .pop()
        .ok_or_else(|| ActionError::not_found("Recipe doesn't exist"))
}

pub async fn get_recipe(
    recipe_id: Id,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ActionError> {
    let mut conn = pool.acquire().await?;

    load_recipe(recipe_id, viewer.map(|s| s.user_id), &mut conn).await
}

pub async fn get_recipe_summary(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeSummary>, ActionError> {
    let row: Option<RecipeSummary> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

    Ok(row)
}

/// Newest first. Membership filters are relative to `viewer`; an anonymous
/// viewer has empty favorites and cart.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, ActionError> {
    let viewer = viewer.map(|s| s.user_id);

    let mut query_builder = QueryBuilder::new("");
    push_recipe_select(&mut query_builder, viewer);

    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query_builder
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id
                  WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if let Some(included) = filter.is_favorited {
        push_membership_filter(&mut query_builder, "favorites", included, viewer);
    }
    if let Some(included) = filter.is_in_shopping_cart {
        push_membership_filter(&mut query_builder, "shopping_cart", included, viewer);
    }
    query_builder.push(" ORDER BY r.id DESC");

    let mut conn = pool.acquire().await?;
    let rows: Vec<RecipeRow> = query_builder
        .build_query_as::<RecipeRow>()
        .fetch_all(&mut *conn)
        .await?;

    attach_relations(rows, &mut conn).await
}

async fn insert_ingredient_amounts(
    recipe_id: Id,
    ingredients: &[IngredientAmountForm],
    conn: &mut PgConnection,
) -> Result<(), ActionError> {
    if ingredients.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO ingredient_amounts (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(ingredients, |mut b, ingredient| {
        b.push_bind(recipe_id)
            .push_bind(ingredient.id)
            .push_bind(ingredient.amount);
    });

    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

fn ingredient_ids(ingredients: &[IngredientAmountForm]) -> Vec<Id> {
    ingredients.iter().map(|ingredient| ingredient.id).collect()
}

/// Recipe row, tag links and ingredient amounts are written in one
/// transaction; any failure leaves no trace of the recipe.
pub async fn create_recipe(
    session: &SessionData,
    recipe: NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ActionError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;
    recipe.validate()?;

    let tags = unique_ids(&recipe.tags);

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    ensure_ingredients_exist(&ingredient_ids(&recipe.ingredients), &mut *tr).await?;
    ensure_tags_exist(&tags, &mut *tr).await?;

    let (recipe_id,): (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(recipe.name.trim())
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tr)
    .await?;

    insert_recipe_tags(recipe_id, &tags, &mut *tr).await?;

    if let Err(e) = insert_ingredient_amounts(recipe_id, &recipe.ingredients, &mut *tr).await {
        warn!("Recipe '{}' rolled back: {e}", recipe.name);
        return Err(e);
    }

    let created = load_recipe(recipe_id, Some(session.user_id), &mut *tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    info!("Recipe {recipe_id} created by {}", session.username);
    Ok(created)
}

/// Locks the recipe row and checks that `session` is its author.
async fn lock_own_recipe(
    recipe_id: Id,
    session: &SessionData,
    conn: &mut PgConnection,
) -> Result<(), ActionError> {
    let author: Option<(Id,)> =
        sqlx::query_as("SELECT author_id FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(recipe_id)
            .fetch_optional(&mut *conn)
            .await?;

    let (author_id,) = author.ok_or_else(|| ActionError::not_found("Recipe doesn't exist"))?;
    if author_id != session.user_id {
        return Err(ActionError::unauthorized(
            "Only the author can modify this recipe",
        ));
    }
    Ok(())
}

/// Replaces the ingredient set and tag set and applies the present scalar
/// fields. Runs in one transaction: on any error nothing changes.
pub async fn update_recipe(
    recipe_id: Id,
    session: &SessionData,
    changes: RecipeChanges,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ActionError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;
    changes.validate()?;

    let tags = unique_ids(&changes.tags);

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    lock_own_recipe(recipe_id, session, &mut *tr).await?;
    ensure_ingredients_exist(&ingredient_ids(&changes.ingredients), &mut *tr).await?;
    ensure_tags_exist(&tags, &mut *tr).await?;

    sqlx::query("DELETE FROM ingredient_amounts WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await?;

    sqlx::query(
        "
        UPDATE recipes SET
            name = COALESCE($2, name),
            image = COALESCE($3, image),
            text = COALESCE($4, text),
            cooking_time = COALESCE($5, cooking_time)
        WHERE id = $1
    ",
    )
    .bind(recipe_id)
    .bind(changes.name.as_deref().map(str::trim))
    .bind(&changes.image)
    .bind(&changes.text)
    .bind(changes.cooking_time)
    .execute(&mut *tr)
    .await?;

    reconcile_recipe_tags(recipe_id, &tags, &mut *tr).await?;

    if let Err(e) = insert_ingredient_amounts(recipe_id, &changes.ingredients, &mut *tr).await {
        warn!("Update of recipe {recipe_id} rolled back: {e}");
        return Err(e);
    }

    let updated = load_recipe(recipe_id, Some(session.user_id), &mut *tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    info!("Recipe {recipe_id} updated by {}", session.username);
    Ok(updated)
}

/// Author-only. Amounts, tag links, favorites and cart rows cascade.
pub async fn delete_recipe(
    recipe_id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ActionError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    lock_own_recipe(recipe_id, session, &mut *tr).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    info!("Recipe {recipe_id} deleted by {}", session.username);
    Ok(())
}
