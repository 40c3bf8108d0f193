use std::collections::{HashMap, HashSet};

use log::info;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    authentication::permissions::ActionType,
    error::ActionError,
    jwt::SessionData,
    schema::{Id, LinkedRecipeTag, Tag},
    slug::slugify,
    TAG_NAME_MAX_LENGTH,
};

pub async fn create_tag(
    session: &SessionData,
    name: &str,
    color: &str,
    pool: &Pool<Postgres>,
) -> Result<Tag, ActionError> {
    session.authenticate(ActionType::ManageTags)?;

    let name = name.trim();
    if name.is_empty() || name.chars().count() > TAG_NAME_MAX_LENGTH {
        return Err(ActionError::Validation(format!(
            "Tag name must be between 1 and {TAG_NAME_MAX_LENGTH} characters"
        )));
    }
    if !is_hex_color(color) {
        return Err(ActionError::validation("Color must be in #RRGGBB format"));
    }

    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ActionError::validation("Tag name must contain letters or digits"));
    }

    let tag: Tag = sqlx::query_as(
        "
        INSERT INTO tags (name, color, slug)
        VALUES ($1, $2, $3)
        RETURNING id, name, color, slug
    ",
    )
    .bind(name)
    .bind(color.to_uppercase())
    .bind(slug)
    .fetch_one(pool)
    .await?;

    info!("Tag '{}' ({}) created by {}", tag.name, tag.slug, session.username);
    Ok(tag)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Tag, ActionError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    tag.ok_or_else(|| ActionError::not_found("Tag doesn't exist"))
}

pub async fn find_tag_by_slug(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Tag>, ActionError> {
    let tag: Option<Tag> =
        sqlx::query_as("SELECT id, name, color, slug FROM tags WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ActionError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

/// Tags of every listed recipe, keyed by recipe id.
pub async fn list_recipe_tags(
    recipe_ids: &[Id],
    conn: &mut PgConnection,
) -> Result<HashMap<Id, Vec<Tag>>, ActionError> {
    let rows: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut map: HashMap<Id, Vec<Tag>> = HashMap::new();
    rows.into_iter()
        .for_each(|row| map.entry(row.recipe_id).or_default().push(row.into()));

    Ok(map)
}

pub(crate) async fn ensure_tags_exist(ids: &[Id], conn: &mut PgConnection) -> Result<(), ActionError> {
    if ids.is_empty() {
        return Ok(());
    }

    let (found,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(&mut *conn)
        .await?;

    if found != ids.len() as i64 {
        return Err(ActionError::not_found("Tag doesn't exist"));
    }
    Ok(())
}

/// Returns `(to_add, to_remove)` turning `current` into `desired`.
pub fn diff_tags(current: &[Id], desired: &[Id]) -> (Vec<Id>, Vec<Id>) {
    let current_set: HashSet<&Id> = current.iter().collect();
    let desired_set: HashSet<&Id> = desired.iter().collect();

    let add = desired
        .iter()
        .filter(|id| !current_set.contains(id))
        .copied()
        .collect();
    let remove = current
        .iter()
        .filter(|id| !desired_set.contains(id))
        .copied()
        .collect();

    (add, remove)
}

pub(crate) async fn insert_recipe_tags(
    recipe_id: Id,
    tag_ids: &[Id],
    conn: &mut PgConnection,
) -> Result<(), ActionError> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

    query_builder.push_values(tag_ids, |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });

    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

/// Brings the stored tag set of a recipe in line with `desired`.
pub(crate) async fn reconcile_recipe_tags(
    recipe_id: Id,
    desired: &[Id],
    conn: &mut PgConnection,
) -> Result<(), ActionError> {
    let current: Vec<(Id,)> = sqlx::query_as("SELECT tag_id FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await?;
    let current: Vec<Id> = current.into_iter().map(|(id,)| id).collect();

    let (add, remove) = diff_tags(&current, desired);

    if !remove.is_empty() {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1 AND tag_id = ANY($2)")
            .bind(recipe_id)
            .bind(&remove)
            .execute(&mut *conn)
            .await?;
    }

    insert_recipe_tags(recipe_id, &add, conn).await
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}
