#![allow(dead_code)]

use foodgram_sdk::{
    actions::register_user,
    form::{IngredientAmountForm, NewRecipe, NewUser},
    jwt::SessionData,
    schema::{Id, MeasurementUnit, UserRole},
};
use sqlx::PgPool;

pub async fn create_user(pool: &PgPool, username: &str) -> SessionData {
    let user = register_user(
        NewUser {
            email: format!("{username}@example.com"),
            username: username.to_owned(),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            password: "password".to_owned(),
        },
        pool,
    )
    .await
    .unwrap();

    SessionData {
        user_id: user.id,
        username: user.username,
        role: user.role,
        is_admin: false,
    }
}

pub async fn create_admin(pool: &PgPool, username: &str) -> SessionData {
    let session = create_user(pool, username).await;

    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(session.user_id)
        .execute(pool)
        .await
        .unwrap();

    SessionData {
        role: UserRole::Admin,
        is_admin: true,
        ..session
    }
}

pub async fn create_ingredient(pool: &PgPool, name: &str, unit: MeasurementUnit) -> Id {
    let (id,): (Id,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(unit)
    .fetch_one(pool)
    .await
    .unwrap();

    id
}

pub async fn create_tag(pool: &PgPool, name: &str, slug: &str) -> Id {
    let (id,): (Id,) =
        sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, '#E26C2D', $2) RETURNING id")
            .bind(name)
            .bind(slug)
            .fetch_one(pool)
            .await
            .unwrap();

    id
}

pub fn new_recipe(name: &str, ingredients: &[(Id, i32)], tags: &[Id]) -> NewRecipe {
    NewRecipe {
        name: name.to_owned(),
        image: format!("recipes/{name}.png"),
        text: "Смешать и подать".to_owned(),
        cooking_time: 15,
        tags: tags.to_vec(),
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmountForm { id, amount })
            .collect(),
    }
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();

    count
}
