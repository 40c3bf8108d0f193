use log::{info, warn};
use sqlx::{Pool, Postgres};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, SessionKeys},
    },
    error::ActionError,
    form::NewUser,
    schema::{Id, User},
};

pub async fn get_user(email: &str, pool: &Pool<Postgres>) -> Result<Option<User>, ActionError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(user_id: Id, pool: &Pool<Postgres>) -> Result<Option<User>, ActionError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Stores the user with an argon2 hash of their password.
pub async fn register_user(user: NewUser, pool: &Pool<Postgres>) -> Result<User, ActionError> {
    user.validate()?;

    let password = hash_password(&user.password)?;

    let created: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(user.email.trim())
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(password)
    .fetch_one(pool)
    .await?;

    info!("User {} registered", created.username);
    Ok(created)
}

/// Returns a signed session token for valid credentials.
pub async fn login_user(
    email: &str,
    password: &str,
    keys: &SessionKeys,
    pool: &Pool<Postgres>,
) -> Result<String, ActionError> {
    let user = get_user(email.trim(), pool)
        .await?
        .ok_or_else(|| ActionError::unauthorized("Invalid credentials"))?;

    let authenticated = verify_password(password, &user.password).map_err(|e| {
        warn!("Stored password hash of {} is unreadable: {e}", user.username);
        ActionError::unauthorized("Invalid credentials")
    })?;
    if !authenticated {
        return Err(ActionError::unauthorized("Invalid credentials"));
    }

    generate_jwt_session(&user, keys)
}
