use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use thiserror::Error;

use crate::{
    error::ActionError, jwt::SessionKeys, DocumentRenderer, PdfRenderer, PlainTextRenderer,
    DEFAULT_DOCUMENT_FONT_PATH, DEFAULT_MAX_CONNECTIONS, DEFAULT_SESSION_LIFETIME_HOURS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),
    #[error("Invalid {key} value: {info}")]
    Invalid { key: &'static str, info: String },
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Session(#[from] ActionError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_lifetime_hours: i64,
    pub max_connections: u32,
    /// TrueType font embedded in shopping list PDFs.
    pub document_font: String,
}

impl Config {
    /// Reads the environment, after loading `.env` if one exists.
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            info!("No .env file found, using the process environment");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            session_lifetime_hours: try_load(
                "SESSION_LIFETIME_HOURS",
                DEFAULT_SESSION_LIFETIME_HOURS,
            )?,
            max_connections: try_load("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            document_font: try_load("SHOPPING_LIST_FONT", DEFAULT_DOCUMENT_FONT_PATH.to_owned())?,
        })
    }

    pub fn session_keys(&self) -> Result<SessionKeys, ConfigError> {
        Ok(SessionKeys::new(
            self.jwt_secret.as_bytes(),
            self.session_lifetime_hours,
        )?)
    }

    /// PDF output when the font is readable, plain text otherwise.
    pub fn document_renderer(&self) -> Box<dyn DocumentRenderer> {
        match PdfRenderer::from_file(&self.document_font) {
            Ok(renderer) => Box::new(renderer),
            Err(e) => {
                warn!("Shopping lists fall back to plain text: {e}");
                Box::new(PlainTextRenderer::default())
            }
        }
    }

    pub async fn connect(&self) -> Result<Pool<Postgres>, ConfigError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(ConfigError::Connect)
    }
}

pub async fn migrate(pool: &Pool<Postgres>) -> Result<(), ConfigError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found");
        ConfigError::Missing(key)
    })
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                info: e.to_string(),
            }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
