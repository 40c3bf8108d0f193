use sqlx::error::ErrorKind;
use thiserror::Error;
use warp::reject::Rejection;

use crate::RenderError;

/// Storage failure that is not a constraint violation.
#[derive(Debug, Error)]
#[error("{info}")]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(e),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(e),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            e => Self::new(format!("{e}")),
        }
    }
}

#[derive(Debug, Error)]
#[error("({info})")]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),
    /// The row already exists.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub const DUPLICATE_INGREDIENT: &str = "Ingredient list contains duplicate ingredients";

impl ActionError {
    pub fn validation(info: &str) -> Self {
        Self::Validation(info.to_string())
    }

    pub fn conflict(info: &str) -> Self {
        Self::Conflict(info.to_string())
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn unauthorized(info: &str) -> Self {
        Self::Unauthorized(info.to_string())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ActionError::Validation(_) => 400,
            ActionError::Conflict(_) => 409,
            ActionError::NotFound(_) => 404,
            ActionError::Unauthorized(_) => 403,
            ActionError::Query(_) | ActionError::Render(_) => 500,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ActionError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ActionError::NotFound(_))
    }
}

fn constraint_message(constraint: Option<&str>) -> Option<&'static str> {
    match constraint? {
        "unique_recipe_ingredient" => Some(DUPLICATE_INGREDIENT),
        "unique_favorite" => Some("Recipe is already in favorites"),
        "unique_shopping_cart" => Some("Recipe is already in the shopping cart"),
        "unique_subscription" => Some("Already subscribed to this author"),
        "subscriber_not_author" => Some("Cannot subscribe to yourself"),
        "unique_user_email" => Some("A user with this email already exists"),
        "unique_user_username" => Some("A user with this username already exists"),
        "unique_tag_name" | "unique_tag_slug" => Some("A tag with this name already exists"),
        "unique_ingredient_name" => Some("An ingredient with this name already exists"),
        "positive_cooking_time" => Some("Cooking time must be at least 1 minute"),
        "positive_amount" => Some("Amount must be at least 1"),
        _ => None,
    }
}

/// Constraint violations become domain errors; everything else is a [`QueryError`].
impl From<sqlx::Error> for ActionError {
    fn from(value: sqlx::Error) -> Self {
        if let Some(e) = value.as_database_error() {
            let info = constraint_message(e.constraint())
                .map(String::from)
                .unwrap_or_else(|| e.message().to_string());

            match e.kind() {
                ErrorKind::UniqueViolation => return Self::Conflict(info),
                ErrorKind::ForeignKeyViolation => return Self::NotFound(info),
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    return Self::Validation(info)
                }
                _ => {}
            }
        }

        Self::Query(QueryError::from(value))
    }
}

impl From<TypeError> for ActionError {
    fn from(value: TypeError) -> Self {
        Self::Validation(value.info)
    }
}

impl From<ActionError> for potion::Error {
    fn from(value: ActionError) -> Self {
        let info = value.to_string();

        potion::Error {
            code: value.status_code().into(),
            info: Some(info),
            redirect: None,
        }
    }
}

impl From<ActionError> for Rejection {
    fn from(value: ActionError) -> Self {
        let error: potion::Error = value.into();
        error.into()
    }
}
