use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    error::ActionError,
    schema::{Id, User, UserRole},
};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole, lifetime: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

/// The authenticated principal; `Option<&SessionData>` is the viewer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ActionError> {
        if !action.authenticate(self) {
            return Err(ActionError::unauthorized(
                "You don't have permission to perform this action",
            ));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

/// Signing key and token lifetime for sessions.
#[derive(Clone)]
pub struct SessionKeys {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], lifetime_hours: i64) -> Result<Self, ActionError> {
        let key = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|_| ActionError::validation("Invalid session secret"))?;

        Ok(Self {
            key,
            lifetime: Duration::hours(lifetime_hours),
        })
    }

    fn sign(&self, claims: &JwtSessionData) -> Result<String, ActionError> {
        claims
            .sign_with_key(&self.key)
            .map_err(|e| ActionError::unauthorized(&format!("Failed to sign session; {e}")))
    }
}

pub fn generate_jwt_session(user: &User, keys: &SessionKeys) -> Result<String, ActionError> {
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role, keys.lifetime);

    keys.sign(&claims)
}

pub fn verify_jwt_session(token: &str, keys: &SessionKeys) -> Result<JwtSessionData, ActionError> {
    let session: JwtSessionData = token
        .verify_with_key(&keys.key)
        .map_err(|_| ActionError::unauthorized("Invalid session; Invalid token"))?;

    if session.is_expired() {
        return Err(ActionError::unauthorized("Invalid session; Token expired"));
    }

    Ok(session)
}
