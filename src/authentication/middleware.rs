use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::SESSION_COOKIE;

use super::jwt::{verify_jwt_session, SessionData, SessionKeys};

#[derive(Debug)]
struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// Candidate session tokens: the `session` cookie first, then
/// `Authorization: Bearer|Token <jwt>`.
fn with_tokens() -> impl Filter<Extract = (Vec<String>,), Error = Rejection> + Clone {
    warp::cookie::optional(SESSION_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .map(|cookie: Option<String>, header: Option<String>| {
            cookie
                .into_iter()
                .chain(header.as_deref().and_then(bearer_token))
                .collect()
        })
}

fn bearer_token(header: &str) -> Option<String> {
    let (scheme, token) = header.trim().split_once(' ')?;

    match scheme {
        "Bearer" | "Token" if !token.trim().is_empty() => Some(token.trim().to_owned()),
        _ => None,
    }
}

/// First candidate that verifies; a stale cookie does not hide a valid header.
fn verified_session(tokens: Vec<String>, keys: &SessionKeys) -> Option<SessionData> {
    tokens
        .iter()
        .find_map(|token| verify_jwt_session(token, keys).ok())
        .map(SessionData::from)
}

pub fn with_session(
    keys: SessionKeys,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_tokens().and_then(move |tokens: Vec<String>| {
        let session = verified_session(tokens, &keys);
        async move { session.ok_or_else(|| warp::reject::custom(Unauthorized)) }
    })
}

/// Anonymous callers and invalid tokens both yield `None`.
pub fn with_possible_session(
    keys: SessionKeys,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    with_tokens().map(move |tokens: Vec<String>| verified_session(tokens, &keys))
}
