use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    convert::Infallible,
    time::{SystemTime, UNIX_EPOCH},
};
use time::Duration;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    models::User,
    repository::RepositoryState,
};

/// Name of the browser cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "session";

/// Claims
///
/// Payload of the signed session token stored in the `session` cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the `users.id` of the logged-in user, as a decimal string.
    pub sub: String,
    /// Expiration Time (exp): the token is rejected after this instant.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// The configured session lifetime, saturated to what a token and a cookie can carry.
fn session_ttl(config: &AppConfig) -> usize {
    usize::try_from(config.session_ttl_secs).unwrap_or(usize::MAX)
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

/// issue_session_token
///
/// Signs a token for `user_id` that expires after the configured TTL.
pub fn issue_session_token(config: &AppConfig, user_id: i64) -> Result<String> {
    let iat = now_secs();
    let claims = Claims {
        sub: user_id.to_string(),
        iat,
        exp: iat.saturating_add(session_ttl(config)),
    };
    let key = EncodingKey::from_secret(config.session_secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// decode_session_token
///
/// Returns the user id of a valid token. Bad signatures, malformed tokens and expired
/// tokens all come back as `None`: an unusable session is simply an anonymous one.
pub fn decode_session_token(config: &AppConfig, token: &str) -> Option<i64> {
    let key = DecodingKey::from_secret(config.session_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => data.claims.sub.parse().ok(),
        Err(e) => {
            tracing::debug!("Ignoring unusable session token: {:?}", e.kind());
            None
        }
    }
}

/// session_cookie
///
/// Builds the `session` cookie carrying a freshly issued token. The browser keeps it
/// for the configured TTL, the same span the token's `exp` allows.
pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    let max_age = i64::try_from(session_ttl(config)).unwrap_or(i64::MAX);
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(Duration::seconds(max_age))
        .build()
}

/// Removal cookie matching the path `session_cookie` was set with.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// SessionUser
///
/// The identity behind the current request, as shown in page navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        SessionUser {
            id: user.id,
            username: user.username,
        }
    }
}

/// Resolves the session cookie to a live user, if any.
///
/// The user is re-read from the store on every request so a token for a user that no
/// longer exists grants nothing.
async fn resolve_session<S>(parts: &mut Parts, state: &S) -> Result<Option<SessionUser>>
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let repo = RepositoryState::from_ref(state);
    let config = AppConfig::from_ref(state);

    let jar = CookieJar::from_request_parts(parts, state)
        .await
        .unwrap_or_else(|never: Infallible| match never {});

    let Some(user_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_session_token(&config, cookie.value()))
    else {
        return Ok(None);
    };

    Ok(repo.get_user(user_id).await?.map(SessionUser::from))
}

/// AuthUser Extractor
///
/// The logged-in user of a request to a protected page. Rejects anonymous requests
/// with `AppError::Unauthenticated`, which responds with a redirect to the login page
/// before any handler logic or form parsing runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        // Already resolved by the auth gate.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        match resolve_session(parts, state).await? {
            Some(SessionUser { id, username }) => Ok(AuthUser { id, username }),
            None => Err(AppError::Unauthenticated),
        }
    }
}

impl From<AuthUser> for SessionUser {
    fn from(AuthUser { id, username }: AuthUser) -> Self {
        SessionUser { id, username }
    }
}

/// CurrentUser Extractor
///
/// The acting user on pages open to everyone; `None` for anonymous visitors.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        Ok(CurrentUser(resolve_session(parts, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let config = AppConfig::default();
        let token = issue_session_token(&config, 7).unwrap();
        assert_eq!(decode_session_token(&config, &token), Some(7));
    }

    #[test]
    fn token_signed_with_other_secret_is_anonymous() {
        let config = AppConfig::default();
        let other = AppConfig {
            session_secret: "some-other-secret".into(),
            ..AppConfig::default()
        };
        let token = issue_session_token(&other, 1).unwrap();
        assert_eq!(decode_session_token(&config, &token), None);
    }

    #[test]
    fn expired_token_is_anonymous() {
        let config = AppConfig::default();
        let claims = Claims { sub: "1".into(), iat: 1_000, exp: 2_000 };
        let key = EncodingKey::from_secret(config.session_secret.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();
        assert_eq!(decode_session_token(&config, &token), None);
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let config = AppConfig {
            session_ttl_secs: u64::MAX,
            ..AppConfig::default()
        };
        let token = issue_session_token(&config, 3).unwrap();
        assert_eq!(decode_session_token(&config, &token), Some(3));

        let cookie = session_cookie(&config, token);
        assert!(cookie.max_age().is_some_and(|age| age.whole_seconds() > 0));
    }

    #[test]
    fn session_cookie_is_http_only_and_scoped_to_root() {
        let config = AppConfig::default();
        let cookie = session_cookie(&config, "token".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(86_400)));
    }
}
