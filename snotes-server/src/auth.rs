//! Session gate
//!
//! Sessions are issued by an external auth provider. This module only asks
//! "who is calling?": [`SessionValidator`] resolves request headers to a
//! [`SessionUser`], and [`auth_middleware`] rejects requests without one.
//! Handlers read the caller with `Extension<SessionUser>`.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Cookie carrying the session token when no bearer header is sent
pub const SESSION_COOKIE: &str = "session_token";

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

/// Auth provider interface: `getSession(headers) -> {user} | null`
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, ApiError>;
}

/// Session token from `Authorization: Bearer <token>` or the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim().to_string())
        })
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty())
}

/// Validates tokens against the auth provider's `sessions` and `users` tables
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionValidator for SqliteSessionStore {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<SessionUser>, ApiError> {
        let Some(token) = session_token(headers) else {
            return Ok(None);
        };

        let row = sqlx::query(
            r#"
            SELECT u.id, u.name, u.email, u.image, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = ?
            "#,
        )
        .bind(&token)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            debug!("Unknown session token");
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        if expires_at <= Utc::now() {
            debug!("Expired session token");
            return Ok(None);
        }

        Ok(Some(SessionUser {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            image: row.try_get("image")?,
        }))
    }
}

/// Authentication middleware
///
/// Returns 401 when no valid session is presented. Applied to every `/api`
/// and `/ws` route; `/health` is public.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state
        .sessions
        .get_session(request.headers())
        .await?
        .ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_token() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc123")]);
        assert_eq!(session_token(&h).as_deref(), Some("abc123"));

        let h = headers(&[(header::AUTHORIZATION, "bearer abc123")]);
        assert_eq!(session_token(&h).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(session_token(&h), None);
    }

    #[test]
    fn test_cookie_token() {
        let h = headers(&[(header::COOKIE, "theme=dark; session_token=tok-9; other=1")]);
        assert_eq!(session_token(&h).as_deref(), Some("tok-9"));
    }

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "session_token=from-cookie"),
        ]);
        assert_eq!(session_token(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        let h = headers(&[(header::COOKIE, "session_token=")]);
        assert_eq!(session_token(&h), None);
    }
}
