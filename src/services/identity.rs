//! Resolves the caller of a request from a signed session token.
//!
//! Tokens have the form `<user_id>.<expires_unix>.<signature>`, where the
//! signature is an HMAC-SHA1 over `<user_id>.<expires_unix>` encoded as
//! unpadded URL-safe base64. The role always comes from the stored user row.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rusqlite::Connection;
use sha1::Sha1;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Caller;

pub const SESSION_COOKIE: &str = "session";

type HmacSha1 = Hmac<Sha1>;

fn mac_for(secret: &str, payload: &str) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(mac)
}

pub fn issue_token(secret: &str, user_id: &str, expires_at: DateTime<Utc>) -> anyhow::Result<String> {
    anyhow::ensure!(!secret.is_empty(), "session secret is empty");
    anyhow::ensure!(!user_id.contains('.'), "user id must not contain '.'");

    let payload = format!("{user_id}.{}", expires_at.timestamp());
    let mac = mac_for(secret, &payload).ok_or_else(|| anyhow::anyhow!("invalid session secret"))?;
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload}.{signature}"))
}

/// Returns the user id a token was issued for, if the signature checks out
/// and the token has not expired.
pub fn verify_token(secret: &str, token: &str, now: DateTime<Utc>) -> Option<String> {
    if secret.is_empty() {
        return None;
    }

    let (payload, signature) = token.rsplit_once('.')?;
    let (user_id, expires) = payload.split_once('.')?;
    if user_id.is_empty() {
        return None;
    }

    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
    mac_for(secret, payload)?.verify_slice(&signature).ok()?;

    let expires: i64 = expires.parse().ok()?;
    if now.timestamp() >= expires {
        return None;
    }

    Some(user_id.to_string())
}

/// Pulls the raw token from a bearer header, falling back to the `session`
/// cookie. An explicit header wins over a cookie left behind by the browser.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let from_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    from_bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value)
    })
}

pub fn resolve_caller(
    conn: &Connection,
    secret: &str,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<Caller, AppError> {
    let token = token_from_headers(headers).ok_or(AppError::Unauthorized)?;
    let user_id = verify_token(secret, token, now).ok_or_else(|| {
        tracing::warn!("rejected invalid or expired session token");
        AppError::Unauthorized
    })?;

    let user = queries::get_user(conn, &user_id)?.ok_or_else(|| {
        tracing::warn!(user_id = %user_id, "session token for unknown user");
        AppError::Unauthorized
    })?;

    Ok(Caller { user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Role, User};
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret";

    fn seed_user(conn: &Connection, id: &str, role: Role) {
        queries::save_user(
            conn,
            &User {
                id: id.to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: "5551234567".to_string(),
                role,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_issue_and_verify() {
        let now = Utc::now();
        let token = issue_token(SECRET, "u-1", now + Duration::hours(1)).unwrap();
        assert_eq!(verify_token(SECRET, &token, now), Some("u-1".to_string()));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let token = issue_token(SECRET, "u-1", now + Duration::hours(1)).unwrap();
        assert_eq!(verify_token("other-secret", &token, now), None);
    }

    #[test]
    fn test_tampered_user_rejected() {
        let now = Utc::now();
        let token = issue_token(SECRET, "u-1", now + Duration::hours(1)).unwrap();
        let forged = token.replacen("u-1", "u-2", 1);
        assert_eq!(verify_token(SECRET, &forged, now), None);
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let token = issue_token(SECRET, "u-1", now - Duration::seconds(1)).unwrap();
        assert_eq!(verify_token(SECRET, &token, now), None);
    }

    #[test]
    fn test_garbage_rejected() {
        let now = Utc::now();
        assert_eq!(verify_token(SECRET, "", now), None);
        assert_eq!(verify_token(SECRET, "no-dots", now), None);
        assert_eq!(verify_token(SECRET, "u-1.123.!!!", now), None);
        assert_eq!(verify_token("", "u-1.123.abc", now), None);
    }

    #[test]
    fn test_token_from_cookie_and_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=abc.1.sig"));
        assert_eq!(token_from_headers(&headers), Some("abc.1.sig"));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz.2.sig"));
        assert_eq!(token_from_headers(&headers), Some("xyz.2.sig"));

        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_bearer_wins_over_stale_cookie() {
        let conn = db::init_db(":memory:").unwrap();
        seed_user(&conn, "cust-1", Role::Customer);
        let now = Utc::now();

        let stale = issue_token(SECRET, "cust-1", now - Duration::hours(1)).unwrap();
        let fresh = issue_token(SECRET, "cust-1", now + Duration::hours(1)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, format!("session={stale}").parse().unwrap());
        headers.insert(header::AUTHORIZATION, format!("Bearer {fresh}").parse().unwrap());

        assert_eq!(token_from_headers(&headers), Some(fresh.as_str()));
        assert_eq!(resolve_caller(&conn, SECRET, &headers, now).unwrap().id(), "cust-1");
    }

    #[test]
    fn test_resolve_caller_uses_stored_role() {
        let conn = db::init_db(":memory:").unwrap();
        seed_user(&conn, "admin-1", Role::Admin);
        seed_user(&conn, "cust-1", Role::Customer);
        let now = Utc::now();

        let mut headers = HeaderMap::new();
        let token = issue_token(SECRET, "admin-1", now + Duration::hours(1)).unwrap();
        headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        assert!(resolve_caller(&conn, SECRET, &headers, now).unwrap().is_admin());

        let mut headers = HeaderMap::new();
        let token = issue_token(SECRET, "cust-1", now + Duration::hours(1)).unwrap();
        headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        let caller = resolve_caller(&conn, SECRET, &headers, now).unwrap();
        assert!(!caller.is_admin());
        assert_eq!(caller.id(), "cust-1");
    }

    #[test]
    fn test_resolve_caller_unknown_user() {
        let conn = db::init_db(":memory:").unwrap();
        let now = Utc::now();
        let token = issue_token(SECRET, "ghost", now + Duration::hours(1)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());

        assert!(matches!(
            resolve_caller(&conn, SECRET, &headers, now),
            Err(AppError::Unauthorized)
        ));
    }
}
