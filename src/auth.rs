use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    repository::RepositoryState,
};

/// Role tag stored in the session. Only two roles exist; admins gate the
/// console, approved students merely hold a public session.
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STUDENT: &str = "student";

const SESSION_TTL_SECS: i64 = 60 * 60 * 24;

/// hash_password
///
/// Hashes a password with Argon2id and a fresh random salt. The PHC string it
/// returns is what gets persisted; plaintext never reaches the repository.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// verify_password
///
/// Constant-time verification against a stored PHC string. A malformed stored
/// hash verifies as false rather than erroring, so a corrupt row cannot be
/// used to probe accounts.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// SessionClaims
///
/// The payload of the signed session token issued at login. It holds exactly
/// what the session layer needs: role tag, numeric identity, display name,
/// plus the standard freshness timestamps.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: admin or student id, depending on `role`.
    pub sub: i32,
    pub role: String,
    /// Display name (admin username or student name).
    pub name: String,
    pub exp: usize,
    pub iat: usize,
}

/// issue_session
///
/// Signs a session token for a freshly authenticated identity.
pub fn issue_session(config: &AppConfig, id: i32, role: &str, name: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: id,
        role: role.to_string(),
        name: name.to_string(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    // Signing with an HMAC secret cannot fail for serializable claims.
    .unwrap_or_default()
}

fn decode_session(config: &AppConfig, token: &str) -> Option<SessionClaims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

/// Pulls the session token out of the request: `Authorization: Bearer` first,
/// then the `session` cookie the browser frontend uses.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }
    parts
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (key, val) = pair.trim().split_once('=')?;
                (key == "session").then(|| val.to_string())
            })
        })
}

/// AdminUser
///
/// The resolved identity of an authenticated admin request. Every
/// admin-console handler takes this extractor (directly or via the route-layer
/// middleware), which is the single capability check the console has.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
}

/// AdminUser Extractor Implementation
///
/// The flow mirrors the rest of the auth layer:
/// 1. Dependency resolution: Repository and AppConfig from the app state.
/// 2. Local bypass: `x-admin-id` header, accepted only in `Env::Local` and only
///    for an id that maps to a live admin row.
/// 3. Token validation: bearer header or session cookie, signature + expiry.
/// 4. DB lookup: the admin must still exist and be active, so deactivating an
///    account revokes its outstanding sessions immediately.
///
/// Rejection: 401 on any failure.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(id) = parts
                .headers
                .get("x-admin-id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<i32>().ok())
            {
                if let Some(admin) = repo.get_admin(id).await {
                    if admin.is_active {
                        return Ok(AdminUser {
                            id: admin.id,
                            username: admin.username,
                        });
                    }
                }
            }
        }

        let token = extract_token(parts).ok_or(StatusCode::UNAUTHORIZED)?;
        let claims = decode_session(&config, &token).ok_or(StatusCode::UNAUTHORIZED)?;

        if claims.role != ROLE_ADMIN {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let admin = repo
            .get_admin(claims.sub)
            .await
            .filter(|a| a.is_active)
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AdminUser {
            id: admin.id,
            username: admin.username,
        })
    }
}
