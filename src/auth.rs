use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::cache::keys::{session_key, SESSION_TTL};
use crate::cache::RedisCache;
use crate::config::JwtConfig;
use crate::db::operations::{session, user};
use crate::db::DatabaseProxy;

pub const AUTH_COOKIE_NAME: &str = "auth_token";
const BCRYPT_COST: u32 = 10;

type HmacSha256 = Hmac<Sha256>;

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<user::UserRecord> for AuthUser {
    fn from(record: user::UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid JWT_EXPIRES_IN")]
    InvalidExpiresIn,
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at_ms: i64,
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    from_header.or_else(|| get_cookie(headers, AUTH_COOKIE_NAME))
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn sign_jwt_for_user(jwt: &JwtConfig, user_id: &str) -> Result<IssuedToken, AuthError> {
    let issued_at = Utc::now();
    let exp = issued_at
        .checked_add_signed(chrono::Duration::milliseconds(jwt.expires_in_ms))
        .ok_or(AuthError::InvalidExpiresIn)?;

    let header_json = serde_json::json!({
        "alg": "HS256",
        "typ": "JWT",
    });
    let payload_json = serde_json::json!({
        "userId": user_id,
        "jti": uuid::Uuid::new_v4().to_string(),
        "iat": issued_at.timestamp(),
        "exp": exp.timestamp(),
    });

    let header_b64 = URL_SAFE_NO_PAD.encode(header_json.to_string());
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.to_string());
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac =
        HmacSha256::new_from_slice(jwt.secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    let token = format!("{signing_input}.{sig_b64}");
    Ok(IssuedToken {
        token_hash: hash_token(&token),
        token,
        expires_at_ms: exp.timestamp_millis(),
    })
}

/// Checks signature and registered claims, returning the `userId` claim.
pub fn verify_jwt_hs256(token: &str, secret: &str) -> Result<String, AuthError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let payload_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let sig_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    if parts.next().is_some() {
        return Err(AuthError::InvalidToken);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let header_json: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| AuthError::InvalidToken)?;
    if header_json.get("alg").and_then(|v| v.as_str()) != Some("HS256") {
        return Err(AuthError::InvalidToken);
    }

    let sig_bytes = URL_SAFE_NO_PAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    mac.verify_slice(&sig_bytes)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let payload_json: serde_json::Value =
        serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::InvalidToken)?;

    validate_registered_claims(&payload_json)?;

    payload_json
        .get("userId")
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or(AuthError::InvalidToken)
}

fn validate_registered_claims(payload: &serde_json::Value) -> Result<(), AuthError> {
    let now = Utc::now().timestamp();

    if let Some(exp) = payload.get("exp").and_then(|value| value.as_i64()) {
        if now >= exp {
            return Err(AuthError::InvalidToken);
        }
    }

    if let Some(nbf) = payload.get("nbf").and_then(|value| value.as_i64()) {
        if now < nbf {
            return Err(AuthError::InvalidToken);
        }
    }

    Ok(())
}

pub async fn verify_request_token(
    proxy: &DatabaseProxy,
    jwt: &JwtConfig,
    token: &str,
) -> Result<AuthUser, AuthError> {
    let user_id = verify_jwt_hs256(token, &jwt.secret)?;
    let token_hash = hash_token(token);

    let Some(row) = session::find_session(proxy.pool(), &token_hash).await? else {
        return Err(AuthError::InvalidToken);
    };
    if row.user_id != user_id || row.expires_at < Utc::now().timestamp_millis() {
        return Err(AuthError::InvalidToken);
    }

    user::get_user_by_id(proxy.pool(), &user_id)
        .await?
        .map(AuthUser::from)
        .ok_or(AuthError::InvalidToken)
}

/// Same as `verify_request_token`, consulting the session cache first.
/// The signature is always re-checked so a cached entry cannot outlive its token.
pub async fn verify_request_token_cached(
    proxy: &DatabaseProxy,
    jwt: &JwtConfig,
    token: &str,
    cache: Option<&RedisCache>,
) -> Result<AuthUser, AuthError> {
    let Some(cache) = cache else {
        return verify_request_token(proxy, jwt, token).await;
    };

    let user_id = verify_jwt_hs256(token, &jwt.secret)?;
    let key = session_key(&hash_token(token));
    if let Some(cached) = cache.get::<AuthUser>(&key).await {
        if cached.id == user_id {
            return Ok(cached);
        }
    }

    let user = verify_request_token(proxy, jwt, token).await?;
    cache.set(&key, &user, SESSION_TTL).await;
    Ok(user)
}

pub fn parse_expires_in_ms(value: &str) -> Result<i64, AuthError> {
    let trimmed = value.trim();
    let Some((unit_at, unit)) = trimmed.char_indices().last() else {
        return Err(AuthError::InvalidExpiresIn);
    };
    let amount: i64 = trimmed[..unit_at].parse().map_err(|_| AuthError::InvalidExpiresIn)?;
    if amount <= 0 {
        return Err(AuthError::InvalidExpiresIn);
    }

    let unit_ms: i64 = match unit {
        's' => 1000,
        'm' => 60 * 1000,
        'h' => 60 * 60 * 1000,
        'd' => 24 * 60 * 60 * 1000,
        _ => return Err(AuthError::InvalidExpiresIn),
    };
    amount.checked_mul(unit_ms).ok_or(AuthError::InvalidExpiresIn)
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
