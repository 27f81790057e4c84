use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::user::{Capability, Claims, Role};
use crate::state::AppState;

pub fn issue_token(user_id: &str, role: Role, config: &AppConfig) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: (Utc::now().timestamp() + config.token_ttl_secs) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
}

pub fn decode_token(token: &str, config: &AppConfig) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid bearer token and exposes the decoded
/// claims to handlers as `Extension<Claims>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers()).ok_or(AppError::AuthError)?;
    let claims = decode_token(token, &state.config).map_err(|e| {
        tracing::warn!("rejected bearer token: {}", e);
        AppError::AuthError
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// The single authorization check: the caller's role must grant `capability`.
pub fn require(claims: &Claims, capability: Capability) -> Result<()> {
    if claims.role.can(capability) {
        Ok(())
    } else {
        tracing::warn!("user {} ({:?}) denied {:?}", claims.sub, claims.role, capability);
        Err(AppError::forbidden("Access denied. Admin only."))
    }
}
