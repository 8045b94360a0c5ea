//! Authentication middleware
//!
//! Bearer token verification. Tokens are issued by an external identity
//! service; the `sub` claim carries the acting user's id.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::Actor;

use crate::error::AppError;
use crate::AppState;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub actor_id: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
            .into_response();
    };

    let claims = match decode_jwt(bearer.token(), &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    let actor_id = match claims.sub.parse::<i64>() {
        Ok(id) => id,
        Err(_) => {
            return AppError::Unauthorized("Invalid user ID in token".to_string()).into_response()
        }
    };

    request.extensions_mut().insert(AuthUser { actor_id });

    next.run(request).await
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Extractor for the acting user, resolved against the ledger store
#[derive(Clone, Debug)]
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        state
            .store
            .get_actor(auth_user.actor_id)
            .await?
            .map(CurrentActor)
            .ok_or_else(|| AppError::not_found("User"))
    }
}
