use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::startup::AppState;

/// Claims of the hosted auth provider's access token. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Validates HS256 bearer tokens signed with the provider's shared secret.
#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &Secret<String>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Validate and decode an access token
    pub fn validate(&self, token: &str) -> Result<AuthUser, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|_| {
            AppError::Unauthorized(anyhow::anyhow!("Token subject is not a user id"))
        })?;

        Ok(AuthUser {
            user_id,
            email: token_data.claims.email,
        })
    }
}

/// Middleware to require authentication
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let user = state.jwt.validate(token)?;
    tracing::Span::current().record("user_id", tracing::field::display(user.user_id));

    // Store the caller so handlers can extract it
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Authenticated caller; every query is scoped to `user_id`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn token(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    fn validator() -> JwtValidator {
        JwtValidator::new(&Secret::new(SECRET.to_string()), Some("authenticated"))
    }

    #[test]
    fn accepts_valid_token() {
        let user_id = Uuid::new_v4();
        let jwt = token(
            json!({"sub": user_id.to_string(), "exp": future_exp(), "aud": "authenticated", "email": "ana@example.com"}),
            SECRET,
        );
        let user = validator().validate(&jwt).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let jwt = token(
            json!({"sub": Uuid::new_v4().to_string(), "exp": future_exp(), "aud": "authenticated"}),
            "other-secret",
        );
        assert!(matches!(validator().validate(&jwt), Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let jwt = token(
            json!({"sub": Uuid::new_v4().to_string(), "exp": 1_000_000, "aud": "authenticated"}),
            SECRET,
        );
        assert!(validator().validate(&jwt).is_err());
    }

    #[test]
    fn rejects_wrong_audience() {
        let jwt = token(
            json!({"sub": Uuid::new_v4().to_string(), "exp": future_exp(), "aud": "anon"}),
            SECRET,
        );
        assert!(validator().validate(&jwt).is_err());
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let jwt = token(
            json!({"sub": "service-account", "exp": future_exp(), "aud": "authenticated"}),
            SECRET,
        );
        assert!(matches!(validator().validate(&jwt), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn audience_check_can_be_disabled() {
        let v = JwtValidator::new(&Secret::new(SECRET.to_string()), None);
        let jwt = token(json!({"sub": Uuid::new_v4().to_string(), "exp": future_exp()}), SECRET);
        assert!(v.validate(&jwt).is_ok());
    }
}
