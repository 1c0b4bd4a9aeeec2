/*!
 * # Authentication and Authorization
 *
 * Bearer-token validation for the storefront API. Tokens are issued by an
 * external identity provider; this module only verifies them and exposes the
 * authenticated identity to handlers.
 *
 * Role-based access uses a single staff role: staff accounts manage the
 * catalog and see all orders, everyone else is a customer scoped to their
 * own data.
 */

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Role granted to back-office accounts
pub const ROLE_STAFF: &str = "staff";

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (account ID)
    pub name: Option<String>, // Account holder's name
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub jti: Option<String>, // JWT ID
    pub iat: i64,            // Issued at time
    pub exp: i64,            // Expiration time
}

/// Authenticated identity extracted from a verified JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub account_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_staff(&self) -> bool {
        self.has_role(ROLE_STAFF)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Expired authentication token")]
    ExpiredToken,

    #[error("Insufficient permissions")]
    Forbidden,
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));
        (status, body).into_response()
    }
}

/// Validates bearer tokens against the shared secret.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(jwt_secret: &str) -> Self {
        // Audience/issuer are asserted by the external identity provider;
        // the API only checks signature and expiry.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verifies a token and builds the authenticated identity
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => {
                        debug!("token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })?;

        let claims = token_data.claims;
        let account_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser {
            account_id,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
        })
    }
}

fn bearer_token(parts_or_headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let value = parts_or_headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)
}

/// Middleware that verifies the bearer token and stores the identity in
/// request extensions for downstream extractors.
pub async fn auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())?;
    let user = auth_service.validate_token(token)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware that rejects identities lacking the required role.
/// Must run after [`auth_middleware`].
pub async fn require_role(role: &'static str, request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.has_role(role) => next.run(request).await,
        Some(_) => AuthError::Forbidden.into_response(),
        None => AuthError::MissingToken.into_response(),
    }
}

/// Extractor yielding the authenticated identity placed by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AuthError::MissingToken)
    }
}

/// Router helpers that attach the auth layers
pub trait AuthRouterExt<S> {
    /// Requires a valid bearer token
    fn with_auth(self, auth_service: AuthService) -> Self;
    /// Requires a valid bearer token carrying the given role
    fn with_role(self, auth_service: AuthService, role: &'static str) -> Self;
}

impl<S> AuthRouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth_service: AuthService) -> Self {
        self.layer(middleware::from_fn_with_state(
            auth_service,
            auth_middleware,
        ))
    }

    fn with_role(self, auth_service: AuthService, role: &'static str) -> Self {
        self.layer(middleware::from_fn(move |request, next| {
            require_role(role, request, next)
        }))
        .layer(middleware::from_fn_with_state(
            auth_service,
            auth_middleware,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn make_token(sub: &str, roles: Vec<String>, exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            name: Some("Test User".to_string()),
            email: Some("test@example.com".to_string()),
            roles,
            jti: Some(Uuid::new_v4().to_string()),
            iat: now,
            exp: now + exp_offset_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_auth_user() {
        let service = AuthService::new(SECRET);
        let account_id = Uuid::new_v4();
        let token = make_token(&account_id.to_string(), vec![ROLE_STAFF.to_string()], 3600);

        let user = service.validate_token(&token).unwrap();
        assert_eq!(user.account_id, account_id);
        assert!(user.is_staff());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = AuthService::new(SECRET);
        let token = make_token(&Uuid::new_v4().to_string(), vec![], -3600);

        match service.validate_token(&token) {
            Err(AuthError::ExpiredToken) => {}
            other => panic!("expected expired token error, got {:?}", other),
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let service = AuthService::new("another-secret-another-secret-yes");
        let token = make_token(&Uuid::new_v4().to_string(), vec![], 3600);

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let service = AuthService::new(SECRET);
        let token = make_token("user-42", vec![], 3600);

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn non_staff_user_lacks_staff_role() {
        let service = AuthService::new(SECRET);
        let token = make_token(&Uuid::new_v4().to_string(), vec!["customer".into()], 3600);

        let user = service.validate_token(&token).unwrap();
        assert!(!user.is_staff());
    }
}
