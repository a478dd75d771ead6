//! Authentication extractors
//!
//! Bearer token verification and scope checks. Failures render as JSON:API
//! error documents through [`ApiError`].

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::{AuthError, AuthService, JwtError, Scope};
use crate::error::ApiError;

/// Caller identified by a valid access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User id, or admin id for admin tokens
    pub subject_id: i64,
    pub scopes: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.iter().any(|s| s == scope.as_str())
    }

    fn require(self, scope: Scope) -> Result<Self, ApiError> {
        if self.has_scope(scope) {
            Ok(self)
        } else {
            Err(ApiError::Forbidden(format!(
                "Scope '{}' required",
                scope.as_str()
            )))
        }
    }
}

/// Extractor for authenticated callers
///
/// ```rust,ignore
/// async fn handler(caller: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", caller.subject_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = auth_service
            .validate_access_token(bearer.token())
            .map_err(|e| match e {
                AuthError::Token(JwtError::TokenExpired) => {
                    ApiError::Unauthorized("Token has expired".to_string())
                }
                _ => ApiError::Unauthorized("Invalid token".to_string()),
            })?;

        let subject_id = claims
            .subject_id()
            .map_err(|_| ApiError::Unauthorized("Invalid subject in token".to_string()))?;

        Ok(AuthenticatedUser {
            subject_id,
            scopes: claims.scopes,
        })
    }
}

/// Caller holding the `user` scope; `user_id` is the token subject
#[derive(Debug, Clone)]
pub struct UserScope {
    pub user_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for UserScope
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = AuthenticatedUser::from_request_parts(parts, state)
            .await?
            .require(Scope::User)?;
        Ok(UserScope {
            user_id: caller.subject_id,
        })
    }
}

/// Caller holding the `admin` scope
#[derive(Debug, Clone)]
pub struct AdminScope(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminScope
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = AuthenticatedUser::from_request_parts(parts, state)
            .await?
            .require(Scope::Admin)?;
        Ok(AdminScope(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_scope() {
        let caller = AuthenticatedUser {
            subject_id: 3,
            scopes: vec!["user".to_string()],
        };
        assert!(caller.has_scope(Scope::User));
        assert!(caller.clone().require(Scope::User).is_ok());
        assert!(matches!(
            caller.require(Scope::Admin),
            Err(ApiError::Forbidden(_))
        ));
    }
}
