//! Authentication service
//!
//! GitHub OAuth login for users and admins, and access token checks.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use validator::Validate;

use super::github::{GithubClient, GithubUser};
use super::jwt::{generate_access_token, verify_token, Claims, JwtError, Scope};
use crate::error::ApiError;
use crate::admin::AdminService;
use crate::user::UserService;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    CodeExchangeFailed(String),

    #[error("Could not read GitHub user: {0}")]
    GithubUserFailed(String),

    #[error("GitHub unreachable: {0}")]
    GithubUnavailable(String),

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::CodeExchangeFailed(_) | AuthError::GithubUserFailed(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::GithubUnavailable(_) => ApiError::ExternalServiceError(err.to_string()),
            AuthError::AdminNotFound => ApiError::NotFound(err.to_string()),
            AuthError::Token(e) => ApiError::InternalError(e.to_string()),
            AuthError::Api(e) => e,
        }
    }
}

/// Who is logging in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginRole {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GithubLoginRequest {
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    #[serde(default)]
    pub role: LoginRole,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    admins: AdminService,
    users: UserService,
    github: GithubClient,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(
        db_pool: PgPool,
        github: GithubClient,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
    ) -> Self {
        Self {
            admins: AdminService::new(db_pool.clone()),
            users: UserService::new(db_pool),
            github,
            jwt_secret,
            access_token_ttl_seconds,
        }
    }

    /// Log in with a GitHub OAuth code
    pub async fn login_with_github(
        &self,
        code: &str,
        role: LoginRole,
    ) -> Result<TokenResponse, AuthError> {
        let github_token = self.github.exchange_code(code).await?;
        let github_user = self.github.fetch_user(&github_token).await?;

        let (subject_id, scopes) = match role {
            LoginRole::Admin => (self.admin_id(&github_user.login).await?, [Scope::Admin]),
            LoginRole::User => (self.user_id(github_user).await?, [Scope::User]),
        };

        let token = self.issue_token(subject_id, &scopes)?;

        tracing::info!(subject_id, role = ?role, "GitHub login succeeded");

        Ok(TokenResponse::bearer(token))
    }

    pub fn issue_token(&self, subject_id: i64, scopes: &[Scope]) -> Result<String, AuthError> {
        Ok(generate_access_token(
            subject_id,
            scopes,
            &self.jwt_secret,
            self.access_token_ttl_seconds,
        )?)
    }

    /// Validate an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(verify_token(token, &self.jwt_secret)?)
    }

    async fn admin_id(&self, github_login: &str) -> Result<i64, AuthError> {
        self.admins
            .find_id_by_github_login(github_login)
            .await?
            .ok_or(AuthError::AdminNotFound)
    }

    async fn user_id(&self, github_user: GithubUser) -> Result<i64, AuthError> {
        let user = self
            .users
            .find_or_create_by_github_login(&github_user.login, github_user.name, github_user.email)
            .await?;
        Ok(user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_auth_error_status() {
        let cases = [
            (AuthError::CodeExchangeFailed("bad code".into()), StatusCode::BAD_REQUEST),
            (AuthError::GithubUserFailed("401".into()), StatusCode::BAD_REQUEST),
            (AuthError::GithubUnavailable("timeout".into()), StatusCode::BAD_GATEWAY),
            (AuthError::AdminNotFound, StatusCode::NOT_FOUND),
            (
                AuthError::Api(ApiError::Conflict("taken".into())),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_login_request_defaults_to_user_role() {
        let req: GithubLoginRequest = serde_json::from_str(r#"{"code": "abc"}"#).unwrap();
        assert_eq!(req.role, LoginRole::User);

        let req: GithubLoginRequest =
            serde_json::from_str(r#"{"code": "abc", "role": "admin"}"#).unwrap();
        assert_eq!(req.role, LoginRole::Admin);

        assert!(serde_json::from_str::<GithubLoginRequest>(r#"{"code": "a", "role": "root"}"#).is_err());
    }

    #[tokio::test]
    async fn test_issue_and_validate_token() {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let github = GithubClient::new(crate::config::GithubConfig {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
        });
        let service = AuthService::new(pool, github, "secret".to_string(), 60);

        let token = service.issue_token(9, &[Scope::Admin]).unwrap();
        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.subject_id().unwrap(), 9);
        assert!(claims.has_scope(Scope::Admin));

        assert!(service.validate_access_token("garbage").is_err());
    }
}
