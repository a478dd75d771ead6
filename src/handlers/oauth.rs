//! GitHub OAuth login

use axum::{extract::State, Json};

use super::extract::ValidatedJson;
use crate::auth::{GithubLoginRequest, TokenResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /v1/oauth/github - Exchange a GitHub code for an access token
pub async fn github_login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<GithubLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .auth_service
        .login_with_github(&req.code, req.role)
        .await?;

    Ok(Json(token))
}
