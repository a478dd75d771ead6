//! Authentication module
//!
//! - GitHub OAuth code exchange
//! - JWT access tokens carrying scopes (`user`, `admin`)

mod github;
mod jwt;
mod service;

pub use github::{GithubClient, GithubUser};
pub use jwt::{generate_access_token, verify_token, Claims, JwtError, Scope};
pub use service::{AuthError, AuthService, GithubLoginRequest, LoginRole, TokenResponse};
