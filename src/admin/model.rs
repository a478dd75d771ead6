//! Admin rows and listing filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Resource, SortDirection};
use crate::user::validate_github_login;

pub const RESOURCE_TYPE: &str = "admins";

pub const ADMIN_COLUMNS: &str = "id, full_name, email, github_login, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Admin {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub github_login: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AdminAttributes {
    pub full_name: String,
    pub email: String,
    pub github_login: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// Admins have no per-id endpoint, so the resource carries no self link
    pub fn into_resource(self) -> Resource<AdminAttributes> {
        Resource::new(
            RESOURCE_TYPE,
            self.id,
            AdminAttributes {
                full_name: self.full_name,
                email: self.email,
                github_login: self.github_login,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminSortField {
    #[default]
    CreatedAt,
    FullName,
    GithubLogin,
}

impl AdminSortField {
    pub fn column(&self) -> &'static str {
        match self {
            AdminSortField::CreatedAt => "created_at",
            AdminSortField::FullName => "full_name",
            AdminSortField::GithubLogin => "github_login",
        }
    }
}

/// Query parameters for `GET /v1/admin/all`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListAdminsQuery {
    #[validate(length(min = 3))]
    pub name_search: Option<String>,
    #[validate(length(min = 3))]
    pub email_search: Option<String>,
    #[validate(custom = "validate_github_login")]
    pub github_login_search: Option<String>,
    pub order_by: Option<AdminSortField>,
    pub order_direction: Option<SortDirection>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}
