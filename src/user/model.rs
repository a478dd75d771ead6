//! User models and request DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::models::{Relationship, Resource, SortDirection};

pub const RESOURCE_TYPE: &str = "users";

pub const USER_COLUMNS: &str = "id, full_name, email, github_login, balance, use_prepay, \
    meta_data, created_at, updated_at, deleted_at";

/// User row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub github_login: String,
    pub balance: Decimal,
    pub use_prepay: bool,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Prepay users need a positive balance to start a trip
    pub fn is_eligible(&self) -> bool {
        !self.use_prepay || self.balance > Decimal::ZERO
    }
}

#[derive(Debug, Serialize)]
pub struct UserAttributes {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub github_login: String,
    pub balance: Decimal,
    pub use_prepay: bool,
    pub is_eligible: bool,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn into_resource(self, base_url: &str) -> Resource<UserAttributes> {
        let link = format!("{}/v1/users/{}", base_url, self.id);
        Resource::new(
            RESOURCE_TYPE,
            self.id,
            UserAttributes {
                is_eligible: self.is_eligible(),
                full_name: self.full_name,
                email: self.email,
                github_login: self.github_login,
                balance: self.balance,
                use_prepay: self.use_prepay,
                meta_data: self.meta_data,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        )
        .with_link(link)
    }
}

/// A user together with the ids of their trips and transactions
#[derive(Debug, Clone)]
pub struct UserWithRelations {
    pub user: User,
    pub trip_ids: Vec<i64>,
    pub transaction_ids: Vec<i64>,
}

impl UserWithRelations {
    pub fn into_resource(self, base_url: &str) -> Resource<UserAttributes> {
        self.user
            .into_resource(base_url)
            .with_relationship("trips", Relationship::to_many("trips", self.trip_ids))
            .with_relationship(
                "transactions",
                Relationship::to_many("transactions", self.transaction_ids),
            )
    }
}

/// GitHub logins: 1-39 alphanumerics or single inner hyphens
pub fn validate_github_login(login: &str) -> Result<(), ValidationError> {
    let valid = !login.is_empty()
        && login.len() <= 39
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !login.starts_with('-')
        && !login.ends_with('-');

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("github_login");
        err.message = Some("must be a valid GitHub username".into());
        Err(err)
    }
}

/// Request DTO for creating a user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(custom = "validate_github_login")]
    pub github_login: String,
    #[serde(default)]
    pub use_prepay: bool,
    pub meta_data: Option<Value>,
}

/// Request DTO for a partial user update
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(custom = "validate_github_login")]
    pub github_login: Option<String>,
    pub use_prepay: Option<bool>,
    pub meta_data: Option<Value>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.github_login.is_none()
            && self.use_prepay.is_none()
            && self.meta_data.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    FullName,
    Email,
    Balance,
}

impl UserSortField {
    pub fn column(&self) -> &'static str {
        match self {
            UserSortField::CreatedAt => "created_at",
            UserSortField::UpdatedAt => "updated_at",
            UserSortField::FullName => "full_name",
            UserSortField::Email => "email",
            UserSortField::Balance => "balance",
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListUsersQuery {
    #[validate(length(min = 3))]
    pub name_search: Option<String>,
    #[validate(length(min = 3))]
    pub email_search: Option<String>,
    #[validate(length(min = 1, max = 39))]
    pub github_login_search: Option<String>,
    pub balance_gt: Option<Decimal>,
    pub balance_lt: Option<Decimal>,
    pub is_eligible: Option<bool>,
    pub created_at_gt: Option<DateTime<Utc>>,
    pub created_at_lt: Option<DateTime<Utc>>,
    pub updated_at_gt: Option<DateTime<Utc>>,
    pub updated_at_lt: Option<DateTime<Utc>>,
    pub order_by: Option<UserSortField>,
    pub order_direction: Option<SortDirection>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_login_validation() {
        assert!(validate_github_login("octocat").is_ok());
        assert!(validate_github_login("mona-lisa-1").is_ok());
        assert!(validate_github_login("").is_err());
        assert!(validate_github_login("-octocat").is_err());
        assert!(validate_github_login("octocat-").is_err());
        assert!(validate_github_login("octo cat").is_err());
        assert!(validate_github_login(&"a".repeat(40)).is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateUserRequest {
            full_name: Some("Anna".to_string()),
            email: Some("not-an-email".to_string()),
            github_login: "anna".to_string(),
            use_prepay: false,
            meta_data: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_is_eligible() {
        let mut user = User {
            id: 1,
            full_name: None,
            email: None,
            github_login: "anna".to_string(),
            balance: Decimal::ZERO,
            use_prepay: false,
            meta_data: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        assert!(user.is_eligible());

        user.use_prepay = true;
        assert!(!user.is_eligible());

        user.balance = Decimal::new(1, 2);
        assert!(user.is_eligible());
    }
}
