//! User service layer

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::model::{
    CreateUserRequest, ListUsersQuery, UpdateUserRequest, User, UserWithRelations, USER_COLUMNS,
};
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{ilike_pattern, push_order_and_page, push_time_range};

const DEFAULT_PAGE_SIZE: i64 = 100;

/// User service for account management
#[derive(Clone)]
pub struct UserService {
    db_pool: PgPool,
}

impl UserService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// List users (soft-deleted users excluded)
    pub async fn list_users(&self, query: &ListUsersQuery) -> ApiResult<Vec<User>> {
        let users = build_list_query(query)
            .build_query_as::<User>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(users)
    }

    /// Get a live user row
    pub async fn get_user(&self, user_id: i64) -> ApiResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| user_not_found(user_id))
    }

    /// Get a user with trip and transaction ids for relationships
    pub async fn get_user_with_relations(&self, user_id: i64) -> ApiResult<UserWithRelations> {
        let user = self.get_user(user_id).await?;

        let trip_ids =
            sqlx::query_scalar::<_, i64>("SELECT id FROM trips WHERE user_id = $1 ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.db_pool)
                .await?;

        let transaction_ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM transactions WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(UserWithRelations {
            user,
            trip_ids,
            transaction_ids,
        })
    }

    /// Look up a live user by GitHub login
    pub async fn find_by_github_login(&self, github_login: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE github_login = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(github_login)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(user)
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> ApiResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, email, github_login, use_prepay, meta_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&request.full_name)
        .bind(&request.email)
        .bind(&request.github_login)
        .bind(request.use_prepay)
        .bind(&request.meta_data)
        .fetch_one(&self.db_pool)
        .await
        .map_err(map_conflict)?;

        tracing::info!(user_id = user.id, github_login = %user.github_login, "User created");

        Ok(user)
    }

    /// Find the user for a GitHub login, creating it on first login
    pub async fn find_or_create_by_github_login(
        &self,
        github_login: &str,
        full_name: Option<String>,
        email: Option<String>,
    ) -> ApiResult<User> {
        if let Some(user) = self.find_by_github_login(github_login).await? {
            return Ok(user);
        }

        let created = self
            .create_user(CreateUserRequest {
                full_name,
                email,
                github_login: github_login.to_string(),
                use_prepay: false,
                meta_data: None,
            })
            .await;

        match created {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent first login
            Err(ApiError::Conflict(_)) => self
                .find_by_github_login(github_login)
                .await?
                .ok_or_else(|| ApiError::Conflict("GitHub login is already taken".to_string())),
            Err(e) => Err(e),
        }
    }

    /// Partial update; only provided fields change
    pub async fn update_user(&self, user_id: i64, request: UpdateUserRequest) -> ApiResult<User> {
        if request.is_empty() {
            return self.get_user(user_id).await;
        }

        build_update_query(user_id, request)
            .build_query_as::<User>()
            .fetch_optional(&self.db_pool)
            .await
            .map_err(map_conflict)?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Soft delete: scrub personal data and close the account.
    ///
    /// Refused while the user has an open trip, since ending it debits the
    /// balance this would zero.
    pub async fn delete_user(&self, user_id: i64) -> ApiResult<()> {
        let mut tx = self.db_pool.begin().await?;

        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

        let open_trip = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM trips WHERE user_id = $1 AND end_time IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(trip_id) = open_trip {
            return Err(ApiError::Conflict(format!(
                "User {} has an open trip ({}); end it before deleting the account",
                user_id, trip_id
            )));
        }

        sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(), updated_at = NOW(),
                full_name = NULL,
                email = 'deleted_' || id || '@deleted.com',
                github_login = 'deleted_' || id,
                balance = 0, use_prepay = FALSE, meta_data = NULL
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id, "User soft deleted");

        Ok(())
    }
}

fn user_not_found(user_id: i64) -> ApiError {
    ApiError::NotFound(format!("User with ID {} not found", user_id))
}

fn map_conflict(err: sqlx::Error) -> ApiError {
    if is_unique_violation(&err, "users_github_login_key") {
        ApiError::Conflict("A user with this GitHub login already exists".to_string())
    } else if is_unique_violation(&err, "users_email_key") {
        ApiError::Conflict("A user with this email already exists".to_string())
    } else {
        err.into()
    }
}

fn build_list_query(query: &ListUsersQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM users WHERE deleted_at IS NULL",
        USER_COLUMNS
    ));

    if let Some(name) = &query.name_search {
        builder.push(" AND full_name ILIKE ");
        builder.push_bind(ilike_pattern(name));
    }
    if let Some(email) = &query.email_search {
        builder.push(" AND email ILIKE ");
        builder.push_bind(ilike_pattern(email));
    }
    if let Some(login) = &query.github_login_search {
        builder.push(" AND github_login ILIKE ");
        builder.push_bind(ilike_pattern(login));
    }
    if let Some(gt) = query.balance_gt {
        builder.push(" AND balance > ");
        builder.push_bind(gt);
    }
    if let Some(lt) = query.balance_lt {
        builder.push(" AND balance < ");
        builder.push_bind(lt);
    }
    match query.is_eligible {
        Some(true) => {
            builder.push(" AND (use_prepay = FALSE OR balance > ");
            builder.push_bind(Decimal::ZERO);
            builder.push(")");
        }
        Some(false) => {
            builder.push(" AND use_prepay = TRUE AND balance <= ");
            builder.push_bind(Decimal::ZERO);
        }
        None => {}
    }
    push_time_range(&mut builder, "created_at", query.created_at_gt, query.created_at_lt);
    push_time_range(&mut builder, "updated_at", query.updated_at_gt, query.updated_at_lt);

    push_order_and_page(
        &mut builder,
        query.order_by.unwrap_or_default().column(),
        query.order_direction.unwrap_or_default(),
        query.limit,
        query.offset,
        DEFAULT_PAGE_SIZE,
    );

    builder
}

fn build_update_query(user_id: i64, request: UpdateUserRequest) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

    if let Some(full_name) = request.full_name {
        builder.push(", full_name = ").push_bind(full_name);
    }
    if let Some(email) = request.email {
        builder.push(", email = ").push_bind(email);
    }
    if let Some(github_login) = request.github_login {
        builder.push(", github_login = ").push_bind(github_login);
    }
    if let Some(use_prepay) = request.use_prepay {
        builder.push(", use_prepay = ").push_bind(use_prepay);
    }
    if let Some(meta_data) = request.meta_data {
        builder.push(", meta_data = ").push_bind(meta_data);
    }

    builder
        .push(" WHERE id = ")
        .push_bind(user_id)
        .push(" AND deleted_at IS NULL RETURNING ")
        .push(USER_COLUMNS);

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;
    use crate::user::UserSortField;

    #[test]
    fn test_list_query_eligibility_filter() {
        let query = ListUsersQuery {
            is_eligible: Some(false),
            name_search: Some("ann".to_string()),
            order_by: Some(UserSortField::Balance),
            order_direction: Some(SortDirection::Asc),
            ..Default::default()
        };
        let builder = build_list_query(&query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE deleted_at IS NULL AND full_name ILIKE $1"));
        assert!(sql.contains(" AND use_prepay = TRUE AND balance <= $2"));
        assert!(sql.ends_with("ORDER BY balance ASC, id ASC LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn test_update_query_only_sets_given_fields() {
        let request = UpdateUserRequest {
            full_name: Some("Anna".to_string()),
            use_prepay: Some(true),
            ..Default::default()
        };
        let builder = build_update_query(7, request);
        let sql = builder.sql();

        assert!(sql.starts_with(
            "UPDATE users SET updated_at = NOW(), full_name = $1, use_prepay = $2 WHERE id = $3"
        ));
        assert!(!sql.contains("email ="));
    }
}
