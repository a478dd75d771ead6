//! Admin lookups

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::model::{Admin, ListAdminsQuery, ADMIN_COLUMNS};
use crate::error::{ApiError, ApiResult};
use crate::models::{ilike_pattern, push_order_and_page};

const DEFAULT_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct AdminService {
    db_pool: PgPool,
}

impl AdminService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn get_admin(&self, admin_id: i64) -> ApiResult<Admin> {
        sqlx::query_as::<_, Admin>(&format!("SELECT {} FROM admins WHERE id = $1", ADMIN_COLUMNS))
            .bind(admin_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Admin with ID {} not found", admin_id)))
    }

    /// Admin id for a GitHub login, used at login time
    pub async fn find_id_by_github_login(&self, github_login: &str) -> ApiResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM admins WHERE github_login = $1")
            .bind(github_login)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(id)
    }

    pub async fn list_admins(&self, query: &ListAdminsQuery) -> ApiResult<Vec<Admin>> {
        let admins = build_list_query(query)
            .build_query_as::<Admin>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(admins)
    }
}

fn build_list_query(query: &ListAdminsQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM admins WHERE TRUE", ADMIN_COLUMNS));

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminSortField;
    use crate::models::SortDirection;

    #[test]
    fn test_list_query_filters() {
        let query = ListAdminsQuery {
            email_search: Some("example".to_string()),
            github_login_search: Some("ada".to_string()),
            order_by: Some(AdminSortField::FullName),
            order_direction: Some(SortDirection::Asc),
            ..Default::default()
        };
        let builder = build_list_query(&query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE TRUE AND email ILIKE $1 AND github_login ILIKE $2"));
        assert!(sql.ends_with("ORDER BY full_name ASC, id ASC LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn test_list_query_defaults() {
        let builder = build_list_query(&ListAdminsQuery::default());
        assert!(builder
            .sql()
            .ends_with("FROM admins WHERE TRUE ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"));
    }
}
