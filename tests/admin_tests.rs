//! Admin lookups against a real PostGIS database

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use bikeshare_server::admin::{AdminService, ListAdminsQuery};
    use bikeshare_server::db::run_migrations;
    use bikeshare_server::error::ApiError;

    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/bikeshare_test".to_string());
        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        run_migrations(&pool).await.expect("Failed to migrate");
        pool
    }

    async fn insert_admin(pool: &PgPool, login: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO admins (full_name, email, github_login) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(format!("Admin {}", login))
        .bind(format!("{}@example.com", login))
        .bind(login)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_get_and_search_admins() {
        let pool = setup_test_db().await;
        let admins = AdminService::new(pool.clone());
        let login = format!("ops{}", &Uuid::new_v4().simple().to_string()[..8]);
        let id = insert_admin(&pool, &login).await;

        let admin = admins.get_admin(id).await.unwrap();
        assert_eq!(admin.github_login, login);
        assert_eq!(admins.find_id_by_github_login(&login).await.unwrap(), Some(id));

        let found = admins
            .list_admins(&ListAdminsQuery {
                github_login_search: Some(login.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);

        assert!(matches!(admins.get_admin(-1).await, Err(ApiError::NotFound(_))));
    }
}
