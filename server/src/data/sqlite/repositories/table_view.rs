//! Saved table view repository for SQLite operations

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::data::sqlite::SqliteError;
use crate::table::ViewData;

/// Views of one user and table key, ordered by alias
pub async fn get_views(
    pool: &SqlitePool,
    username: &str,
    table_key: &str,
) -> Result<Vec<ViewData>, SqliteError> {
    let rows: Vec<(String, String, bool)> = sqlx::query_as(
        r#"
        SELECT view_alias, view_data, last_active
        FROM table_views
        WHERE username = ? AND table_key = ?
        ORDER BY view_alias
        "#,
    )
    .bind(username)
    .bind(table_key)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(view_alias, view_data, last_active)| ViewData {
            view_alias,
            view_data,
            last_active,
        })
        .collect())
}

/// Replace the stored views of a user and table key.
///
/// Runs in one transaction: every given view is upserted by alias, then
/// aliases not present in `views` are deleted.
pub async fn save_views(
    pool: &SqlitePool,
    username: &str,
    table_key: &str,
    views: &[ViewData],
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for view in views {
        sqlx::query(
            r#"
            INSERT INTO table_views (username, table_key, view_alias, view_data, last_active, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (username, table_key, view_alias) DO UPDATE SET
                view_data = excluded.view_data,
                last_active = excluded.last_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(username)
        .bind(table_key)
        .bind(&view.view_alias)
        .bind(&view.view_data)
        .bind(view.last_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    let mut delete: QueryBuilder<Sqlite> =
        QueryBuilder::new("DELETE FROM table_views WHERE username = ");
    delete.push_bind(username);
    delete.push(" AND table_key = ");
    delete.push_bind(table_key);
    if !views.is_empty() {
        delete.push(" AND view_alias NOT IN (");
        let mut aliases = delete.separated(", ");
        for view in views {
            aliases.push_bind(view.view_alias.as_str());
        }
        aliases.push_unseparated(")");
    }
    let removed = delete.build().execute(&mut *tx).await?.rows_affected();

    tx.commit().await?;

    tracing::debug!(
        username,
        table_key,
        saved = views.len(),
        removed,
        "Saved table views"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::migrations::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    fn view(alias: &str, data: &str, active: bool) -> ViewData {
        ViewData {
            view_alias: alias.to_string(),
            view_data: data.to_string(),
            last_active: active,
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let pool = pool().await;
        assert!(get_views(&pool, "ana", "employees").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_orders_by_alias() {
        let pool = pool().await;
        save_views(
            &pool,
            "ana",
            "employees",
            &[view("zeta", "{}", false), view("alpha", "{\"a\":1}", true)],
        )
        .await
        .unwrap();

        let views = get_views(&pool, "ana", "employees").await.unwrap();
        assert_eq!(
            views,
            vec![view("alpha", "{\"a\":1}", true), view("zeta", "{}", false)]
        );
    }

    #[tokio::test]
    async fn test_save_upserts_and_deletes_absent() {
        let pool = pool().await;
        save_views(
            &pool,
            "ana",
            "employees",
            &[view("a", "1", true), view("b", "2", false), view("c", "3", false)],
        )
        .await
        .unwrap();

        save_views(
            &pool,
            "ana",
            "employees",
            &[view("b", "22", true), view("d", "4", false)],
        )
        .await
        .unwrap();

        let views = get_views(&pool, "ana", "employees").await.unwrap();
        assert_eq!(views, vec![view("b", "22", true), view("d", "4", false)]);
    }

    #[tokio::test]
    async fn test_save_empty_clears_only_that_key() {
        let pool = pool().await;
        save_views(&pool, "ana", "employees", &[view("a", "1", false)])
            .await
            .unwrap();
        save_views(&pool, "ana", "orders", &[view("a", "1", false)])
            .await
            .unwrap();
        save_views(&pool, "bob", "employees", &[view("a", "1", false)])
            .await
            .unwrap();

        save_views(&pool, "ana", "employees", &[]).await.unwrap();

        assert!(get_views(&pool, "ana", "employees").await.unwrap().is_empty());
        assert_eq!(get_views(&pool, "ana", "orders").await.unwrap().len(), 1);
        assert_eq!(get_views(&pool, "bob", "employees").await.unwrap().len(), 1);
    }
}
