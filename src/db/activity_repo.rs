// src/db/activity_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use crate::{
    common::{error::AppError, pagination::PageParams},
    models::activity::{ActivityFilter, ActivityLog, NewActivity},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record<'e, E>(&self, executor: E, entry: NewActivity) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (actor_id, actor_email, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.actor_email)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.changes)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list(
        &self,
        filter: &ActivityFilter,
        page: &PageParams,
    ) -> Result<(Vec<ActivityLog>, i64), AppError> {
        let logs = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT * FROM activity_logs
            WHERE ($1::text IS NULL OR entity_type = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.entity_type.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activity_logs WHERE ($1::text IS NULL OR entity_type = $1)",
        )
        .bind(filter.entity_type.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((logs, total))
    }
}
