// src/db/counter_repo.rs

use sqlx::{Executor, Postgres};
use crate::common::error::AppError;

// Contadores atômicos por escopo ("SALE-2026", "RET-2026", ...).
// Sempre usado dentro da transação do documento numerado: se ela abortar,
// o número volta junto e a linha fica travada até o commit.
#[derive(Clone, Default)]
pub struct CounterRepository;

impl CounterRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn next_value<'e, E>(&self, executor: E, scope: &str) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO document_counters (scope, last_value)
            VALUES ($1, 1)
            ON CONFLICT (scope)
            DO UPDATE SET last_value = document_counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(scope)
        .fetch_one(executor)
        .await?;

        Ok(value)
    }
}
