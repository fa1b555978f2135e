// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;
use crate::{
    common::{error::AppError, pagination::PageParams},
    models::inventory::{StockChange, StockMovement},
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra uma movimentação no livro-razão (auditoria). Nunca é alterada depois.
    pub async fn record_stock_movement<'e, E>(
        &self,
        executor: E,
        change: &StockChange,
        staff_id: Option<Uuid>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (
                product_id, size, quantity_change, reason, reference_id, staff_id, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(change.product_id)
        .bind(change.size.as_deref())
        .bind(change.quantity_change)
        .bind(change.reason)
        .bind(change.reference_id)
        .bind(staff_id)
        .bind(change.notes.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }

    pub async fn list_movements(
        &self,
        product_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<StockMovement>, i64), AppError> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE product_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(product_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_movements WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((movements, total))
    }

    // Movimentações ligadas a uma venda ou devolução
    pub async fn movements_for_reference(&self, reference_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE reference_id = $1 ORDER BY created_at ASC",
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }
}
