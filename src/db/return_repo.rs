// src/db/return_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::{
        analytics::RefundFact,
        returns::{Return, ReturnFilter, ReturnItem, ReturnStatus},
    },
};

// Item de devolução já validado contra a venda
#[derive(Debug, Clone, PartialEq)]
pub struct NewReturnItem {
    pub sale_item_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub unit_refund: Decimal,
    pub refund_amount: Decimal,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct ReturnRepository {
    pool: PgPool,
}

impl ReturnRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_return<'e, E>(
        &self,
        executor: E,
        return_number: &str,
        sale_id: Uuid,
        total_refund: Decimal,
        reason: Option<&str>,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<Return, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, Return>(
            r#"
            INSERT INTO returns (return_number, sale_id, total_refund, reason, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(return_number)
        .bind(sale_id)
        .bind(total_refund)
        .bind(reason)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    pub async fn insert_return_item<'e, E>(
        &self,
        executor: E,
        return_id: Uuid,
        item: &NewReturnItem,
    ) -> Result<ReturnItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, ReturnItem>(
            r#"
            INSERT INTO return_items (
                return_id, sale_item_id, product_id, product_name, size,
                quantity, unit_refund, refund_amount, reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(return_id)
        .bind(item.sale_item_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.size.as_deref())
        .bind(item.quantity)
        .bind(item.unit_refund)
        .bind(item.refund_amount)
        .bind(item.reason.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Quanto de cada linha da venda já está comprometido em devoluções não rejeitadas.
    pub async fn returned_quantities<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
    ) -> Result<Vec<(Uuid, i64)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT ri.sale_item_id, SUM(ri.quantity)::BIGINT
            FROM return_items ri
            JOIN returns r ON r.id = ri.return_id
            WHERE r.sale_id = $1 AND r.status <> 'rejected'
            GROUP BY ri.sale_item_id
            "#,
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn get_return(&self, id: Uuid) -> Result<Option<Return>, AppError> {
        let found = sqlx::query_as::<_, Return>("SELECT * FROM returns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found)
    }

    /// Trava a devolução: duas aprovações simultâneas ficam em fila.
    pub async fn get_return_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Return>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found = sqlx::query_as::<_, Return>("SELECT * FROM returns WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(found)
    }

    pub async fn list_items<'e, E>(&self, executor: E, return_id: Uuid) -> Result<Vec<ReturnItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ReturnItem>("SELECT * FROM return_items WHERE return_id = $1")
            .bind(return_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn find_items(&self, return_id: Uuid) -> Result<Vec<ReturnItem>, AppError> {
        self.list_items(&self.pool, return_id).await
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ReturnStatus,
        stock_restored: bool,
        reviewed_by: Uuid,
        notes: Option<&str>,
    ) -> Result<Return, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Return>(
            r#"
            UPDATE returns SET
                status = $2,
                stock_restored = $3,
                reviewed_by = $4,
                reviewed_at = NOW(),
                notes = COALESCE($5, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(stock_restored)
        .bind(reviewed_by)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(updated)
    }

    pub async fn list_returns(&self, filter: &ReturnFilter, page: &PageParams) -> Result<(Vec<Return>, i64), AppError> {
        let returns = sqlx::query_as::<_, Return>(
            r#"
            SELECT * FROM returns
            WHERE ($1::return_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM returns WHERE ($1::return_status IS NULL OR status = $1)",
        )
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((returns, total))
    }

    // Devoluções aprovadas no período, com o custo das peças que voltaram
    pub async fn refund_facts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<RefundFact>, AppError> {
        let facts = sqlx::query_as::<_, RefundFact>(
            r#"
            SELECT
                ri.refund_amount,
                ROUND(si.cost / si.quantity * ri.quantity, 2) AS returned_cost
            FROM return_items ri
            JOIN returns r ON r.id = ri.return_id
            JOIN sale_items si ON si.id = ri.sale_item_id
            WHERE r.status = 'approved'
              AND r.reviewed_at >= $1 AND r.reviewed_at < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(facts)
    }
}
