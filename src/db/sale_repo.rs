// src/db/sale_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::{
        analytics::{SaleFact, SaleLineFact},
        sale::{NewSale, NewSaleItem, Sale, SaleFilter, SaleItem},
    },
};

#[derive(Clone)]
pub struct SaleRepository {
    pool: PgPool,
}

impl SaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA (sempre dentro da transação da venda)
    // =========================================================================

    pub async fn insert_sale<'e, E>(&self, executor: E, sale: &NewSale) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let t = &sale.totals;
        let created = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                sale_number, subtotal, tax, discount_amount, total, total_cost, total_profit,
                cash_received, change_given, customer_id, customer_name, customer_phone,
                customer_email, user_id, staff_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(&sale.sale_number)
        .bind(t.subtotal)
        .bind(t.tax)
        .bind(t.discount_amount)
        .bind(t.total)
        .bind(t.total_cost)
        .bind(t.total_profit)
        .bind(t.cash_received)
        .bind(t.change)
        .bind(sale.customer_id)
        .bind(sale.customer_name.as_deref())
        .bind(sale.customer_phone.as_deref())
        .bind(sale.customer_email.as_deref())
        .bind(sale.user_id)
        .bind(sale.staff_id)
        .bind(sale.created_at)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("Número de venda duplicado: {}", sale.sale_number)))?;

        Ok(created)
    }

    pub async fn insert_sale_item<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        line_no: i32,
        item: &NewSaleItem,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (
                sale_id, line_no, product_id, product_name, unit_price, discount,
                final_price, quantity, size, subtotal, cost, profit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(line_no)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.unit_price)
        .bind(item.discount)
        .bind(item.final_price)
        .bind(item.quantity)
        .bind(item.size.as_deref())
        .bind(item.subtotal)
        .bind(item.cost)
        .bind(item.profit)
        .fetch_one(executor)
        .await?;

        Ok(created)
    }

    /// Única alteração permitida numa venda: anexar a conta do usuário.
    /// Não sobrescreve um vínculo existente com outra conta.
    pub async fn link_user<'e, E>(&self, executor: E, sale_id: Uuid, user_id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET user_id = $2
            WHERE id = $1 AND (user_id IS NULL OR user_id = $2)
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    /// Trava a venda: devoluções concorrentes da mesma venda ficam em fila.
    pub async fn get_sale_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn list_items<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = $1 ORDER BY line_no ASC",
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn find_sale(&self, id: Uuid) -> Result<Option<Sale>, AppError> {
        self.get_sale(&self.pool, id).await
    }

    pub async fn find_items(&self, sale_id: Uuid) -> Result<Vec<SaleItem>, AppError> {
        self.list_items(&self.pool, sale_id).await
    }

    pub async fn list_sales(&self, filter: &SaleFilter, page: &PageParams) -> Result<(Vec<Sale>, i64), AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM sales
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        Ok((sales, total))
    }

    pub async fn list_sales_by_user(&self, user_id: Uuid, page: &PageParams) -> Result<(Vec<Sale>, i64), AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((sales, total))
    }

    // =========================================================================
    //  FATOS PARA RELATÓRIOS
    // =========================================================================

    pub async fn sale_facts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<SaleFact>, AppError> {
        let facts = sqlx::query_as::<_, SaleFact>(
            r#"
            SELECT
                s.created_at, s.subtotal, s.tax, s.discount_amount, s.total,
                s.total_cost, s.total_profit,
                COALESCE((SELECT SUM(i.quantity) FROM sale_items i WHERE i.sale_id = s.id), 0)::BIGINT AS items_sold
            FROM sales s
            WHERE s.created_at >= $1 AND s.created_at < $2
            ORDER BY s.created_at ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(facts)
    }

    pub async fn sale_line_facts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<SaleLineFact>, AppError> {
        let facts = sqlx::query_as::<_, SaleLineFact>(
            r#"
            SELECT i.product_id, i.product_name, i.quantity, i.subtotal, i.profit
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            WHERE s.created_at >= $1 AND s.created_at < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(facts)
    }
}
