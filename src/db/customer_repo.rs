// src/db/customer_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::customer::{Customer, CustomerInput},
};

const PHONE_TAKEN: &str = "Já existe um cliente com este telefone.";

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CADASTRO (equipe)
    // =========================================================================

    pub async fn create_customer<'e, E>(&self, executor: E, input: &CustomerInput) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone, email, tags, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(input.phone.as_deref())
        .bind(input.email.as_deref())
        .bind(&input.tags)
        .bind(input.notes.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, PHONE_TAKEN))
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &CustomerInput,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = $2, phone = $3, email = $4, tags = $5, notes = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.phone.as_deref())
        .bind(input.email.as_deref())
        .bind(&input.tags)
        .bind(input.notes.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, PHONE_TAKEN))
    }

    pub async fn delete_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    pub async fn list_customers(
        &self,
        q: Option<&str>,
        page: &PageParams,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%'
                   OR phone ILIKE '%' || $1 || '%'
                   OR email ILIKE '%' || $1 || '%')
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(q)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%'
                   OR phone ILIKE '%' || $1 || '%'
                   OR email ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(q)
        .fetch_one(&self.pool)
        .await?;

        Ok((customers, total))
    }

    // =========================================================================
    //  ACUMULADOS DE COMPRA (fluxo de venda)
    // =========================================================================

    /// UPSERT pelo telefone: cria o cliente já com a primeira compra ou soma a
    /// compra aos acumulados. Atômico, então duas vendas simultâneas para o mesmo
    /// telefone novo não colidem.
    pub async fn upsert_purchase_by_phone<'e, E>(
        &self,
        executor: E,
        name: &str,
        phone: &str,
        email: Option<&str>,
        total: Decimal,
        points: i32,
        now: DateTime<Utc>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                name, phone, email, total_spent, purchase_count, last_purchase_date, loyalty_points
            )
            VALUES ($1, $2, $3, $4, 1, $5, $6)
            ON CONFLICT (phone) DO UPDATE SET
                total_spent = customers.total_spent + EXCLUDED.total_spent,
                purchase_count = customers.purchase_count + 1,
                last_purchase_date = EXCLUDED.last_purchase_date,
                loyalty_points = customers.loyalty_points + EXCLUDED.loyalty_points,
                email = COALESCE(customers.email, EXCLUDED.email),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(total)
        .bind(now)
        .bind(points)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }

    /// Cliente sem telefone: sempre um cadastro novo com a compra semeada.
    pub async fn create_with_purchase<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: Option<&str>,
        total: Decimal,
        points: i32,
        now: DateTime<Utc>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                name, email, total_spent, purchase_count, last_purchase_date, loyalty_points
            )
            VALUES ($1, $2, $3, 1, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(total)
        .bind(now)
        .bind(points)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }
}
