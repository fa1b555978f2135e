// src/db/expense_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::{
        analytics::ExpenseFact,
        expense::{Expense, ExpenseFilter, ExpenseInput},
    },
};

const EXPENSE_FILTER: &str = r#"
    ($1::date IS NULL OR expense_date >= $1)
    AND ($2::date IS NULL OR expense_date <= $2)
    AND ($3::text IS NULL OR category = $3)
"#;

#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_expense<'e, E>(
        &self,
        executor: E,
        expense_number: &str,
        input: &ExpenseInput,
        recorded_by: Uuid,
    ) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (
                expense_number, category, description, amount, expense_date, payment_method, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(expense_number)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.expense_date)
        .bind(input.payment_method.as_deref())
        .bind(recorded_by)
        .fetch_one(executor)
        .await?;
        Ok(expense)
    }

    pub async fn update_expense<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &ExpenseInput,
    ) -> Result<Option<Expense>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses SET
                category = $2, description = $3, amount = $4, expense_date = $5,
                payment_method = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.expense_date)
        .bind(input.payment_method.as_deref())
        .fetch_optional(executor)
        .await?;
        Ok(expense)
    }

    pub async fn delete_expense<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>, AppError> {
        let expense = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(expense)
    }

    pub async fn list_expenses(
        &self,
        filter: &ExpenseFilter,
        page: &PageParams,
    ) -> Result<(Vec<Expense>, i64), AppError> {
        let list_sql = format!(
            "SELECT * FROM expenses WHERE {EXPENSE_FILTER} ORDER BY expense_date DESC, created_at DESC LIMIT $4 OFFSET $5"
        );
        let expenses = sqlx::query_as::<_, Expense>(&list_sql)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.category.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM expenses WHERE {EXPENSE_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.category.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok((expenses, total))
    }

    pub async fn expense_facts(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ExpenseFact>, AppError> {
        let facts = sqlx::query_as::<_, ExpenseFact>(
            "SELECT category, amount FROM expenses WHERE expense_date >= $1 AND expense_date <= $2",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(facts)
    }
}
