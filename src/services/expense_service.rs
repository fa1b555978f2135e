// src/services/expense_service.rs

use chrono::{Datelike, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{ActivityRepository, CounterRepository, ExpenseRepository},
    models::{
        activity::NewActivity,
        auth::CurrentUser,
        expense::{Expense, ExpenseFilter, ExpenseInput},
    },
    services::pricing,
};

pub const EXPENSE_PREFIX: &str = "EXP";

#[derive(Clone)]
pub struct ExpenseService {
    pool: PgPool,
    expense_repo: ExpenseRepository,
    counter_repo: CounterRepository,
    activity_repo: ActivityRepository,
}

impl ExpenseService {
    pub fn new(
        pool: PgPool,
        expense_repo: ExpenseRepository,
        counter_repo: CounterRepository,
        activity_repo: ActivityRepository,
    ) -> Self {
        Self {
            pool,
            expense_repo,
            counter_repo,
            activity_repo,
        }
    }

    pub async fn create_expense(&self, actor: &CurrentUser, input: &ExpenseInput) -> Result<Expense, AppError> {
        let mut tx = self.pool.begin().await?;

        // Numeração pelo ano do lançamento
        let year = Utc::now().year();
        let sequence = self
            .counter_repo
            .next_value(&mut *tx, &pricing::counter_scope(EXPENSE_PREFIX, year))
            .await?;
        let number = pricing::format_document_number(EXPENSE_PREFIX, year, sequence);

        let expense = self
            .expense_repo
            .insert_expense(&mut *tx, &number, input, actor.id)
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "expense.created", "expense", expense.id).with_changes(json!({
                    "expenseNumber": expense.expense_number,
                    "category": expense.category,
                    "amount": expense.amount,
                })),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(expense_id = %expense.id, amount = %expense.amount, "Despesa registrada");
        Ok(expense)
    }

    pub async fn update_expense(&self, actor: &CurrentUser, id: Uuid, input: &ExpenseInput) -> Result<Expense, AppError> {
        let mut tx = self.pool.begin().await?;

        let expense = self
            .expense_repo
            .update_expense(&mut *tx, id, input)
            .await?
            .ok_or_else(|| AppError::NotFound("Despesa não encontrada.".into()))?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "expense.updated", "expense", id)
                    .with_changes(json!({ "amount": expense.amount, "category": expense.category })),
            )
            .await?;

        tx.commit().await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, actor: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.expense_repo.delete_expense(&mut *tx, id).await? {
            return Err(AppError::NotFound("Despesa não encontrada.".into()));
        }

        self.activity_repo
            .record(&mut *tx, NewActivity::by(actor, "expense.deleted", "expense", id))
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_expense(&self, id: Uuid) -> Result<Expense, AppError> {
        self.expense_repo
            .get_expense(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Despesa não encontrada.".into()))
    }

    pub async fn list_expenses(&self, filter: &ExpenseFilter, page: &PageParams) -> Result<Paginated<Expense>, AppError> {
        let (expenses, total) = self.expense_repo.list_expenses(filter, page).await?;
        Ok(Paginated::new(expenses, page, total))
    }
}
