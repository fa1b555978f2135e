// src/models/expense.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    #[schema(example = "EXP-2026-0001")]
    pub expense_number: String,
    #[schema(example = "Aluguel")]
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub payment_method: Option<String>,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
}
