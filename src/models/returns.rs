// src/models/returns.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// pending -> approved | rejected (ambos terminais)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "return_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Return {
    pub id: Uuid,
    #[schema(example = "RET-2026-0001")]
    pub return_number: String,
    pub sale_id: Uuid,
    pub total_refund: Decimal,
    pub status: ReturnStatus,
    // Guarda de idempotência: o estoque só volta uma vez
    pub stock_restored: bool,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub id: Uuid,
    pub return_id: Uuid,
    pub sale_item_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub unit_refund: Decimal,
    pub refund_amount: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnDetail {
    #[serde(flatten)]
    pub header: Return,
    pub items: Vec<ReturnItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLineInput {
    pub product_id: Uuid,
    pub size: Option<String>,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub reason: Option<String>,
}

// POST /api/returns
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnPayload {
    pub sale_id: Uuid,
    #[validate(length(min = 1, message = "Informe ao menos um item."))]
    #[validate(nested)]
    pub items: Vec<ReturnLineInput>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

// PATCH /api/returns/{id}
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReturnStatusPayload {
    pub status: ReturnStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnFilter {
    pub status: Option<ReturnStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_needs_at_least_one_positive_line() {
        let empty = CreateReturnPayload { sale_id: Uuid::new_v4(), items: vec![], reason: None, notes: None };
        assert!(empty.validate().unwrap_err().field_errors().contains_key("items"));

        let zero = CreateReturnPayload {
            items: vec![ReturnLineInput { product_id: Uuid::new_v4(), size: None, quantity: 0, reason: None }],
            ..empty
        };
        assert!(zero.validate().is_err());
    }
}
