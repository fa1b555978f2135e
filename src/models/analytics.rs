// src/models/analytics.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ?from=2026-01-01&to=2026-01-31 (inclusivo). Sem datas: últimos 30 dias.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
}

// --- Linhas lidas do banco para agregação ---

#[derive(Debug, Clone, FromRow)]
pub struct SaleFact {
    pub created_at: DateTime<Utc>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub items_sold: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SaleLineFact {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct RefundFact {
    pub refund_amount: Decimal,
    // Custo das peças devolvidas (voltam ao estoque)
    pub returned_cost: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExpenseFact {
    pub category: String,
    pub amount: Decimal,
}

// --- Respostas ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sale_count: i64,
    pub items_sold: i64,
    pub revenue: Decimal,
    pub tax: Decimal,
    pub discounts: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub average_ticket: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: NaiveDate,
    pub sale_count: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: Decimal,
    pub tax_collected: Decimal,
    pub cost_of_goods: Decimal,
    pub gross_profit: Decimal,
    pub refunds: Decimal,
    pub expenses_total: Decimal,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub net_profit: Decimal,
}
