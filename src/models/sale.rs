// src/models/sale.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Cabeçalho da venda ---
// Criada uma vez; a única alteração posterior é o vínculo com uma conta de usuário.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(example = "SALE-2026-0001")]
    pub sale_number: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub cash_received: Decimal,
    #[serde(rename = "change")]
    pub change_given: Decimal,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub user_id: Option<Uuid>,
    pub staff_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- Item da venda (snapshot do produto no momento da venda) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub line_no: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    // Percentual aplicado, None se não havia desconto ativo
    pub discount: Option<Decimal>,
    pub final_price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
    pub subtotal: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// Maior valor que cabe em NUMERIC(12,2): 9999999999.99
const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

fn validate_amount(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    if *val > MAX_AMOUNT {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor excede o máximo permitido (9.999.999.999,99).".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "M")]
    pub size: Option<String>,
}

// POST /api/sales
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    #[validate(length(min = 1, message = "O carrinho está vazio."))]
    #[validate(nested)]
    pub items: Vec<SaleLineInput>,

    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub customer_email: Option<String>,

    #[validate(custom(function = "validate_amount"))]
    pub tax: Option<Decimal>,

    #[validate(
        required(message = "O valor recebido é obrigatório."),
        custom(function = "validate_amount")
    )]
    #[schema(example = 2000.0)]
    pub cash_received: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkUserPayload {
    pub user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// --- Tipos internos do fluxo de venda ---

// Linha já precificada, pronta para gravar
#[derive(Debug, Clone, PartialEq)]
pub struct NewSaleItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub discount: Option<Decimal>,
    pub final_price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
    pub subtotal: Decimal,
    // Subtotal sem desconto, usado no cálculo de discount_amount
    pub gross_subtotal: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub cash_received: Decimal,
    pub change: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub sale_number: String,
    pub totals: SaleTotals,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub user_id: Option<Uuid>,
    pub staff_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(items: Vec<SaleLineInput>, tax: Option<&str>, cash: &str) -> CreateSalePayload {
        CreateSalePayload {
            items,
            customer_name: None,
            customer_phone: None,
            customer_email: None,
            tax: tax.map(|t| t.parse().unwrap()),
            cash_received: Some(cash.parse().unwrap()),
        }
    }

    fn line() -> SaleLineInput {
        SaleLineInput { product_id: Uuid::new_v4(), quantity: 1, size: None }
    }

    #[test]
    fn empty_cart_fails_on_items() {
        let errors = payload(vec![], None, "10").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
    }

    #[test]
    fn amounts_above_column_precision_fail_validation() {
        let errors = payload(vec![line()], None, "10000000000").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("cash_received"));

        let errors = payload(vec![line()], Some("10000000000.00"), "10").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("tax"));
    }

    #[test]
    fn largest_amount_is_accepted() {
        assert!(payload(vec![line()], Some("0"), "9999999999.99").validate().is_ok());
    }
}
