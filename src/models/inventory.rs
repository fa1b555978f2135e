// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "stock_movement_reason", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum StockMovementReason {
    Sale,       // Vira "sale"
    Return,     // Vira "return"
    Adjustment, // Vira "adjustment"
}

// --- STOCK MOVEMENT (Histórico, append-only) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: Option<String>,
    // Positivo entra, negativo sai
    pub quantity_change: i32,
    pub reason: StockMovementReason,
    // Venda ou devolução que originou a movimentação
    pub reference_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Uma alteração de estoque a ser aplicada dentro de uma transação
#[derive(Debug, Clone)]
pub struct StockChange {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub quantity_change: i32,
    pub reason: StockMovementReason,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
}

// Só espaços não conta como motivo
fn validate_reason(reason: &str) -> Result<(), ValidationError> {
    if reason.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("O motivo é obrigatório.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    #[schema(example = -2)]
    pub quantity_change: i32,

    #[schema(example = "M")]
    pub size: Option<String>,

    #[validate(custom(function = "validate_reason"))]
    #[schema(example = "Inventário mensal: 2 peças avariadas")]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjustment(reason: &str) -> AdjustStockPayload {
        AdjustStockPayload {
            quantity_change: -1,
            size: None,
            reason: reason.into(),
        }
    }

    #[test]
    fn blank_reason_fails_validation() {
        assert!(adjustment("").validate().is_err());
        assert!(adjustment("   \t ").validate().is_err());
    }

    #[test]
    fn real_reason_passes() {
        assert!(adjustment(" peça avariada ").validate().is_ok());
    }
}
