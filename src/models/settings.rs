// src/models/settings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[schema(example = "Minha Loja")]
    pub store_name: String,

    #[schema(example = "BRL")]
    pub currency: String,

    #[schema(example = 0.0)]
    pub default_tax_rate: Decimal,

    // Pontos de fidelidade por unidade monetária gasta (0.01 = 1 ponto a cada 100)
    #[schema(example = 0.01)]
    pub loyalty_points_per_unit: Decimal,

    #[schema(example = 5)]
    pub low_stock_threshold: i32,

    pub updated_at: DateTime<Utc>,
}

fn validate_rate(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve estar entre 0 e 100.".into());
        return Err(err);
    }
    Ok(())
}

// Só os campos informados são alterados
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, message = "O nome da loja não pode ser vazio."))]
    pub store_name: Option<String>,
    #[validate(length(equal = 3, message = "Use o código ISO da moeda (ex.: BRL)."))]
    pub currency: Option<String>,
    // Percentual aplicado quando a venda não informa o imposto
    #[validate(custom(function = "validate_rate"))]
    pub default_tax_rate: Option<Decimal>,
    #[validate(custom(function = "validate_rate"))]
    pub loyalty_points_per_unit: Option<Decimal>,
    #[validate(range(min = 0, message = "O limite não pode ser negativo."))]
    pub low_stock_threshold: Option<i32>,
}
