// src/models/catalog.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Mapa tamanho -> quantidade ("P" -> 3, "M" -> 0, ...).
pub type SizeStock = BTreeMap<String, i32>;

// --- Imagens ---
// A lista é ordenada e exatamente uma imagem é a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    #[schema(example = "https://cdn.exemplo.com/camiseta.jpg")]
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
}

// --- Categorias ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Camisetas")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Produtos ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    #[schema(example = "Camiseta Básica")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 1000.0)]
    pub price: Decimal,
    // Custo de compra; ausente conta como zero no lucro
    pub purchase_price: Option<Decimal>,
    // Sempre igual à soma de stock_by_size quando este existir
    pub stock: i32,
    #[schema(value_type = Option<Object>)]
    pub stock_by_size: Option<Json<SizeStock>>,
    #[schema(example = 10.0)]
    pub discount: Option<Decimal>,
    pub discount_end_time: Option<DateTime<Utc>>,
    #[schema(value_type = Vec<ProductImage>)]
    pub images: Json<Vec<ProductImage>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn size_stock(&self) -> Option<&SizeStock> {
        self.stock_by_size.as_ref().map(|json| &json.0)
    }
}

// Produto como é mostrado na vitrine: com o desconto já avaliado
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub discount_active: bool,
    pub effective_price: Decimal,
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("O desconto deve estar entre 0 e 100.".into());
        return Err(err);
    }
    Ok(())
}

// Payload de criação/edição. O PUT substitui o produto inteiro (exceto o estoque,
// que só muda pelo ajuste de estoque, venda ou devolução).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub purchase_price: Option<Decimal>,

    // Usado apenas na criação; no PUT é recusado
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: Option<i32>,

    #[schema(value_type = Option<Object>)]
    pub stock_by_size: Option<SizeStock>,

    #[validate(custom(function = "validate_percentage"))]
    pub discount: Option<Decimal>,
    pub discount_end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateInput {
    #[validate(length(min = 1, message = "Informe ao menos um produto."))]
    pub product_ids: Vec<Uuid>,

    #[validate(custom(function = "validate_percentage"))]
    pub discount: Option<Decimal>,
    // Quando true, zera desconto e data de término
    #[serde(default)]
    pub clear_discount: bool,
    pub discount_end_time: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub on_sale: Option<bool>,
}

// --- Avaliações ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    #[schema(example = 5)]
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "A nota deve ser entre 1 e 5."))]
    pub rating: i16,
    #[validate(length(max = 2000, message = "Comentário muito longo."))]
    pub comment: Option<String>,
}
