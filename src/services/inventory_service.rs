// src/services/inventory_service.rs

use serde_json::json;
use sqlx::{PgConnection, PgPool};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{ActivityRepository, CatalogRepository, InventoryRepository},
    models::{
        activity::NewActivity,
        auth::CurrentUser,
        catalog::{Product, SizeStock},
        inventory::{AdjustStockPayload, StockChange, StockMovement, StockMovementReason},
    },
};

/// Estoque resultante de aplicar `delta` a um produto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub stock: i32,
    pub stock_by_size: Option<SizeStock>,
}

/// Aplica uma variação ao estoque (escalar ou por tamanho) sem deixar nada negativo.
/// Com grade, o tamanho é obrigatório, precisa existir e o total é recalculado.
pub fn apply_stock_delta(
    product_name: &str,
    stock: i32,
    stock_by_size: Option<&SizeStock>,
    size: Option<&str>,
    delta: i32,
) -> Result<StockLevel, AppError> {
    let overflow = || AppError::BadRequest("Quantidade fora do limite permitido.".into());

    match stock_by_size.filter(|s| !s.is_empty()) {
        Some(sizes) => {
            let size = size.ok_or_else(|| {
                AppError::BadRequest(format!("Informe o tamanho para o produto '{}'.", product_name))
            })?;
            let current = *sizes.get(size).ok_or_else(|| {
                AppError::BadRequest(format!(
                    "O tamanho '{}' não existe para o produto '{}'.",
                    size, product_name
                ))
            })?;

            let next = current.checked_add(delta).ok_or_else(overflow)?;
            if next < 0 {
                return Err(AppError::InsufficientStock {
                    product: format!("{} ({})", product_name, size),
                    requested: delta.saturating_neg(),
                    available: current,
                });
            }

            let mut sizes = sizes.clone();
            sizes.insert(size.to_string(), next);
            let stock = sizes
                .values()
                .try_fold(0i32, |acc, q| acc.checked_add(*q))
                .ok_or_else(overflow)?;

            Ok(StockLevel {
                stock,
                stock_by_size: Some(sizes),
            })
        }
        None => {
            let next = stock.checked_add(delta).ok_or_else(overflow)?;
            if next < 0 {
                return Err(AppError::InsufficientStock {
                    product: product_name.to_string(),
                    requested: delta.saturating_neg(),
                    available: stock,
                });
            }
            Ok(StockLevel {
                stock: next,
                stock_by_size: stock_by_size.cloned(),
            })
        }
    }
}

#[derive(Clone)]
pub struct InventoryService {
    pool: PgPool,
    catalog_repo: CatalogRepository,
    inventory_repo: InventoryRepository,
    activity_repo: ActivityRepository,
}

impl InventoryService {
    pub fn new(
        pool: PgPool,
        catalog_repo: CatalogRepository,
        inventory_repo: InventoryRepository,
        activity_repo: ActivityRepository,
    ) -> Self {
        Self {
            pool,
            catalog_repo,
            inventory_repo,
            activity_repo,
        }
    }

    /// Trava os produtos (ordem por id) para o restante da transação do chamador.
    pub async fn lock_products(&self, conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();
        self.catalog_repo.lock_products(&mut *conn, &ids).await
    }

    /// Aplica a alteração a um produto já travado, grava o novo estoque e a movimentação.
    /// O `product` em memória é atualizado para as próximas linhas da mesma transação.
    pub async fn apply_change(
        &self,
        conn: &mut PgConnection,
        product: &mut Product,
        change: &StockChange,
        staff_id: Option<Uuid>,
    ) -> Result<StockMovement, AppError> {
        let level = apply_stock_delta(
            &product.name,
            product.stock,
            product.size_stock(),
            change.size.as_deref(),
            change.quantity_change,
        )?;

        self.catalog_repo
            .write_stock(&mut *conn, product.id, level.stock, level.stock_by_size.as_ref())
            .await?;

        let movement = self
            .inventory_repo
            .record_stock_movement(&mut *conn, change, staff_id)
            .await?;

        tracing::debug!(
            product_id = %product.id,
            delta = change.quantity_change,
            stock = level.stock,
            "Estoque atualizado"
        );

        product.stock = level.stock;
        product.stock_by_size = level.stock_by_size.map(Json);

        Ok(movement)
    }

    // --- AJUSTE MANUAL (inventário, avaria, etc.) ---
    pub async fn adjust_stock(
        &self,
        actor: &CurrentUser,
        product_id: Uuid,
        payload: &AdjustStockPayload,
    ) -> Result<Product, AppError> {
        if payload.quantity_change == 0 {
            return Err(AppError::BadRequest("A variação de estoque não pode ser zero.".into()));
        }
        let reason = payload.reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest("O motivo é obrigatório.".into()));
        }

        let mut tx = self.pool.begin().await?;

        let mut product = self
            .catalog_repo
            .get_product_for_update(&mut *tx, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto não encontrado.".into()))?;

        let before = product.stock;
        let change = StockChange {
            product_id,
            size: payload.size.clone(),
            quantity_change: payload.quantity_change,
            reason: StockMovementReason::Adjustment,
            reference_id: None,
            notes: Some(reason.to_string()),
        };

        self.apply_change(&mut tx, &mut product, &change, Some(actor.id)).await?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "stock.adjusted", "product", product_id).with_changes(json!({
                    "size": payload.size,
                    "quantityChange": payload.quantity_change,
                    "reason": reason,
                    "before": before,
                    "after": product.stock,
                })),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            delta = payload.quantity_change,
            stock = product.stock,
            "Ajuste de estoque registrado"
        );
        Ok(product)
    }

    pub async fn list_movements(
        &self,
        product_id: Uuid,
        page: &PageParams,
    ) -> Result<Paginated<StockMovement>, AppError> {
        if self.catalog_repo.get_product(product_id).await?.is_none() {
            return Err(AppError::NotFound("Produto não encontrado.".into()));
        }
        let (movements, total) = self.inventory_repo.list_movements(product_id, page).await?;
        Ok(Paginated::new(movements, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(pairs: &[(&str, i32)]) -> SizeStock {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn scalar_stock_goes_down_and_up() {
        let level = apply_stock_delta("Boné", 5, None, None, -2).unwrap();
        assert_eq!(level.stock, 3);
        assert_eq!(level.stock_by_size, None);

        let level = apply_stock_delta("Boné", 3, None, Some("M"), 4).unwrap();
        assert_eq!(level.stock, 7);
    }

    #[test]
    fn scalar_stock_never_goes_negative() {
        let err = apply_stock_delta("Boné", 1, None, None, -2).unwrap_err();
        match err {
            AppError::InsufficientStock { requested, available, .. } => {
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn size_bucket_change_recomputes_total() {
        let grid = sizes(&[("P", 2), ("M", 3)]);
        let level = apply_stock_delta("Camiseta", 5, Some(&grid), Some("M"), -3).unwrap();

        assert_eq!(level.stock, 2);
        assert_eq!(level.stock_by_size, Some(sizes(&[("P", 2), ("M", 0)])));
    }

    #[test]
    fn size_bucket_is_checked_not_the_total() {
        let grid = sizes(&[("P", 4), ("M", 1)]);
        let err = apply_stock_delta("Camiseta", 5, Some(&grid), Some("M"), -2).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 1, .. }));
    }

    #[test]
    fn sized_product_requires_known_size() {
        let grid = sizes(&[("P", 4)]);
        assert!(matches!(
            apply_stock_delta("Camiseta", 4, Some(&grid), None, -1),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            apply_stock_delta("Camiseta", 4, Some(&grid), Some("GG"), 1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(apply_stock_delta("Meia", i32::MAX, None, None, 1).is_err());
    }
}
