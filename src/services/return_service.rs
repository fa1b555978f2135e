// src/services/return_service.rs

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{return_repo::NewReturnItem, ActivityRepository, CounterRepository, ReturnRepository, SaleRepository},
    models::{
        activity::NewActivity,
        auth::CurrentUser,
        catalog::Product,
        inventory::{StockChange, StockMovementReason},
        returns::{
            CreateReturnPayload, Return, ReturnDetail, ReturnFilter, ReturnLineInput, ReturnStatus,
            UpdateReturnStatusPayload,
        },
        sale::SaleItem,
    },
    services::{inventory_service::InventoryService, pricing},
};

pub const RETURN_PREFIX: &str = "RET";

/// O que fazer com uma mudança de status pedida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    // Mesmo status: nada muda, nem o estoque
    Unchanged,
    Approve { restore_stock: bool },
    Reject,
}

/// pending -> approved | rejected. Os dois finais são terminais.
pub fn plan_transition(current: ReturnStatus, stock_restored: bool, target: ReturnStatus) -> Result<Transition, AppError> {
    match (current, target) {
        (a, b) if a == b => Ok(Transition::Unchanged),
        (ReturnStatus::Pending, ReturnStatus::Approved) => Ok(Transition::Approve {
            restore_stock: !stock_restored,
        }),
        (ReturnStatus::Pending, ReturnStatus::Rejected) => Ok(Transition::Reject),
        (from, to) => Err(AppError::BadRequest(format!(
            "Não é possível mudar uma devolução de '{}' para '{}'.",
            status_label(from),
            status_label(to)
        ))),
    }
}

fn status_label(status: ReturnStatus) -> &'static str {
    match status {
        ReturnStatus::Pending => "pending",
        ReturnStatus::Approved => "approved",
        ReturnStatus::Rejected => "rejected",
    }
}

/// Casa cada item pedido com as linhas da venda (mesmo produto e tamanho) e
/// distribui a quantidade respeitando o que ainda pode voltar em cada linha.
/// `already_returned` é por linha da venda e só conta devoluções não rejeitadas.
pub fn match_return_lines(
    sale_items: &[SaleItem],
    already_returned: &HashMap<Uuid, i64>,
    lines: &[ReturnLineInput],
) -> Result<Vec<NewReturnItem>, AppError> {
    let mut taken: HashMap<Uuid, i64> = HashMap::new();
    let mut result = Vec::new();

    for line in lines {
        let size = line.size.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let candidates: Vec<&SaleItem> = sale_items
            .iter()
            .filter(|item| item.product_id == line.product_id && item.size.as_deref() == size)
            .collect();

        let Some(first) = candidates.first() else {
            return Err(AppError::BadRequest(match size {
                Some(s) => format!("O produto {} (tamanho {}) não faz parte desta venda.", line.product_id, s),
                None => format!("O produto {} não faz parte desta venda.", line.product_id),
            }));
        };

        let remaining_of = |item: &SaleItem, taken: &HashMap<Uuid, i64>| {
            i64::from(item.quantity)
                - already_returned.get(&item.id).copied().unwrap_or(0)
                - taken.get(&item.id).copied().unwrap_or(0)
        };

        let available: i64 = candidates.iter().map(|item| remaining_of(*item, &taken).max(0)).sum();
        let mut wanted = i64::from(line.quantity);
        if wanted > available {
            return Err(AppError::BadRequest(format!(
                "Quantidade de '{}' excede o que pode ser devolvido: solicitado {}, disponível {}.",
                first.product_name, wanted, available
            )));
        }

        for item in candidates {
            if wanted == 0 {
                break;
            }
            let remaining = remaining_of(item, &taken);
            if remaining <= 0 {
                continue;
            }
            let qty = wanted.min(remaining);
            wanted -= qty;
            *taken.entry(item.id).or_insert(0) += qty;

            // qty <= quantidade da linha, que é i32
            let quantity = i32::try_from(qty).map_err(|e| anyhow::anyhow!(e))?;
            result.push(NewReturnItem {
                sale_item_id: item.id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                size: item.size.clone(),
                quantity,
                unit_refund: item.final_price,
                refund_amount: pricing::round2(item.final_price * Decimal::from(quantity)),
                reason: line.reason.clone(),
            });
        }
    }

    Ok(result)
}

#[derive(Clone)]
pub struct ReturnService {
    pool: PgPool,
    return_repo: ReturnRepository,
    sale_repo: SaleRepository,
    counter_repo: CounterRepository,
    inventory_service: InventoryService,
    activity_repo: ActivityRepository,
}

impl ReturnService {
    pub fn new(
        pool: PgPool,
        return_repo: ReturnRepository,
        sale_repo: SaleRepository,
        counter_repo: CounterRepository,
        inventory_service: InventoryService,
        activity_repo: ActivityRepository,
    ) -> Self {
        Self {
            pool,
            return_repo,
            sale_repo,
            counter_repo,
            inventory_service,
            activity_repo,
        }
    }

    /// Abre a devolução como pendente. O estoque só volta na aprovação.
    pub async fn create_return(&self, actor: &CurrentUser, payload: &CreateReturnPayload) -> Result<ReturnDetail, AppError> {
        if payload.items.is_empty() {
            return Err(AppError::BadRequest("Informe ao menos um item.".into()));
        }

        let mut tx = self.pool.begin().await?;

        let sale = self
            .sale_repo
            .get_sale_for_update(&mut *tx, payload.sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada.".into()))?;

        let sale_items = self.sale_repo.list_items(&mut *tx, sale.id).await?;
        let already: HashMap<Uuid, i64> = self
            .return_repo
            .returned_quantities(&mut *tx, sale.id)
            .await?
            .into_iter()
            .collect();

        let new_items = match_return_lines(&sale_items, &already, &payload.items)?;
        let total_refund: Decimal = new_items.iter().map(|i| i.refund_amount).sum();

        let year = Utc::now().year();
        let sequence = self
            .counter_repo
            .next_value(&mut *tx, &pricing::counter_scope(RETURN_PREFIX, year))
            .await?;
        let return_number = pricing::format_document_number(RETURN_PREFIX, year, sequence);

        let header = self
            .return_repo
            .insert_return(
                &mut *tx,
                &return_number,
                sale.id,
                total_refund,
                payload.reason.as_deref(),
                payload.notes.as_deref(),
                actor.id,
            )
            .await?;

        let mut items = Vec::with_capacity(new_items.len());
        for item in &new_items {
            items.push(self.return_repo.insert_return_item(&mut *tx, header.id, item).await?);
        }

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "return.created", "return", header.id).with_changes(json!({
                    "returnNumber": header.return_number,
                    "saleId": sale.id,
                    "totalRefund": total_refund,
                })),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            return_id = %header.id,
            return_number = %header.return_number,
            sale_id = %sale.id,
            "Devolução registrada"
        );
        Ok(ReturnDetail { header, items })
    }

    /// Aprova ou rejeita. Reaprovar não devolve o estoque de novo.
    pub async fn update_status(
        &self,
        actor: &CurrentUser,
        id: Uuid,
        payload: &UpdateReturnStatusPayload,
    ) -> Result<ReturnDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .return_repo
            .get_return_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Devolução não encontrada.".into()))?;

        let items = self.return_repo.list_items(&mut *tx, id).await?;

        let (restore_stock, stock_restored) = match plan_transition(current.status, current.stock_restored, payload.status)? {
            Transition::Unchanged => {
                tracing::debug!(return_id = %id, "Status da devolução inalterado");
                return Ok(ReturnDetail { header: current, items });
            }
            Transition::Approve { restore_stock } => (restore_stock, true),
            Transition::Reject => (false, current.stock_restored),
        };

        if restore_stock {
            let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
            let mut products: HashMap<Uuid, Product> = self
                .inventory_service
                .lock_products(&mut tx, &ids)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect();

            for item in &items {
                let product = products.get_mut(&item.product_id).ok_or_else(|| {
                    AppError::NotFound(format!("Produto '{}' não encontrado.", item.product_name))
                })?;
                let change = StockChange {
                    product_id: item.product_id,
                    size: item.size.clone(),
                    quantity_change: item.quantity,
                    reason: StockMovementReason::Return,
                    reference_id: Some(current.id),
                    notes: Some(current.return_number.clone()),
                };
                self.inventory_service
                    .apply_change(&mut tx, product, &change, Some(actor.id))
                    .await?;
            }
        }

        let header = self
            .return_repo
            .update_status(&mut *tx, id, payload.status, stock_restored, actor.id, payload.notes.as_deref())
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "return.status_changed", "return", id).with_changes(json!({
                    "from": current.status,
                    "to": header.status,
                    "stockRestored": restore_stock,
                })),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            return_id = %id,
            status = status_label(header.status),
            stock_restored = restore_stock,
            "Status da devolução alterado"
        );
        Ok(ReturnDetail { header, items })
    }

    pub async fn get_return(&self, id: Uuid) -> Result<ReturnDetail, AppError> {
        let header = self
            .return_repo
            .get_return(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Devolução não encontrada.".into()))?;
        let items = self.return_repo.find_items(id).await?;
        Ok(ReturnDetail { header, items })
    }

    pub async fn list_returns(&self, filter: &ReturnFilter, page: &PageParams) -> Result<Paginated<Return>, AppError> {
        let (returns, total) = self.return_repo.list_returns(filter, page).await?;
        Ok(Paginated::new(returns, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::tests::d;

    fn sold(product_id: Uuid, quantity: i32, size: Option<&str>, final_price: &str) -> SaleItem {
        SaleItem {
            id: Uuid::new_v4(),
            sale_id: Uuid::nil(),
            line_no: 1,
            product_id,
            product_name: "Calça".into(),
            unit_price: d(final_price),
            discount: None,
            final_price: d(final_price),
            quantity,
            size: size.map(str::to_string),
            subtotal: d(final_price) * Decimal::from(quantity),
            cost: Decimal::ZERO,
            profit: d(final_price) * Decimal::from(quantity),
        }
    }

    fn ask(product_id: Uuid, quantity: i32, size: Option<&str>) -> ReturnLineInput {
        ReturnLineInput {
            product_id,
            size: size.map(str::to_string),
            quantity,
            reason: None,
        }
    }

    #[test]
    fn only_pending_can_move() {
        use ReturnStatus::*;
        assert_eq!(plan_transition(Pending, false, Approved).unwrap(), Transition::Approve { restore_stock: true });
        assert_eq!(plan_transition(Pending, false, Rejected).unwrap(), Transition::Reject);
        assert!(plan_transition(Approved, true, Rejected).is_err());
        assert!(plan_transition(Rejected, false, Approved).is_err());
        assert!(plan_transition(Approved, true, Pending).is_err());
    }

    #[test]
    fn reapproving_is_a_no_op() {
        assert_eq!(
            plan_transition(ReturnStatus::Approved, true, ReturnStatus::Approved).unwrap(),
            Transition::Unchanged
        );
    }

    #[test]
    fn refund_uses_snapshotted_final_price() {
        let product_id = Uuid::new_v4();
        let items = vec![sold(product_id, 3, Some("M"), "89.90")];

        let matched = match_return_lines(&items, &HashMap::new(), &[ask(product_id, 2, Some("M"))]).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].quantity, 2);
        assert_eq!(matched[0].unit_refund, d("89.90"));
        assert_eq!(matched[0].refund_amount, d("179.80"));
    }

    #[test]
    fn size_must_match_the_sold_line() {
        let product_id = Uuid::new_v4();
        let items = vec![sold(product_id, 1, Some("M"), "10")];

        assert!(match_return_lines(&items, &HashMap::new(), &[ask(product_id, 1, Some("G"))]).is_err());
        assert!(match_return_lines(&items, &HashMap::new(), &[ask(Uuid::new_v4(), 1, Some("M"))]).is_err());
    }

    #[test]
    fn previous_returns_reduce_what_is_left() {
        let product_id = Uuid::new_v4();
        let items = vec![sold(product_id, 3, None, "10")];
        let already: HashMap<Uuid, i64> = [(items[0].id, 2)].into();

        assert!(match_return_lines(&items, &already, &[ask(product_id, 1, None)]).is_ok());
        assert!(match_return_lines(&items, &already, &[ask(product_id, 2, None)]).is_err());
    }

    #[test]
    fn repeated_request_lines_cannot_exceed_sold_quantity() {
        let product_id = Uuid::new_v4();
        let items = vec![sold(product_id, 2, None, "10")];

        let err = match_return_lines(
            &items,
            &HashMap::new(),
            &[ask(product_id, 1, None), ask(product_id, 2, None)],
        );
        assert!(err.is_err());
    }

    #[test]
    fn quantity_is_spread_over_matching_lines() {
        let product_id = Uuid::new_v4();
        let items = vec![sold(product_id, 1, None, "10"), sold(product_id, 2, None, "12")];

        let matched = match_return_lines(&items, &HashMap::new(), &[ask(product_id, 3, None)]).unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].quantity, 1);
        assert_eq!(matched[1].quantity, 2);
        let total: Decimal = matched.iter().map(|m| m.refund_amount).sum();
        assert_eq!(total, d("34"));
    }
}
