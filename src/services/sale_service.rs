// src/services/sale_service.rs

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{
        ActivityRepository, CounterRepository, CustomerRepository, SaleRepository,
        SettingsRepository, UserRepository,
    },
    models::{
        activity::NewActivity,
        auth::CurrentUser,
        catalog::Product,
        customer::{Customer, CustomerContact},
        inventory::{StockChange, StockMovementReason},
        sale::{CreateSalePayload, NewSale, Sale, SaleDetail, SaleFilter, SaleLineInput},
    },
    services::{inventory_service::InventoryService, pricing},
};

pub const SALE_PREFIX: &str = "SALE";

/// Resultado da busca de conta para vincular à venda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLink {
    Linked(Uuid),
    NoMatch,
    // Mais de uma conta com o mesmo contato: não vincula
    Ambiguous { matched_by: &'static str, candidates: usize },
}

/// E-mail tem prioridade; telefone só é consultado se o e-mail não achou ninguém.
pub fn resolve_user_link(by_email: &[Uuid], by_phone: &[Uuid]) -> UserLink {
    match by_email {
        [id] => return UserLink::Linked(*id),
        [] => {}
        many => {
            return UserLink::Ambiguous {
                matched_by: "email",
                candidates: many.len(),
            }
        }
    }
    match by_phone {
        [id] => UserLink::Linked(*id),
        [] => UserLink::NoMatch,
        many => UserLink::Ambiguous {
            matched_by: "phone",
            candidates: many.len(),
        },
    }
}

/// Confere o estoque do carrinho inteiro antes de gravar qualquer coisa.
/// Linhas do mesmo produto/tamanho são somadas.
pub fn check_availability(lines: &[SaleLineInput], products: &HashMap<Uuid, Product>) -> Result<(), AppError> {
    let mut requested: Vec<((Uuid, Option<String>), i32)> = Vec::new();

    for line in lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| AppError::NotFound(format!("Produto {} não encontrado.", line.product_id)))?;

        if !product.is_active {
            return Err(AppError::BadRequest(format!(
                "O produto '{}' não está mais disponível.",
                product.name
            )));
        }

        // Sem grade o tamanho é só informativo
        let bucket = match product.size_stock().filter(|s| !s.is_empty()) {
            Some(sizes) => {
                let size = line.size.as_deref().ok_or_else(|| {
                    AppError::BadRequest(format!("Informe o tamanho para o produto '{}'.", product.name))
                })?;
                if !sizes.contains_key(size) {
                    return Err(AppError::BadRequest(format!(
                        "O tamanho '{}' não existe para o produto '{}'.",
                        size, product.name
                    )));
                }
                Some(size.to_string())
            }
            None => None,
        };

        let key = (product.id, bucket);
        match requested.iter_mut().find(|(k, _)| *k == key) {
            Some((_, qty)) => {
                *qty = qty
                    .checked_add(line.quantity)
                    .ok_or_else(|| AppError::BadRequest("Quantidade fora do limite permitido.".into()))?
            }
            None => requested.push((key, line.quantity)),
        }
    }

    for ((product_id, bucket), qty) in requested {
        let Some(product) = products.get(&product_id) else {
            continue;
        };
        let (label, available) = match (&bucket, product.size_stock()) {
            (Some(size), Some(sizes)) => (
                format!("{} ({})", product.name, size),
                sizes.get(size).copied().unwrap_or(0),
            ),
            _ => (product.name.clone(), product.stock),
        };
        if qty > available {
            return Err(AppError::InsufficientStock {
                product: label,
                requested: qty,
                available,
            });
        }
    }

    Ok(())
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Imposto informado vale; sem ele, aplica a alíquota padrão da loja (em %).
pub fn resolve_tax(tax: Option<Decimal>, subtotal: Decimal, default_rate: Decimal) -> Decimal {
    tax.unwrap_or_else(|| pricing::round2(subtotal * default_rate / Decimal::ONE_HUNDRED))
}

#[derive(Clone)]
pub struct SaleService {
    pool: PgPool,
    sale_repo: SaleRepository,
    customer_repo: CustomerRepository,
    user_repo: UserRepository,
    counter_repo: CounterRepository,
    settings_repo: SettingsRepository,
    inventory_service: InventoryService,
    activity_repo: ActivityRepository,
}

impl SaleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        sale_repo: SaleRepository,
        customer_repo: CustomerRepository,
        user_repo: UserRepository,
        counter_repo: CounterRepository,
        settings_repo: SettingsRepository,
        inventory_service: InventoryService,
        activity_repo: ActivityRepository,
    ) -> Self {
        Self {
            pool,
            sale_repo,
            customer_repo,
            user_repo,
            counter_repo,
            settings_repo,
            inventory_service,
            activity_repo,
        }
    }

    // =========================================================================
    //  FLUXO DA VENDA
    // =========================================================================

    /// Converte o carrinho numa venda. Tudo numa transação: qualquer erro desfaz
    /// estoque, cliente, numeração e auditoria juntos.
    pub async fn create_sale(&self, actor: &CurrentUser, payload: &CreateSalePayload) -> Result<SaleDetail, AppError> {
        if payload.items.is_empty() {
            return Err(AppError::BadRequest("O carrinho está vazio.".into()));
        }
        let cash_received = payload
            .cash_received
            .ok_or_else(|| AppError::BadRequest("O valor recebido é obrigatório.".into()))?;
        if cash_received.is_sign_negative() {
            return Err(AppError::BadRequest("O valor recebido não pode ser negativo.".into()));
        }

        let mut tx = self.pool.begin().await?;

        // 1. Trava e confere o estoque
        let ids: Vec<Uuid> = payload.items.iter().map(|l| l.product_id).collect();
        let mut products: HashMap<Uuid, Product> = self
            .inventory_service
            .lock_products(&mut tx, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        check_availability(&payload.items, &products)?;

        // 2. Preço do momento da venda
        let now = Utc::now();
        let mut lines = Vec::with_capacity(payload.items.len());
        for line in &payload.items {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Produto {} não encontrado.", line.product_id)))?;
            lines.push(pricing::price_line(product, line.quantity, clean(&line.size), now));
        }

        // 3. Totais e troco
        let settings = self.settings_repo.get_settings(&mut *tx).await?;
        let gross_subtotal: Decimal = lines.iter().map(|l| l.subtotal).sum();
        let tax = resolve_tax(payload.tax, gross_subtotal, settings.default_tax_rate);
        let totals = pricing::summarize_sale(&lines, tax, cash_received)?;

        // 4. Número da venda
        let year = now.year();
        let sequence = self
            .counter_repo
            .next_value(&mut *tx, &pricing::counter_scope(SALE_PREFIX, year))
            .await?;
        let sale_number = pricing::format_document_number(SALE_PREFIX, year, sequence);

        // 5. Cliente e conta
        let contact = CustomerContact {
            name: clean(&payload.customer_name),
            phone: clean(&payload.customer_phone),
            email: clean(&payload.customer_email),
        };
        let points = pricing::loyalty_points(totals.total, settings.loyalty_points_per_unit);
        let customer = self.record_customer_purchase(&mut tx, &contact, totals.total, points, now).await?;
        let link = self.find_user_link(&mut tx, &contact).await?;

        let user_id = match link {
            UserLink::Linked(id) => Some(id),
            _ => None,
        };

        // 6. Grava a venda e os itens
        let sale = self
            .sale_repo
            .insert_sale(
                &mut *tx,
                &NewSale {
                    sale_number,
                    totals,
                    customer_id: customer.as_ref().map(|c| c.id),
                    customer_name: contact.name.clone().or_else(|| customer.as_ref().map(|c| c.name.clone())),
                    customer_phone: contact.phone.clone(),
                    customer_email: contact.email.clone(),
                    user_id,
                    staff_id: actor.id,
                    created_at: now,
                },
            )
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            let line_no = i32::try_from(idx + 1).map_err(|e| anyhow::anyhow!(e))?;
            items.push(self.sale_repo.insert_sale_item(&mut *tx, sale.id, line_no, line).await?);
        }

        // 7. Baixa de estoque + movimentações
        for line in &lines {
            let product = products
                .get_mut(&line.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Produto {} não encontrado.", line.product_id)))?;
            let change = StockChange {
                product_id: line.product_id,
                size: line.size.clone(),
                quantity_change: -line.quantity,
                reason: StockMovementReason::Sale,
                reference_id: Some(sale.id),
                notes: Some(sale.sale_number.clone()),
            };
            self.inventory_service
                .apply_change(&mut tx, product, &change, Some(actor.id))
                .await?;
        }

        // 8. Auditoria
        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "sale.created", "sale", sale.id).with_changes(json!({
                    "saleNumber": sale.sale_number,
                    "total": sale.total,
                    "items": items.len(),
                    "customerId": sale.customer_id,
                    "userId": sale.user_id,
                })),
            )
            .await?;

        if let UserLink::Ambiguous { matched_by, candidates } = link {
            tracing::warn!(
                sale_id = %sale.id,
                matched_by,
                candidates,
                "Vínculo de conta ambíguo; venda registrada sem usuário"
            );
            self.activity_repo
                .record(
                    &mut *tx,
                    NewActivity::by(actor, "sale.user_link_ambiguous", "sale", sale.id)
                        .with_changes(json!({ "matchedBy": matched_by, "candidates": candidates })),
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total = %sale.total,
            items = items.len(),
            "Venda registrada"
        );

        Ok(SaleDetail { sale, items })
    }

    // Com telefone: upsert atômico. Só com nome: cadastro novo. Sem nada: venda avulsa.
    async fn record_customer_purchase(
        &self,
        conn: &mut PgConnection,
        contact: &CustomerContact,
        total: Decimal,
        points: i32,
        now: chrono::DateTime<Utc>,
    ) -> Result<Option<Customer>, AppError> {
        match (&contact.phone, &contact.name) {
            (Some(phone), name) => {
                let name = name.as_deref().unwrap_or(phone);
                let customer = self
                    .customer_repo
                    .upsert_purchase_by_phone(&mut *conn, name, phone, contact.email.as_deref(), total, points, now)
                    .await?;
                Ok(Some(customer))
            }
            (None, Some(name)) => {
                let customer = self
                    .customer_repo
                    .create_with_purchase(&mut *conn, name, contact.email.as_deref(), total, points, now)
                    .await?;
                Ok(Some(customer))
            }
            (None, None) => Ok(None),
        }
    }

    async fn find_user_link(&self, conn: &mut PgConnection, contact: &CustomerContact) -> Result<UserLink, AppError> {
        let by_email = match &contact.email {
            Some(email) => self.user_repo.find_ids_by_email(&mut *conn, email).await?,
            None => Vec::new(),
        };
        // Só consulta o telefone se o e-mail não achou ninguém
        let by_phone = match (&contact.phone, by_email.is_empty()) {
            (Some(phone), true) => self.user_repo.find_ids_by_phone(&mut *conn, phone).await?,
            _ => Vec::new(),
        };
        Ok(resolve_user_link(&by_email, &by_phone))
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn get_sale(&self, id: Uuid) -> Result<SaleDetail, AppError> {
        let sale = self
            .sale_repo
            .find_sale(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada.".into()))?;
        let items = self.sale_repo.find_items(id).await?;
        Ok(SaleDetail { sale, items })
    }

    pub async fn list_sales(&self, filter: &SaleFilter, page: &PageParams) -> Result<Paginated<Sale>, AppError> {
        let (sales, total) = self.sale_repo.list_sales(filter, page).await?;
        Ok(Paginated::new(sales, page, total))
    }

    pub async fn list_my_sales(&self, user: &CurrentUser, page: &PageParams) -> Result<Paginated<Sale>, AppError> {
        let (sales, total) = self.sale_repo.list_sales_by_user(user.id, page).await?;
        Ok(Paginated::new(sales, page, total))
    }

    /// Vincula a venda a uma conta depois do fato. Não troca um vínculo existente.
    pub async fn link_user(&self, actor: &CurrentUser, sale_id: Uuid, user_id: Uuid) -> Result<Sale, AppError> {
        let mut tx = self.pool.begin().await?;

        if self.user_repo.find_by_id(&mut *tx, user_id).await?.is_none() {
            return Err(AppError::NotFound("Usuário não encontrado.".into()));
        }
        let current = self
            .sale_repo
            .get_sale_for_update(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada.".into()))?;

        let sale = self
            .sale_repo
            .link_user(&mut *tx, sale_id, user_id)
            .await?
            .ok_or_else(|| AppError::Conflict("A venda já está vinculada a outro usuário.".into()))?;

        if current.user_id.is_none() {
            self.activity_repo
                .record(
                    &mut *tx,
                    NewActivity::by(actor, "sale.user_linked", "sale", sale_id)
                        .with_changes(json!({ "userId": user_id })),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::tests::{d, product};
    use sqlx::types::Json;

    fn line(product_id: Uuid, quantity: i32, size: Option<&str>) -> SaleLineInput {
        SaleLineInput {
            product_id,
            quantity,
            size: size.map(str::to_string),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<Uuid, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn email_match_wins_over_phone() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(resolve_user_link(&[a], &[b]), UserLink::Linked(a));
        assert_eq!(resolve_user_link(&[], &[b]), UserLink::Linked(b));
        assert_eq!(resolve_user_link(&[], &[]), UserLink::NoMatch);
    }

    #[test]
    fn shared_contact_is_not_linked() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            resolve_user_link(&[], &[a, b]),
            UserLink::Ambiguous { matched_by: "phone", candidates: 2 }
        );
        assert_eq!(
            resolve_user_link(&[a, b], &[]),
            UserLink::Ambiguous { matched_by: "email", candidates: 2 }
        );
    }

    #[test]
    fn enough_stock_passes() {
        let p = product("10", None, None);
        let id = p.id;
        assert!(check_availability(&[line(id, 10, None)], &catalog(vec![p])).is_ok());
    }

    #[test]
    fn repeated_lines_are_summed() {
        let mut p = product("10", None, None);
        p.stock = 3;
        let id = p.id;

        let err = check_availability(&[line(id, 2, None), line(id, 2, None)], &catalog(vec![p])).unwrap_err();
        match err {
            AppError::InsufficientStock { requested, available, .. } => {
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn sized_product_checks_bucket_and_requires_size() {
        let mut p = product("80", None, None);
        p.stock = 6;
        p.stock_by_size = Some(Json([("P".to_string(), 5), ("M".to_string(), 1)].into()));
        let id = p.id;
        let products = catalog(vec![p]);

        assert!(check_availability(&[line(id, 5, Some("P"))], &products).is_ok());
        assert!(matches!(
            check_availability(&[line(id, 2, Some("M"))], &products),
            Err(AppError::InsufficientStock { available: 1, .. })
        ));
        assert!(matches!(
            check_availability(&[line(id, 1, None)], &products),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            check_availability(&[line(id, 1, Some("XG"))], &products),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn size_on_unsized_product_is_ignored() {
        let mut p = product("10", None, None);
        p.stock = 2;
        let id = p.id;
        let products = catalog(vec![p]);

        // "P" e "M" caem no mesmo estoque escalar
        assert!(check_availability(&[line(id, 1, Some("P")), line(id, 1, Some("M"))], &products).is_ok());
        assert!(check_availability(&[line(id, 2, Some("P")), line(id, 1, Some("M"))], &products).is_err());
    }

    #[test]
    fn unknown_or_inactive_product_fails() {
        let mut p = product("10", None, None);
        p.is_active = false;
        let id = p.id;
        let products = catalog(vec![p]);

        assert!(matches!(
            check_availability(&[line(Uuid::new_v4(), 1, None)], &products),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            check_availability(&[line(id, 1, None)], &products),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn explicit_tax_wins_over_default_rate() {
        assert_eq!(resolve_tax(Some(d("5")), d("100"), d("10")), d("5"));
        assert_eq!(resolve_tax(None, d("100"), d("10")), d("10"));
        assert_eq!(resolve_tax(None, d("33.33"), Decimal::ZERO), Decimal::ZERO);
    }
}
