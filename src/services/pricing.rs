// src/services/pricing.rs

// Regras de preço compartilhadas pela vitrine e pelo caixa. Tudo aqui é puro:
// o "agora" vem de fora para que exibição e venda avaliem o desconto igual.

use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

use crate::{
    common::error::AppError,
    models::{
        catalog::Product,
        sale::{NewSaleItem, SaleTotals},
    },
};

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Desconto ativo: percentual positivo e sem término, ou término ainda no futuro.
pub fn is_discount_active(
    discount: Option<Decimal>,
    discount_end_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match discount {
        Some(pct) if pct > Decimal::ZERO => discount_end_time.is_none_or(|end| end > now),
        _ => false,
    }
}

/// Percentual que vale agora, ou None.
pub fn active_discount(product: &Product, now: DateTime<Utc>) -> Option<Decimal> {
    product
        .discount
        .filter(|_| is_discount_active(product.discount, product.discount_end_time, now))
}

pub fn discounted_price(price: Decimal, discount: Option<Decimal>) -> Decimal {
    match discount {
        Some(pct) => round2(price * (Decimal::ONE_HUNDRED - pct) / Decimal::ONE_HUNDRED),
        None => price,
    }
}

pub fn effective_price(product: &Product, now: DateTime<Utc>) -> Decimal {
    discounted_price(product.price, active_discount(product, now))
}

/// Precifica uma linha do carrinho com o estado do produto no momento da venda.
pub fn price_line(product: &Product, quantity: i32, size: Option<String>, now: DateTime<Utc>) -> NewSaleItem {
    let qty = Decimal::from(quantity);
    let discount = active_discount(product, now);
    let final_price = discounted_price(product.price, discount);

    let subtotal = final_price * qty;
    let cost = product.purchase_price.unwrap_or(Decimal::ZERO) * qty;

    NewSaleItem {
        product_id: product.id,
        product_name: product.name.clone(),
        unit_price: product.price,
        discount,
        final_price,
        quantity,
        size,
        subtotal,
        gross_subtotal: product.price * qty,
        cost,
        profit: subtotal - cost,
    }
}

/// Soma as linhas, aplica o imposto e calcula o troco. Troco negativo aborta a venda.
pub fn summarize_sale(items: &[NewSaleItem], tax: Decimal, cash_received: Decimal) -> Result<SaleTotals, AppError> {
    let subtotal: Decimal = items.iter().map(|i| i.subtotal).sum();
    let gross: Decimal = items.iter().map(|i| i.gross_subtotal).sum();
    let total_cost: Decimal = items.iter().map(|i| i.cost).sum();

    let subtotal = round2(subtotal);
    let tax = round2(tax);
    let total = subtotal + tax;
    let change = round2(cash_received) - total;

    if change < Decimal::ZERO {
        return Err(AppError::InsufficientCash {
            total,
            received: cash_received,
        });
    }

    Ok(SaleTotals {
        subtotal,
        tax,
        discount_amount: round2(gross) - subtotal,
        total,
        total_cost: round2(total_cost),
        total_profit: subtotal - round2(total_cost),
        cash_received: round2(cash_received),
        change,
    })
}

/// Pontos de fidelidade: parte inteira de total × taxa.
pub fn loyalty_points(total: Decimal, points_per_unit: Decimal) -> i32 {
    (total * points_per_unit).floor().to_i32().unwrap_or(0).max(0)
}

/// Chave do contador anual: "SALE-2026".
pub fn counter_scope(prefix: &str, year: i32) -> String {
    format!("{prefix}-{year}")
}

/// "SALE-2026-0001". Passando de 9999 o número só cresce em dígitos.
pub fn format_document_number(prefix: &str, year: i32, sequence: i32) -> String {
    format!("{prefix}-{year}-{sequence:04}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::types::Json;
    use uuid::Uuid;

    pub(crate) fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // Produto mínimo para os testes de regra pura
    pub(crate) fn product(price: &str, discount: Option<&str>, end: Option<DateTime<Utc>>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            category_id: None,
            name: "Camiseta".into(),
            description: None,
            price: d(price),
            purchase_price: None,
            stock: 10,
            stock_by_size: None,
            discount: discount.map(d),
            discount_end_time: end,
            images: Json(vec![]),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn expired_discount_is_ignored() {
        let now = Utc::now();
        let p = product("100", Some("20"), Some(now - Duration::hours(1)));

        assert!(!is_discount_active(p.discount, p.discount_end_time, now));
        assert_eq!(effective_price(&p, now), d("100"));
    }

    #[test]
    fn discount_without_end_is_always_active() {
        let now = Utc::now();
        let p = product("100", Some("20"), None);

        assert!(is_discount_active(p.discount, None, now + Duration::days(3650)));
        assert_eq!(effective_price(&p, now), d("80.00"));
    }

    #[test]
    fn zero_discount_or_end_at_now_is_inactive() {
        let now = Utc::now();
        assert!(!is_discount_active(Some(Decimal::ZERO), None, now));
        assert!(!is_discount_active(None, None, now));
        // Término precisa estar estritamente no futuro
        assert!(!is_discount_active(Some(d("10")), Some(now), now));
    }

    #[test]
    fn two_units_at_ten_percent_off() {
        let now = Utc::now();
        let p = product("1000", Some("10"), None);

        let line = price_line(&p, 2, None, now);
        assert_eq!(line.discount, Some(d("10")));
        assert_eq!(line.final_price, d("900"));
        assert_eq!(line.subtotal, d("1800"));

        let totals = summarize_sale(&[line], Decimal::ZERO, d("2000")).unwrap();
        assert_eq!(totals.subtotal, d("1800"));
        assert_eq!(totals.discount_amount, d("200"));
        assert_eq!(totals.total, d("1800"));
        assert_eq!(totals.change, d("200"));
    }

    #[test]
    fn inactive_discount_is_not_snapshotted() {
        let now = Utc::now();
        let p = product("50", Some("30"), Some(now - Duration::minutes(5)));

        let line = price_line(&p, 1, Some("M".into()), now);
        assert_eq!(line.discount, None);
        assert_eq!(line.final_price, d("50"));
        assert_eq!(line.size.as_deref(), Some("M"));
    }

    #[test]
    fn final_price_rounds_half_away_from_zero() {
        let now = Utc::now();
        assert_eq!(effective_price(&product("9.99", Some("15"), None), now), d("8.49"));
        assert_eq!(effective_price(&product("0.05", Some("50"), None), now), d("0.03"));
    }

    #[test]
    fn cost_defaults_to_zero_and_profit_follows() {
        let now = Utc::now();
        let mut with_cost = product("100", None, None);
        with_cost.purchase_price = Some(d("60"));
        let without_cost = product("40", None, None);

        let a = price_line(&with_cost, 2, None, now);
        let b = price_line(&without_cost, 1, None, now);
        assert_eq!(a.cost, d("120"));
        assert_eq!(a.profit, d("80"));
        assert_eq!(b.cost, Decimal::ZERO);
        assert_eq!(b.profit, d("40"));

        let totals = summarize_sale(&[a, b], d("12.50"), d("300")).unwrap();
        assert_eq!(totals.subtotal, d("240"));
        assert_eq!(totals.total, d("252.50"));
        assert_eq!(totals.total_cost, d("120"));
        assert_eq!(totals.total_profit, d("120"));
        assert_eq!(totals.subtotal + totals.tax, totals.total);
        assert_eq!(totals.cash_received - totals.total, totals.change);
    }

    #[test]
    fn short_cash_is_rejected() {
        let now = Utc::now();
        let line = price_line(&product("100", None, None), 1, None, now);

        let err = summarize_sale(&[line], d("5"), d("100")).unwrap_err();
        assert!(matches!(err, AppError::InsufficientCash { .. }));
    }

    #[test]
    fn exact_cash_gives_zero_change() {
        let now = Utc::now();
        let line = price_line(&product("100", None, None), 1, None, now);

        let totals = summarize_sale(&[line], Decimal::ZERO, d("100")).unwrap();
        assert_eq!(totals.change, Decimal::ZERO);
    }

    #[test]
    fn loyalty_points_are_floored() {
        assert_eq!(loyalty_points(d("1800"), d("0.01")), 18);
        assert_eq!(loyalty_points(d("99.99"), d("0.01")), 0);
        assert_eq!(loyalty_points(d("250"), Decimal::ZERO), 0);
    }

    #[test]
    fn document_numbers_are_zero_padded() {
        assert_eq!(counter_scope("SALE", 2025), "SALE-2025");
        assert_eq!(format_document_number("SALE", 2025, 1), "SALE-2025-0001");
        assert_eq!(format_document_number("RET", 2026, 42), "RET-2026-0042");
        assert_eq!(format_document_number("EXP", 2026, 12345), "EXP-2026-12345");
    }
}
