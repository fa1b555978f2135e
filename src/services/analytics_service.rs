// src/services/analytics_service.rs

// Relatórios só de leitura. O banco entrega as linhas do período e a
// agregação é feita aqui, em funções puras.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, ExpenseRepository, ReturnRepository, SaleRepository},
    models::{
        analytics::{
            CategoryTotal, DailySales, DateRangeParams, ExpenseFact, FinancialReport, RefundFact,
            SaleFact, SaleLineFact, SalesSummary, TopProduct,
        },
        catalog::Product,
    },
    services::pricing::round2,
};

const DEFAULT_RANGE_DAYS: u64 = 30;
const MAX_RANGE_DAYS: i64 = 366;
const DEFAULT_TOP_LIMIT: i64 = 10;
const MAX_TOP_LIMIT: i64 = 50;

/// Período inclusivo. Sem datas: os últimos 30 dias até hoje.
pub fn resolve_range(params: &DateRangeParams, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let to = params.to.unwrap_or(today);
    let from = match params.from {
        Some(from) => from,
        None => to
            .checked_sub_days(Days::new(DEFAULT_RANGE_DAYS - 1))
            .ok_or_else(|| AppError::BadRequest("Período inválido.".into()))?,
    };

    if from > to {
        return Err(AppError::BadRequest(
            "A data inicial não pode ser posterior à final.".into(),
        ));
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(AppError::BadRequest(format!(
            "O período máximo é de {} dias.",
            MAX_RANGE_DAYS
        )));
    }
    Ok((from, to))
}

/// [início do primeiro dia, início do dia seguinte ao último), em UTC.
pub fn day_bounds(from: NaiveDate, to: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let end = to
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::BadRequest("Período inválido.".into()))?;
    Ok((
        from.and_time(NaiveTime::MIN).and_utc(),
        end.and_time(NaiveTime::MIN).and_utc(),
    ))
}

pub fn summarize_sales(facts: &[SaleFact], from: NaiveDate, to: NaiveDate) -> SalesSummary {
    let sale_count = facts.len() as i64;
    let revenue: Decimal = facts.iter().map(|f| f.subtotal).sum();
    let total: Decimal = facts.iter().map(|f| f.total).sum();

    let average_ticket = if sale_count == 0 {
        Decimal::ZERO
    } else {
        round2(total / Decimal::from(sale_count))
    };

    SalesSummary {
        from,
        to,
        sale_count,
        items_sold: facts.iter().map(|f| f.items_sold).sum(),
        revenue,
        tax: facts.iter().map(|f| f.tax).sum(),
        discounts: facts.iter().map(|f| f.discount_amount).sum(),
        total_cost: facts.iter().map(|f| f.total_cost).sum(),
        total_profit: facts.iter().map(|f| f.total_profit).sum(),
        average_ticket,
    }
}

/// Um balde por dia do período, inclusive os dias sem venda.
pub fn daily_sales(facts: &[SaleFact], from: NaiveDate, to: NaiveDate) -> Vec<DailySales> {
    let mut days: BTreeMap<NaiveDate, DailySales> = from
        .iter_days()
        .take_while(|d| *d <= to)
        .map(|date| {
            (
                date,
                DailySales {
                    date,
                    sale_count: 0,
                    revenue: Decimal::ZERO,
                    profit: Decimal::ZERO,
                },
            )
        })
        .collect();

    for fact in facts {
        if let Some(day) = days.get_mut(&fact.created_at.date_naive()) {
            day.sale_count += 1;
            day.revenue += fact.subtotal;
            day.profit += fact.total_profit;
        }
    }

    days.into_values().collect()
}

/// Mais vendidos por quantidade; empate desempata pela receita e depois pelo nome.
pub fn top_products(lines: &[SaleLineFact], limit: i64) -> Vec<TopProduct> {
    let mut by_product: HashMap<Uuid, TopProduct> = HashMap::new();

    for line in lines {
        let entry = by_product.entry(line.product_id).or_insert_with(|| TopProduct {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: 0,
            revenue: Decimal::ZERO,
            profit: Decimal::ZERO,
        });
        entry.quantity += i64::from(line.quantity);
        entry.revenue += line.subtotal;
        entry.profit += line.profit;
    }

    let mut ranked: Vec<TopProduct> = by_product.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(usize::try_from(limit).unwrap_or(0));
    ranked
}

pub fn top_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT)
}

/// Lucro líquido = lucro bruto − (reembolsos − custo do que voltou ao estoque) − despesas.
pub fn financial_report(
    sales: &[SaleFact],
    refunds: &[RefundFact],
    expenses: &[ExpenseFact],
    from: NaiveDate,
    to: NaiveDate,
) -> FinancialReport {
    let revenue: Decimal = sales.iter().map(|s| s.subtotal).sum();
    let cost_of_goods: Decimal = sales.iter().map(|s| s.total_cost).sum();
    let gross_profit = revenue - cost_of_goods;

    let refunded: Decimal = refunds.iter().map(|r| r.refund_amount).sum();
    let returned_cost: Decimal = refunds.iter().map(|r| r.returned_cost).sum();

    let mut categories: BTreeMap<String, Decimal> = BTreeMap::new();
    for expense in expenses {
        *categories.entry(expense.category.clone()).or_insert(Decimal::ZERO) += expense.amount;
    }
    let expenses_total: Decimal = categories.values().copied().sum();

    let mut expenses_by_category: Vec<CategoryTotal> = categories
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    // BTreeMap já deixou em ordem alfabética; sort estável mantém isso no empate
    expenses_by_category.sort_by(|a, b| b.total.cmp(&a.total));

    FinancialReport {
        from,
        to,
        revenue,
        tax_collected: sales.iter().map(|s| s.tax).sum(),
        cost_of_goods,
        gross_profit,
        refunds: refunded,
        expenses_total,
        expenses_by_category,
        net_profit: gross_profit - (refunded - returned_cost) - expenses_total,
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    sale_repo: SaleRepository,
    return_repo: ReturnRepository,
    expense_repo: ExpenseRepository,
    catalog_repo: CatalogRepository,
}

impl AnalyticsService {
    pub fn new(
        sale_repo: SaleRepository,
        return_repo: ReturnRepository,
        expense_repo: ExpenseRepository,
        catalog_repo: CatalogRepository,
    ) -> Self {
        Self {
            sale_repo,
            return_repo,
            expense_repo,
            catalog_repo,
        }
    }

    fn range(&self, params: &DateRangeParams) -> Result<(NaiveDate, NaiveDate), AppError> {
        resolve_range(params, Utc::now().date_naive())
    }

    pub async fn summary(&self, params: &DateRangeParams) -> Result<SalesSummary, AppError> {
        let (from, to) = self.range(params)?;
        let (start, end) = day_bounds(from, to)?;
        let facts = self.sale_repo.sale_facts(start, end).await?;
        Ok(summarize_sales(&facts, from, to))
    }

    pub async fn sales_by_day(&self, params: &DateRangeParams) -> Result<Vec<DailySales>, AppError> {
        let (from, to) = self.range(params)?;
        let (start, end) = day_bounds(from, to)?;
        let facts = self.sale_repo.sale_facts(start, end).await?;
        Ok(daily_sales(&facts, from, to))
    }

    pub async fn top_products(&self, params: &DateRangeParams) -> Result<Vec<TopProduct>, AppError> {
        let (from, to) = self.range(params)?;
        let (start, end) = day_bounds(from, to)?;
        let lines = self.sale_repo.sale_line_facts(start, end).await?;
        Ok(top_products(&lines, top_limit(params.limit)))
    }

    pub async fn financial_report(&self, params: &DateRangeParams) -> Result<FinancialReport, AppError> {
        let (from, to) = self.range(params)?;
        let (start, end) = day_bounds(from, to)?;

        let sales = self.sale_repo.sale_facts(start, end).await?;
        let refunds = self.return_repo.refund_facts(start, end).await?;
        let expenses = self.expense_repo.expense_facts(from, to).await?;

        tracing::debug!(
            sales = sales.len(),
            refunds = refunds.len(),
            expenses = expenses.len(),
            "Relatório financeiro montado"
        );
        Ok(financial_report(&sales, &refunds, &expenses, from, to))
    }

    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, AppError> {
        self.catalog_repo.low_stock(threshold.max(0)).await
    }
}
