// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Parâmetros `?page=&limit=` aceitos por todas as listagens.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Página começa em 1; valores inválidos caem no padrão.
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(params: &PageParams, total: i64) -> Self {
        let page = params.page();
        let limit = params.limit();
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Envelope das respostas paginadas: `{ data: [...], pagination: {...} }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, params: &PageParams, total: i64) -> Self {
        Self {
            data,
            pagination: PageMeta::new(params, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let params = PageParams { page: Some(0), limit: Some(1000) };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_LIMIT);
        assert_eq!(PageParams::default().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn meta_for_middle_page() {
        let params = PageParams { page: Some(2), limit: Some(10) };
        let meta = PageMeta::new(&params, 35);

        assert_eq!(params.offset(), 10);
        assert_eq!(meta.total_pages, 4);
        assert!(meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let params = PageParams { page: Some(i64::MAX), limit: Some(100) };
        assert_eq!(params.offset(), i64::MAX);
        assert!(params.offset() >= 0);
    }

    #[test]
    fn meta_for_empty_result() {
        let meta = PageMeta::new(&PageParams::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }
}
