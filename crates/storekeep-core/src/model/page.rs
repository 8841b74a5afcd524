use serde::Serialize;

use super::product::Product;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

/// A normalised page selector: `page >= 1`, `1 <= limit <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl PageRequest {
    /// Out-of-range or missing values fall back to page 1 and a limit of 10;
    /// limits above 100 are capped.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => usize::try_from(p).unwrap_or(1),
            _ => 1,
        };
        let limit = match limit {
            Some(l) if l >= 1 => usize::try_from(l).map_or(MAX_LIMIT, |l| l.min(MAX_LIMIT)),
            _ => DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}
