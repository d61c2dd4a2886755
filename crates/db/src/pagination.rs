//! Paginated query support shared by every list/query store method.
//!
//! Callers pass `sortBy` in `field:asc|desc` form; fields are checked
//! against a per-store whitelist so user input never reaches the ORDER BY
//! clause verbatim.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct PageParams {
    pub sort_by: Option<String>,
    pub limit: i64,
    pub page: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self { sort_by: None, limit: 10, page: 1 }
    }
}

impl PageParams {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub total_results: i64,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, params: &PageParams, total_results: i64) -> Self {
        let limit = params.limit();
        let total_pages = if total_results == 0 { 0 } else { (total_results + limit - 1) / limit };
        Self { results, page: params.page.max(1), limit, total_pages, total_results }
    }
}

/// Build an ORDER BY clause from a `field:direction` sort expression.
/// Unknown fields and directions fall back to the default clause.
pub(crate) fn order_clause(
    sort_by: Option<&str>,
    allowed: &[&str],
    default: &'static str,
) -> String {
    let Some(raw) = sort_by else {
        return default.to_string();
    };

    let mut parts = raw.splitn(2, ':');
    let field = parts.next().unwrap_or_default().trim();
    let direction = match parts.next().map(|value| value.trim().to_ascii_lowercase()) {
        Some(direction) if direction == "desc" => "DESC",
        Some(direction) if direction == "asc" => "ASC",
        None => "ASC",
        Some(_) => return default.to_string(),
    };

    if !allowed.contains(&field) {
        return default.to_string();
    }

    format!("{field} {direction}")
}
