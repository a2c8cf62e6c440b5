//! # Pagination Module
//!
//! A `Pagination` request (serde-friendly, so it can be lifted straight out of
//! query parameters) and the `Paginated` wrapper it produces.
//!
//! ## Features
//!
//! - **Serde Compatibility**: derives `Serialize` and `Deserialize`
//! - **Query Integration**: `paginate` counts a chain, then reads one page
//! - **Defaults**: page 0, 10 items per page
//!
//! ## Example
//!
//! ```rust,ignore
//! let page = Pagination::new(0, 20).paginate(db.model::<User>()?.and_where("active", true)?).await?;
//!
//! println!("{} users on {} pages", page.total, page.total_pages);
//! let json = serde_json::to_string(&page)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Model, gate::Method, record::Record};

/// A page request.
///
/// Can be deserialized from query parameters (e.g., `?page=1&limit=20`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// The page number (0-indexed). Default: 0.
    #[serde(default)]
    pub page: usize,

    /// The number of items per page. Default: 10.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    /// The items on this page.
    pub data: Vec<T>,
    /// Rows matching the query across all pages.
    pub total: i64,
    /// The current page number (0-indexed).
    pub page: usize,
    /// The number of items per page.
    pub limit: usize,
    /// The total number of pages.
    pub total_pages: i64,
}

fn default_limit() -> usize {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 0, limit: default_limit() }
    }
}

impl Pagination {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    fn offset(&self) -> Result<u64, Error> {
        self.page
            .checked_mul(self.limit)
            .map(|offset| offset as u64)
            .ok_or_else(|| Error::InvalidArgument(format!("Page {} of {} rows is out of range", self.page, self.limit)))
    }

    /// Runs a `COUNT` over the chain's predicates, then reads this page.
    ///
    /// Any ordering already on the chain is kept for the page read.
    pub async fn paginate<'a, M: Model>(self, record: Record<'a, M>) -> Result<Paginated<Record<'a, M>>, Error> {
        if self.limit == 0 {
            return Err(Error::InvalidArgument("Pagination limit must be greater than zero".to_string()));
        }
        record.gate.check(Method::Get)?;
        let offset = self.offset()?;

        let total = record.count_rows("*").await?;
        let data = record.fetch_page(self.limit as u64, offset).await?;
        let total_pages = (total as f64 / self.limit as f64).ceil() as i64;

        Ok(Paginated { data, total, page: self.page, limit: self.limit, total_pages })
    }
}
