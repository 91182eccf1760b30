use axum::http::Uri;

use foodgram_types::api::Page;

use crate::error::ApiError;

pub const MAX_PAGE_SIZE: u32 = 100;

/// Page-number pagination: `page` is 1-based, `limit` overrides the
/// configured page size. `limit=0` falls back to the configured size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub size: u32,
}

impl Pager {
    pub fn new(page: Option<u32>, limit: Option<u32>, default_size: u32) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::InvalidPage);
        }
        let size = limit
            .filter(|&limit| limit > 0)
            .unwrap_or(default_size)
            .clamp(1, MAX_PAGE_SIZE);
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Wraps one page of results. A page past the last one is an error,
    /// except page 1 of an empty list.
    pub fn wrap<T>(&self, uri: &Uri, count: i64, results: Vec<T>) -> Result<Page<T>, ApiError> {
        let size = i64::from(self.size);
        let last = ((count + size - 1) / size).max(1);
        let page = i64::from(self.page);
        if page > last {
            return Err(ApiError::InvalidPage);
        }

        Ok(Page {
            count,
            next: (page < last).then(|| page_link(uri, self.page + 1)),
            previous: (page > 1).then(|| page_link(uri, self.page - 1)),
            results,
        })
    }
}

/// The request path and query with `page` replaced. Page 1 drops the
/// parameter entirely.
fn page_link(uri: &Uri, page: u32) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page="))
        .map(str::to_string)
        .collect();
    if page > 1 {
        pairs.push(format!("page={page}"));
    }

    if pairs.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), pairs.join("&"))
    }
}
