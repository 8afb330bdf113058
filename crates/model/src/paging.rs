use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 50;

/// Raw paging parameters as received from a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl PageRequest {
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self { offset, limit }
    }

    /// Apply defaults and reject over-sized pages.
    pub fn resolve(self) -> Result<Page, ValidationError> {
        if let Some(limit) = self.limit {
            if limit > MAX_LIMIT {
                return Err(ValidationError::LimitTooLarge {
                    limit,
                    max: MAX_LIMIT,
                });
            }
        }
        Ok(Page {
            offset: self.offset.unwrap_or(0),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
        })
    }
}

/// Resolved paging parameters handed to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub offset: u32,
    pub limit: u32,
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> PagedResult<T> {
    /// Slice `all` according to `page`.
    pub fn from_all(all: Vec<T>, page: Page) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Self {
            offset: page.offset,
            limit: page.limit,
            total,
            items,
        }
    }

    pub fn empty(page: Page) -> Self {
        Self {
            offset: page.offset,
            limit: page.limit,
            total: 0,
            items: Vec::new(),
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }
}
