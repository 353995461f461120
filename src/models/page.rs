//! Offset pagination shared by listing endpoints.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Largest page a client may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Validate page coordinates.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if `page_size` is 0 or above [`MAX_PAGE_SIZE`].
    pub fn new(page: u32, page_size: u32) -> Result<Self, AppError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::InvalidRequest(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }
}

/// Query string of paged endpoints: `?page=0&pageSize=20`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,

    #[serde(rename = "pageSize", alias = "page_size")]
    pub page_size: u32,
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            page_size: request.page_size,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(request.page_size)),
        }
    }

    /// Convert every element, keeping the page coordinates.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_bounds_are_enforced() {
        assert!(PageRequest::new(0, 0).is_err());
        assert!(PageRequest::new(0, MAX_PAGE_SIZE + 1).is_err());
        assert_eq!(PageRequest::new(3, 20).unwrap().offset(), 60);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(0, 10).unwrap();
        assert_eq!(Page::new(Vec::<u8>::new(), request, 0).total_pages, 0);
        assert_eq!(Page::new(Vec::<u8>::new(), request, 10).total_pages, 1);
        assert_eq!(Page::new(Vec::<u8>::new(), request, 11).total_pages, 2);
    }

    #[test]
    fn map_keeps_coordinates() {
        let request = PageRequest::new(1, 2).unwrap();
        let page = Page::new(vec![1, 2], request, 5).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 3);
    }
}
