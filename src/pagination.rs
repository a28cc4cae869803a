use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const ADMIN_PAGE_SIZE: u32 = 5;

/// 1-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::Validation("page must be 1 or greater".to_string()));
        }
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(AppError::Validation("page_size must be 1 or greater".to_string()));
        }
        Ok(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    pub fn fixed(page: Option<u32>, page_size: u32) -> Result<Self, AppError> {
        let mut req = Self::new(page, None)?;
        req.page_size = page_size;
        Ok(req)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Fails when the page lies past the end of `count` rows. The first page is
    /// always valid, even when empty.
    pub fn check_against(&self, count: i64) -> Result<(), AppError> {
        if self.page > 1 && self.offset() >= count {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(req: PageRequest, count: i64, results: Vec<T>) -> Self {
        let size = i64::from(req.page_size);
        let total_pages = ((count + size - 1) / size).max(1);
        let next = (i64::from(req.page) < total_pages).then(|| req.page + 1);
        let previous = (req.page > 1).then(|| req.page - 1);
        Self {
            count,
            page: req.page,
            page_size: req.page_size,
            total_pages,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_links() {
        let req = PageRequest::fixed(Some(2), ADMIN_PAGE_SIZE).unwrap();
        let page = Page::new(req, 12, vec![(); 5]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));

        let last = Page::new(PageRequest::fixed(Some(3), 5).unwrap(), 12, vec![(); 2]);
        assert_eq!(last.next, None);
    }

    #[test]
    fn test_empty_first_page_is_valid() {
        let req = PageRequest::new(None, None).unwrap();
        assert!(req.check_against(0).is_ok());
        let page: Page<()> = Page::new(req, 0, Vec::new());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn test_out_of_range_page() {
        let req = PageRequest::new(Some(3), Some(5)).unwrap();
        assert!(matches!(req.check_against(10), Err(AppError::NotFound(_))));
        assert!(req.check_against(11).is_ok());
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(matches!(PageRequest::new(Some(0), None), Err(AppError::Validation(_))));
        assert!(matches!(PageRequest::new(None, Some(0)), Err(AppError::Validation(_))));
        assert_eq!(PageRequest::new(None, Some(1000)).unwrap().page_size, MAX_PAGE_SIZE);
    }
}
