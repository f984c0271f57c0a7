use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, IntoParams)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.page_size()
    }
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: u64) -> Self {
        Self {
            items,
            page: query.page(),
            page_size: query.page_size(),
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults() {
        let query = PageQuery {
            page: None,
            page_size: None,
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 20);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_page_query_clamps() {
        let query = PageQuery {
            page: Some(0),
            page_size: Some(1000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 100);

        let query = PageQuery {
            page: Some(3),
            page_size: Some(10),
        };
        assert_eq!(query.offset(), 20);
    }
}
