//! OData query parameters for a page request

use super::types::PageState;

/// Query parameters for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// `$top`
    pub top: u32,
    /// `$skip`, absent on the first page
    pub skip: Option<u64>,
    /// `$orderby`
    pub order_by: Option<String>,
    /// `$filter`
    pub filter: Option<String>,
}

impl PageQuery {
    /// Build the query for the page `state` points at
    pub fn for_page(state: &PageState) -> Self {
        Self {
            top: state.page_size,
            skip: (!state.is_first_page()).then_some(state.offset),
            order_by: None,
            filter: None,
        }
    }

    /// Order ascending by `field`
    #[must_use]
    pub fn order_by_asc(mut self, field: impl AsRef<str>) -> Self {
        self.order_by = Some(format!("{} asc", field.as_ref()));
        self
    }

    /// Set the filter expression; empty expressions are dropped
    #[must_use]
    pub fn filter(mut self, expr: Option<String>) -> Self {
        self.filter = expr.filter(|e| !e.trim().is_empty());
        self
    }

    /// Parameters in request order
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("$top", self.top.to_string())];
        if let Some(skip) = self.skip {
            pairs.push(("$skip", skip.to_string()));
        }
        if let Some(order_by) = &self.order_by {
            pairs.push(("$orderby", order_by.clone()));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("$filter", filter.clone()));
        }
        pairs
    }
}
