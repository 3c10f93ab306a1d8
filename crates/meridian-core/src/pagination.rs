//! List pagination.
//!
//! Clients select pages per named list through query parameters:
//!
//! | Key | Meaning |
//! |---|---|
//! | `page@<name>` | 1-indexed page of list `<name>` |
//! | `perPage@<name>` | page size of list `<name>` |
//!
//! An empty name (`page@=2`) addresses the default list. Unknown keys are
//! ignored; values that are not non-negative integers fail the request.

use std::ops::Range;

use indexmap::IndexMap;

use crate::error::ApiError;
use crate::reply::{Page, Reply};

/// Page size used when a list does not specify one.
pub const DEFAULT_PER_PAGE: u64 = 5;

/// Error code for malformed pagination parameters.
pub const INVALID_PAGINATION: &str = "pagination.invalid";

const PAGE_PREFIX: &str = "page@";
const PER_PAGE_PREFIX: &str = "perPage@";

/// Page selection for one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginableListInfo {
    /// Page size.
    pub per_page: u64,
    /// Current page, 1-indexed.
    pub page: u64,
}

impl PaginableListInfo {
    /// Returns the item range of the current page.
    pub fn range(&self) -> Range<usize> {
        let per_page = usize::try_from(self.per_page).unwrap_or(usize::MAX);
        let page = usize::try_from(self.page).unwrap_or(usize::MAX);
        let start = page.saturating_sub(1).saturating_mul(per_page);
        start..start.saturating_add(per_page)
    }
}

impl Default for PaginableListInfo {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

/// Page selections for every list of a request, keyed by list name.
///
/// `None` names the default list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    lists: IndexMap<Option<String>, PaginableListInfo>,
}

impl PaginationInfo {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the pagination keys of a query string.
    pub fn from_query(query: &str) -> Result<Self, ApiError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|err| ApiError::bad_request(INVALID_PAGINATION, err.to_string()))?;

        let mut info = Self::new();
        for (key, value) in pairs {
            if let Some(name) = key.strip_prefix(PAGE_PREFIX) {
                let page = parse_count(&key, &value)?;
                if page == 0 {
                    return Err(ApiError::bad_request(
                        INVALID_PAGINATION,
                        format!("`{key}` must be at least 1"),
                    ));
                }
                info.list(list_name(name)).page = page;
            } else if let Some(name) = key.strip_prefix(PER_PAGE_PREFIX) {
                let per_page = parse_count(&key, &value)?;
                info.list(list_name(name)).per_page = if per_page == 0 {
                    DEFAULT_PER_PAGE
                } else {
                    per_page
                };
            }
        }
        Ok(info)
    }

    /// Returns the selection for a list, creating a default one on first access.
    pub fn list(&mut self, name: Option<&str>) -> &mut PaginableListInfo {
        self.lists.entry(name.map(str::to_owned)).or_default()
    }

    /// Returns the selection for the default list.
    pub fn default_list(&mut self) -> &mut PaginableListInfo {
        self.list(None)
    }

    /// Returns the selection for a list without creating it.
    pub fn get(&self, name: Option<&str>) -> Option<&PaginableListInfo> {
        self.lists.get(&name.map(str::to_owned))
    }

    /// Returns the number of known lists.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Returns `true` if no list is known.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Iterates over known lists in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &PaginableListInfo)> {
        self.lists.iter().map(|(name, info)| (name.as_deref(), info))
    }
}

fn list_name(name: &str) -> Option<&str> {
    (!name.is_empty()).then_some(name)
}

fn parse_count(key: &str, value: &str) -> Result<u64, ApiError> {
    value.trim().parse().map_err(|_| {
        ApiError::bad_request(
            INVALID_PAGINATION,
            format!("`{key}` must be a non-negative integer, got `{value}`"),
        )
    })
}

/// Slices `items` to the selected page and wraps it in an envelope.
///
/// When `has_next_page` is not given it is inferred from whether items
/// remain after the page.
pub fn paginate(items: Vec<Reply>, info: PaginableListInfo, has_next_page: Option<bool>) -> Page {
    let total = items.len();
    let range = info.range();
    let has_next = has_next_page.unwrap_or(total > range.end);
    let page_items = items
        .into_iter()
        .skip(range.start)
        .take(range.end - range.start)
        .collect();

    Page {
        items: page_items,
        page: info.page,
        per_page: info.per_page,
        next_page: has_next.then(|| info.page.saturating_add(1)),
    }
}

/// Wraps items that are already a single page in an envelope.
pub fn as_paginable(items: Vec<Reply>, info: PaginableListInfo, has_next_page: Option<bool>) -> Page {
    Page {
        items,
        page: info.page,
        per_page: info.per_page,
        next_page: has_next_page
            .unwrap_or(false)
            .then(|| info.page.saturating_add(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn items(n: usize) -> Vec<Reply> {
        (0..n).map(|i| Reply::Json(json!(i))).collect()
    }

    fn values(page: &Page) -> Vec<serde_json::Value> {
        page.items
            .iter()
            .filter_map(|r| r.as_json().cloned())
            .collect()
    }

    #[test]
    fn test_unseen_list_created_once_with_defaults() {
        let mut info = PaginationInfo::new();
        assert_eq!(*info.list(Some("comments")), PaginableListInfo::default());
        info.list(Some("comments")).page = 4;
        assert_eq!(info.list(Some("comments")).page, 4);
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn test_parse_named_and_default_lists() {
        let info =
            PaginationInfo::from_query("page@=2&perPage@comments=10&page@comments=3&q=rust").unwrap();
        assert_eq!(info.get(None), Some(&PaginableListInfo { per_page: 5, page: 2 }));
        assert_eq!(
            info.get(Some("comments")),
            Some(&PaginableListInfo { per_page: 10, page: 3 })
        );
        assert_eq!(info.len(), 2);
    }

    #[test]
    fn test_parse_zero_per_page_uses_default() {
        let info = PaginationInfo::from_query("perPage@=0").unwrap();
        assert_eq!(info.get(None).map(|l| l.per_page), Some(DEFAULT_PER_PAGE));
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        for query in ["page@=abc", "perPage@x=-1", "page@=0"] {
            let err = PaginationInfo::from_query(query).unwrap_err();
            assert_eq!(err.status().as_u16(), 400, "{query}");
            assert_eq!(err.code(), INVALID_PAGINATION);
        }
    }

    #[test]
    fn test_paginate_second_page_of_ten() {
        let info = PaginableListInfo { per_page: 5, page: 2 };
        let page = paginate(items(10), info, None);
        assert_eq!(values(&page), (5..10).map(|i| json!(i)).collect::<Vec<_>>());
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_paginate_infers_next_page() {
        let info = PaginableListInfo { per_page: 5, page: 2 };
        let page = paginate(items(11), info, None);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.next_page, Some(3));
    }

    #[test]
    fn test_paginate_explicit_has_next_wins() {
        let info = PaginableListInfo::default();
        assert_eq!(paginate(items(2), info, Some(true)).next_page, Some(2));
        assert_eq!(paginate(items(20), info, Some(false)).next_page, None);
    }

    #[test]
    fn test_paginate_past_the_end() {
        let info = PaginableListInfo { per_page: 5, page: 9 };
        let page = paginate(items(3), info, None);
        assert!(page.items.is_empty());
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_as_paginable_keeps_items() {
        let page = as_paginable(items(7), PaginableListInfo::default(), None);
        assert_eq!(page.items.len(), 7);
        assert_eq!(page.next_page, None);
    }

    proptest! {
        #[test]
        fn prop_pages_partition_items(len in 0usize..60, per_page in 1u64..9) {
            let mut seen = Vec::new();
            let mut page_no = 1;
            loop {
                let info = PaginableListInfo { per_page, page: page_no };
                let page = paginate(items(len), info, None);
                seen.extend(values(&page));
                match page.next_page {
                    Some(next) => {
                        prop_assert_eq!(next, page_no + 1);
                        page_no = next;
                    }
                    None => break,
                }
            }
            prop_assert_eq!(seen, (0..len).map(|i| json!(i)).collect::<Vec<_>>());
        }
    }
}
