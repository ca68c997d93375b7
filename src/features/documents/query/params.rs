use crate::core::error::{AppError, Result};
use crate::shared::constants::{DEFAULT_LIST_LIMIT, MAX_PAGE_SIZE};
use crate::shared::types::parse_flag;

/// Reserved list parameters plus the remaining filter pairs
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub keyword: Option<String>,
    pub sort_field: Option<String>,
    pub distinct_field: Option<String>,
    pub group_by_field: Option<String>,
    pub sort_order: String,
    pub language: Option<String>,
    pub random: bool,
    /// Every non-reserved parameter, in query order
    pub filters: Vec<(String, String)>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            keyword: None,
            sort_field: None,
            distinct_field: None,
            group_by_field: None,
            sort_order: "asc".to_string(),
            language: None,
            random: false,
            filters: Vec::new(),
        }
    }
}

impl ListParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        let mut params = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "page" => params.page = parse_int(&key, &value)?.max(1),
                "limit" => params.limit = parse_int(&key, &value)?.clamp(1, MAX_PAGE_SIZE),
                "offset" => params.offset = parse_int(&key, &value)?.max(0),
                "keyword" => params.keyword = non_empty(value),
                "sortField" => params.sort_field = non_empty(value),
                "distinctField" => params.distinct_field = non_empty(value),
                "groupByField" => params.group_by_field = non_empty(value),
                "sortOrder" => params.sort_order = value,
                "language" => params.language = non_empty(value),
                "random" => params.random = parse_flag(&value),
                _ => params.filters.push((key, value)),
            }
        }

        Ok(params)
    }

    pub fn skip(&self) -> Result<i64> {
        page_skip(self.page, self.limit, self.offset)
    }
}

/// `offset + (page - 1) * limit`, rejecting pages past the end of `i64`
pub fn page_skip(page: i64, limit: i64, offset: i64) -> Result<i64> {
    page.saturating_sub(1)
        .checked_mul(limit)
        .and_then(|skip| skip.checked_add(offset))
        .ok_or_else(|| AppError::BadRequest(format!("Page {} is out of range", page)))
}

fn parse_int(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Query parameter '{}' must be an integer", key)))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let params = ListParams::from_pairs(Vec::new()).unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(params.limit, 24);
        assert_eq!(params.skip().unwrap(), 0);
    }

    #[test]
    fn test_reserved_and_filters_split() {
        let params = ListParams::from_pairs(pairs(&[
            ("page", "3"),
            ("limit", "10"),
            ("offset", "2"),
            ("keyword", "rust"),
            ("sortOrder", "desc"),
            ("random", "1"),
            ("published", "true"),
            ("minPrice", "5"),
        ]))
        .unwrap();

        assert_eq!(params.page, 3);
        assert_eq!(params.limit, 10);
        assert_eq!(params.skip().unwrap(), 22);
        assert_eq!(params.keyword.as_deref(), Some("rust"));
        assert_eq!(params.sort_order, "desc");
        assert!(params.random);
        assert_eq!(
            params.filters,
            pairs(&[("published", "true"), ("minPrice", "5")])
        );
    }

    #[test]
    fn test_limit_is_clamped() {
        let params = ListParams::from_pairs(pairs(&[("limit", "5000")])).unwrap();
        assert_eq!(params.limit, MAX_PAGE_SIZE);

        let params = ListParams::from_pairs(pairs(&[("limit", "0"), ("page", "-4")])).unwrap();
        assert_eq!(params.limit, 1);
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_huge_page_or_offset_is_rejected() {
        let max = i64::MAX.to_string();
        for items in [
            vec![("page", max.as_str())],
            vec![("page", "2"), ("offset", max.as_str())],
        ] {
            let params = ListParams::from_pairs(pairs(&items)).unwrap();
            assert!(matches!(params.skip(), Err(AppError::BadRequest(_))));
        }

        let params = ListParams::from_pairs(pairs(&[("offset", max.as_str())])).unwrap();
        assert_eq!(params.skip().unwrap(), i64::MAX);
    }

    #[test]
    fn test_non_numeric_page_is_rejected() {
        let err = ListParams::from_pairs(pairs(&[("page", "two")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
