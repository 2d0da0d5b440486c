//! Query page request and response shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of one paginated query.
#[derive(Debug, Serialize)]
pub struct PageRequest<'a> {
    pub page: PageWindow<'a>,
}

#[derive(Debug, Serialize)]
pub struct PageWindow<'a> {
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<&'a str>,
}

impl<'a> PageRequest<'a> {
    pub fn new(size: usize, after: Option<&'a str>) -> Self {
        PageRequest {
            page: PageWindow { size, after },
        }
    }
}

/// One page of query results.
#[derive(Debug, Default, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub records: Vec<Map<String, Value>>,
    #[serde(default)]
    pub meta: QueryMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryMeta {
    #[serde(default)]
    pub page: PageCursor,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageCursor {
    pub cursor: Option<String>,
    #[serde(default)]
    pub more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_page_request_has_no_cursor() {
        assert_eq!(
            serde_json::to_value(PageRequest::new(200, None)).unwrap(),
            json!({"page": {"size": 200}})
        );
    }

    #[test]
    fn test_next_page_request_carries_cursor() {
        assert_eq!(
            serde_json::to_value(PageRequest::new(50, Some("c2"))).unwrap(),
            json!({"page": {"size": 50, "after": "c2"}})
        );
    }

    #[test]
    fn test_query_page_tolerates_missing_meta() {
        let page: QueryPage = serde_json::from_value(json!({"records": [{"id": "a"}]})).unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(!page.meta.page.more);
        assert!(page.meta.page.cursor.is_none());
    }
}
