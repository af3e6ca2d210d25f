use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

// Pagination fields are inlined rather than flattened: serde's flatten buffers
// query values as strings, which breaks i64 fields under axum's Query
// extractor.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn pagination_normalizes_defaults_and_bounds() {
        let default = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(default.normalize(), (1, 20, 0));

        let clamped = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(clamped.normalize(), (1, 100, 0));
    }

    #[test]
    fn order_list_query_parses_numeric_pagination_from_a_query_string() {
        let uri: Uri = "/api/admin/orders?page=2&per_page=10&status=pending&sort_order=asc"
            .parse()
            .unwrap();
        let Query(query) = Query::<OrderListQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(10));
        assert_eq!(query.status.as_deref(), Some("pending"));
        assert!(matches!(query.sort_order, Some(SortOrder::Asc)));
        assert_eq!(query.pagination().normalize(), (2, 10, 10));
    }

    #[test]
    fn order_list_query_defaults_when_params_are_absent() {
        let uri: Uri = "/api/admin/orders".parse().unwrap();
        let Query(query) = Query::<OrderListQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.page, None);
        assert!(query.status.is_none());
        assert_eq!(query.pagination().normalize(), (1, 20, 0));
    }
}
