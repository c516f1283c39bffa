use serde::Deserialize;

use crate::utils::AccessorMode;

mod filter;
mod sort;

pub use filter::filter_dynamic;
pub use sort::sort_dynamic;

/// Items that can be sorted and filtered by named field.
pub trait Selectable {
    fn filterable_fields() -> &'static [&'static str];

    fn field(&self, name: &str, mode: AccessorMode) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub items_per_page: usize,
    /// Zero-based.
    #[serde(default)]
    pub page: usize,
}

/// Sort, filter and page a correlated list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataSelectQuery {
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub filter: Option<String>,
    pub pagination: Option<Pagination>,
}

impl DataSelectQuery {
    /// Everything, in source order.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn sorted_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by = Some(field.to_string());
        self.sort_order = order;
        self
    }

    pub fn filtered(mut self, patterns: &str) -> Self {
        self.filter = Some(patterns.to_string());
        self
    }

    pub fn paged(mut self, items_per_page: usize, page: usize) -> Self {
        self.pagination = Some(Pagination {
            items_per_page,
            page,
        });
        self
    }

    /// Returns the selected page and the number of items that passed the filter.
    pub fn apply<T: Selectable>(&self, items: Vec<T>) -> (Vec<T>, usize) {
        let mut items = match self.filter.as_deref() {
            Some(patterns) => filter_dynamic(items, patterns, T::filterable_fields(), |item, f| {
                item.field(f, AccessorMode::Filter)
            }),
            None => items,
        };

        // A blank field falls back to namespace; no field at all keeps source order.
        let sort_by = self.sort_by.as_deref().map(|s| match s.trim() {
            "" => "namespace".to_string(),
            field => field.to_lowercase(),
        });
        if let Some(field) = sort_by {
            sort_dynamic(&mut items, &field, self.sort_order, |item, f| {
                item.field(f, AccessorMode::Sort)
            });
        }

        let total = items.len();
        let items = match self.pagination {
            Some(Pagination {
                items_per_page,
                page,
            }) if items_per_page > 0 => items
                .into_iter()
                .skip(page.saturating_mul(items_per_page))
                .take(items_per_page)
                .collect(),
            _ => items,
        };

        (items, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::pad_key;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        namespace: &'static str,
        name: &'static str,
        failed: usize,
    }

    impl Selectable for Row {
        fn filterable_fields() -> &'static [&'static str] {
            &["namespace", "name"]
        }

        fn field(&self, name: &str, mode: AccessorMode) -> Option<String> {
            match name {
                "namespace" => Some(self.namespace.to_string()),
                "name" => Some(self.name.to_string()),
                "failed" => Some(match mode {
                    AccessorMode::Sort => pad_key(self.failed),
                    AccessorMode::Filter => self.failed.to_string(),
                }),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { namespace: "prod", name: "web", failed: 2 },
            Row { namespace: "dev", name: "web", failed: 11 },
            Row { namespace: "prod", name: "api", failed: 0 },
            Row { namespace: "dev", name: "db", failed: 1 },
        ]
    }

    fn names(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|r| format!("{}/{}", r.namespace, r.name)).collect()
    }

    #[test]
    fn none_keeps_source_order() {
        let (items, total) = DataSelectQuery::none().apply(rows());
        assert_eq!(items, rows());
        assert_eq!(total, 4);
    }

    #[test]
    fn sorts_by_namespace_then_name() {
        let (items, _) = DataSelectQuery::none()
            .sorted_by("namespace", SortOrder::Asc)
            .apply(rows());
        assert_eq!(names(&items), vec!["dev/db", "dev/web", "prod/api", "prod/web"]);
    }

    #[test]
    fn sorts_counts_numerically_descending() {
        let (items, _) = DataSelectQuery::none()
            .sorted_by("failed", SortOrder::Desc)
            .apply(rows());
        assert_eq!(items.iter().map(|r| r.failed).collect::<Vec<_>>(), vec![11, 2, 1, 0]);
    }

    #[test]
    fn total_counts_filtered_items_before_paging() {
        let query = DataSelectQuery::none()
            .filtered("web")
            .sorted_by("namespace", SortOrder::Asc)
            .paged(1, 1);
        let (items, total) = query.apply(rows());
        assert_eq!(total, 2);
        assert_eq!(names(&items), vec!["prod/web"]);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let (items, total) = DataSelectQuery::none().paged(3, 5).apply(rows());
        assert!(items.is_empty());
        assert_eq!(total, 4);
    }

    #[test]
    fn query_deserializes_from_camel_case() {
        let query: DataSelectQuery = k8s_openapi::serde_json::from_value(k8s_openapi::serde_json::json!({
            "sortBy": "name",
            "sortOrder": "desc",
            "filter": "!kube",
            "pagination": { "itemsPerPage": 10, "page": 2 }
        }))
        .unwrap();
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert_eq!(query.pagination, Some(Pagination { items_per_page: 10, page: 2 }));
    }
}
