use std::cmp::Ordering;

use super::SortOrder;

/// Sort by `field`. Sorting by namespace breaks ties by name, always ascending.
pub fn sort_dynamic<T, F>(data: &mut [T], field: &str, order: SortOrder, get_field_value: F)
where
    F: Fn(&T, &str) -> Option<String>,
{
    let directed = |ord: Ordering| match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    };

    data.sort_by(|a, b| {
        let a_val = get_field_value(a, field).unwrap_or_default();
        let b_val = get_field_value(b, field).unwrap_or_default();
        let primary = directed(a_val.cmp(&b_val));

        if field == "namespace" && primary == Ordering::Equal {
            let a_name = get_field_value(a, "name").unwrap_or_default();
            let b_name = get_field_value(b, "name").unwrap_or_default();
            a_name.cmp(&b_name)
        } else {
            primary
        }
    });
}
