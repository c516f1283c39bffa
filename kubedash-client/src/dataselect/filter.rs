/// Keep the items matching a comma-separated pattern list.
///
/// * Prefix a pattern with `!` for negative filtering
/// * All patterns must hold for an item to be kept
/// * A pattern is found when any of `fields` contains its text
///
/// ```text
/// "prod,!canary"
/// └── keep items that contain "prod" and do not contain "canary"
/// ```
#[tracing::instrument(skip(data, get_field_value))]
pub fn filter_dynamic<T, F>(
    data: Vec<T>,
    patterns: &str,
    fields: &[&str],
    get_field_value: F,
) -> Vec<T>
where
    F: Fn(&T, &str) -> Option<String>,
{
    let compiled: Vec<(bool, &str)> = patterns
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| match raw.strip_prefix('!') {
            Some(text) => (true, text),
            None => (false, raw),
        })
        .collect();

    if compiled.is_empty() {
        return data;
    }

    data.into_iter()
        .filter(|item| {
            compiled.iter().all(|(negative, pat)| {
                let found = fields.iter().any(|field| {
                    get_field_value(item, field)
                        .as_deref()
                        .is_some_and(|val| val.contains(pat))
                });
                found != *negative
            })
        })
        .collect()
}
