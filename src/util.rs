//! Shared naming and path helpers.

/// Lower-case `name` and prefix it with `{flow}_` unless it already carries the prefix.
pub fn with_flow_prefix(name: &str, flow: &str) -> String {
    let name = name.to_lowercase();
    let prefix = format!("{}_", flow);
    if name.starts_with(&prefix) {
        name
    } else {
        format!("{}{}", prefix, name)
    }
}

/// The part of a namespaced table name after `{flow}_`.
#[inline]
pub fn strip_flow_prefix<'a>(name: &'a str, flow: &str) -> &'a str {
    name.strip_prefix(flow)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(name)
}

/// Append a trailing `/` if the location lacks one.
pub fn ensure_trailing_slash(location: &str) -> String {
    if location.ends_with('/') {
        location.to_string()
    } else {
        format!("{}/", location)
    }
}

/// `{base}/{flow}/{table without flow prefix}/`
pub fn table_location(base: &str, flow: &str, table: &str) -> String {
    format!(
        "{}/{}/{}/",
        base.trim_end_matches('/'),
        flow,
        strip_flow_prefix(table, flow)
    )
}

/// Split a comma-separated partition list; a blank string means no partitions.
pub fn split_partitions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
