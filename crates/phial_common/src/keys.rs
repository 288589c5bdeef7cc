//! Namespaced-key manipulation.
//!
//! A namespaced key is `namespace` + [`NAMESPACE_SEPARATOR`] + local key.
//! The empty string is the root namespace; root keys carry no prefix.

use crate::sigil::NAMESPACE_SEPARATOR;

/// Returns `true` if the key's first dot-segment names a known namespace.
///
/// A key with a dot whose prefix is *not* a registered namespace is treated
/// as un-namespaced: dots are legal inside local keys.
pub fn is_key_namespaced(key: &str, namespaces: &[String]) -> bool {
    match key.split_once(NAMESPACE_SEPARATOR) {
        Some((prefix, _)) => namespaces.iter().any(|ns| ns == prefix),
        None => false,
    }
}

/// Prefixes `key` with `namespace`, or returns it unchanged for the root
/// namespace.
pub fn add_namespace_to_key(namespace: &str, key: &str) -> String {
    if namespace.is_empty() {
        key.to_string()
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}{key}")
    }
}

/// Qualifies `key` with `current_namespace` unless it is already qualified
/// with a known namespace.
pub fn qualify_key(key: &str, namespaces: &[String], current_namespace: &str) -> String {
    if is_key_namespaced(key, namespaces) {
        key.to_string()
    } else {
        add_namespace_to_key(current_namespace, key)
    }
}

/// Extracts the namespace a qualified key belongs to.
///
/// Returns `None` for keys with no separator or whose prefix is not a
/// registered namespace; callers treat those as root-namespace keys.
pub fn namespace_of_key<'a>(key: &'a str, namespaces: &[String]) -> Option<&'a str> {
    let (prefix, _) = key.split_once(NAMESPACE_SEPARATOR)?;
    namespaces.iter().any(|ns| ns == prefix).then_some(prefix)
}
