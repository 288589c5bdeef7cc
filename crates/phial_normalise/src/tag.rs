//! Tag canonicalization.
//!
//! Three shorthand forms are accepted for a tag entry and all collapse to
//! the `{tag, name?, order?}` record shape:
//!
//! - a bare string: `handlers` → `{tag: handlers}`
//! - a map-style `name: value` entry: `{handlers: primary}` →
//!   `{tag: handlers, name: primary}` (a non-string value becomes `order`)
//! - an entry already containing a `tag` key passes through unchanged

use crate::raw::RawTree;
use indexmap::IndexMap;
use phial_definitions::Value;

/// Canonicalizes the `tags` list of every service.
pub fn normalise(mut tree: RawTree) -> RawTree {
    for definition in tree.services.values_mut() {
        let Some(map) = definition.as_map_mut() else {
            continue;
        };
        let tags = map
            .get("tags")
            .map(canonicalise_tags)
            .unwrap_or_default();
        map.insert("tags".to_string(), Value::Sequence(tags));
    }
    tree
}

/// Canonicalizes one `tags` value into a list of record-shaped entries.
pub fn canonicalise_tags(tags: &Value) -> Vec<Value> {
    match tags {
        Value::Map(entries) => entries
            .iter()
            .map(|(name, value)| {
                let mut tag = IndexMap::new();
                tag.insert("tag".to_string(), Value::from(name.as_str()));
                match value {
                    Value::String(member_name) => {
                        tag.insert("name".to_string(), Value::from(member_name.as_str()));
                    }
                    other => {
                        tag.insert("order".to_string(), other.clone());
                    }
                }
                Value::Map(tag)
            })
            .collect(),
        Value::Sequence(entries) => entries
            .iter()
            .map(|entry| match entry {
                Value::String(tag_name) => {
                    let mut tag = IndexMap::new();
                    tag.insert("tag".to_string(), Value::from(tag_name.as_str()));
                    Value::Map(tag)
                }
                already_formatted => already_formatted.clone(),
            })
            .collect(),
        _ => Vec::new(),
    }
}
