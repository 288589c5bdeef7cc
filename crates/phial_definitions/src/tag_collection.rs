//! Ordered collections of tagged services.

use crate::tree::DefinitionTree;
use indexmap::IndexMap;
use phial_common::TAG_SIGIL;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A key within a [`TagCollection`]: an explicit member name, or an
/// auto-assigned integer index.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TagKey {
    /// An auto-assigned (or explicitly chosen) integer index.
    Index(i64),
    /// An explicit member name.
    Name(String),
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKey::Index(i) => write!(f, "{i}"),
            TagKey::Name(n) => f.write_str(n),
        }
    }
}

/// An ordered map from member key to service key, built once per tag during
/// normalization and resolved as a group at use time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TagCollection {
    services: IndexMap<TagKey, String>,
}

impl TagCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service under the given key.
    ///
    /// Without a key — or when an integer key is already occupied, or a name
    /// key is empty — the member is stored under one more than the highest
    /// existing integer index (`0` for a collection with no integer keys).
    pub fn add_service(&mut self, service: impl Into<String>, key: Option<TagKey>) {
        let key = match key {
            Some(TagKey::Index(i)) if !self.services.contains_key(&TagKey::Index(i)) => {
                TagKey::Index(i)
            }
            Some(TagKey::Name(name)) if !name.is_empty() => TagKey::Name(name),
            _ => TagKey::Index(self.next_index()),
        };
        self.services.insert(key, service.into());
    }

    fn next_index(&self) -> i64 {
        self.services
            .keys()
            .filter_map(|key| match key {
                TagKey::Index(i) => Some(*i),
                TagKey::Name(_) => None,
            })
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Looks up the service registered under `key`.
    pub fn service(&self, key: &TagKey) -> Option<&str> {
        self.services.get(key).map(String::as_str)
    }

    /// Iterates over the members in insertion order.
    pub fn services(&self) -> impl Iterator<Item = (&TagKey, &str)> {
        self.services.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// The number of members.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the collection has no members.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Builds every tag collection declared in a compiled tree.
///
/// Collections are keyed by the tag-collection token (`#name`). Members are
/// gathered in service declaration order, then stably sorted by each tag's
/// `order` value (a missing order sorts as `0`).
pub fn build_tag_collections(tree: &DefinitionTree) -> IndexMap<String, TagCollection> {
    let mut members: IndexMap<String, Vec<(i64, &str, Option<&str>)>> = IndexMap::new();
    for (service_key, service) in &tree.services {
        for tag in &service.tags {
            members.entry(tag.tag.clone()).or_default().push((
                tag.order.unwrap_or(0),
                service_key,
                tag.name.as_deref(),
            ));
        }
    }

    let mut collections = IndexMap::new();
    for (tag, mut entries) in members {
        entries.sort_by_key(|(order, _, _)| *order);
        let mut collection = TagCollection::new();
        for (_, service_key, name) in entries {
            collection.add_service(service_key, name.map(|n| TagKey::Name(n.to_string())));
        }
        collections.insert(format!("{TAG_SIGIL}{tag}"), collection);
    }
    collections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ServiceDef, TagDef};

    #[test]
    fn auto_increment_from_empty() {
        let mut c = TagCollection::new();
        c.add_service("a", None);
        c.add_service("b", None);
        assert_eq!(c.service(&TagKey::Index(0)), Some("a"));
        assert_eq!(c.service(&TagKey::Index(1)), Some("b"));
    }

    #[test]
    fn auto_increment_skips_past_highest_index() {
        let mut c = TagCollection::new();
        c.add_service("a", Some(TagKey::Index(5)));
        c.add_service("b", None);
        assert_eq!(c.service(&TagKey::Index(6)), Some("b"));
    }

    #[test]
    fn occupied_index_falls_back_to_auto() {
        let mut c = TagCollection::new();
        c.add_service("a", Some(TagKey::Index(0)));
        c.add_service("b", Some(TagKey::Index(0)));
        assert_eq!(c.service(&TagKey::Index(0)), Some("a"));
        assert_eq!(c.service(&TagKey::Index(1)), Some("b"));
    }

    #[test]
    fn named_keys_do_not_affect_auto_index() {
        let mut c = TagCollection::new();
        c.add_service("a", Some(TagKey::Name("first".to_string())));
        c.add_service("b", None);
        assert_eq!(c.service(&TagKey::Name("first".to_string())), Some("a"));
        assert_eq!(c.service(&TagKey::Index(0)), Some("b"));
    }

    #[test]
    fn explicit_zero_index_is_respected() {
        let mut c = TagCollection::new();
        c.add_service("a", Some(TagKey::Index(0)));
        assert_eq!(c.service(&TagKey::Index(0)), Some("a"));
        assert_eq!(c.len(), 1);
    }

    fn tagged(tags: Vec<TagDef>) -> ServiceDef {
        ServiceDef {
            class: Some("C".to_string()),
            tags,
            ..ServiceDef::default()
        }
    }

    #[test]
    fn builds_collections_from_tree() {
        let mut tree = DefinitionTree::default();
        tree.services
            .insert("a".to_string(), tagged(vec![TagDef::bare("t")]));
        tree.services.insert(
            "b".to_string(),
            tagged(vec![TagDef {
                tag: "t".to_string(),
                name: Some("named".to_string()),
                order: None,
            }]),
        );

        let collections = build_tag_collections(&tree);
        let t = &collections["#t"];
        assert_eq!(t.len(), 2);
        assert_eq!(t.service(&TagKey::Index(0)), Some("a"));
        assert_eq!(t.service(&TagKey::Name("named".to_string())), Some("b"));
    }

    #[test]
    fn order_sorts_members() {
        let mut tree = DefinitionTree::default();
        tree.services.insert(
            "late".to_string(),
            tagged(vec![TagDef {
                tag: "t".to_string(),
                name: None,
                order: Some(10),
            }]),
        );
        tree.services.insert(
            "early".to_string(),
            tagged(vec![TagDef {
                tag: "t".to_string(),
                name: None,
                order: Some(-1),
            }]),
        );

        let collections = build_tag_collections(&tree);
        let services: Vec<_> = collections["#t"].services().map(|(_, s)| s).collect();
        assert_eq!(services, ["early", "late"]);
    }
}
