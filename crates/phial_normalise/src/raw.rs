//! The intermediate tree the normalization passes hand to each other.

use indexmap::IndexMap;
use phial_definitions::Value;

/// A merged but still raw definition tree.
///
/// Keys are fully qualified after the namespace pass; values keep their
/// dynamic [`Value`] shape until the binding pass lowers them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTree {
    /// Parameter values by fully-qualified key.
    pub parameters: IndexMap<String, Value>,
    /// Raw service definition maps by fully-qualified key.
    pub services: IndexMap<String, Value>,
    /// Raw extension maps (`{calls, tags}`) by target service key.
    pub extensions: IndexMap<String, Value>,
}
