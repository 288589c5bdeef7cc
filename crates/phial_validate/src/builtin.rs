//! The builtin definition-file schemas.

use indexmap::IndexMap;
use phial_definitions::Value;

/// The name of the schema whole definition files are validated against.
pub const ROOT_SCHEMA: &str = "definitions";

const SCHEMA_DOCUMENT: &str = include_str!("schemas/definitions.yml");

/// Parses the embedded schema document into named schemas.
///
/// The document is a static asset shipped with the crate; failing to parse
/// it is a build defect, not a runtime condition.
pub fn builtin_schemas() -> IndexMap<String, Value> {
    let document: Value =
        serde_yaml::from_str(SCHEMA_DOCUMENT).expect("builtin schema document is valid YAML");
    document
        .as_map()
        .and_then(|map| map.get("schemas"))
        .and_then(Value::as_map)
        .cloned()
        .expect("builtin schema document has a 'schemas' map")
}

/// The raw embedded schema document, as the schema linter expects it.
pub fn builtin_schema_document() -> Value {
    serde_yaml::from_str(SCHEMA_DOCUMENT).expect("builtin schema document is valid YAML")
}
