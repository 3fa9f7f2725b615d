//! Schema tree model — one-pass classification of raw OpenAPI schemas
//!
//! Raw `serde_json::Value` schemas are parsed once into a closed `Shape`
//! union; every downstream stage dispatches on it exhaustively instead of
//! probing for `$ref`/`allOf`/`type` fields.

use indexmap::IndexMap;
use serde_json::Value;

/// One node of a schema tree.
///
/// `read_only` applies to any shape; the original documents mark
/// server-assigned fields (`id`, `href`) this way.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub shape: Shape,
    pub read_only: bool,
}

/// The classified shape of a schema node — exactly one per node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// `$ref` indirection; the raw reference string.
    Reference(String),
    /// `allOf` composite awaiting merge.
    AllOf(Vec<SchemaNode>),
    /// `type: object`, or no type at all.
    Object(ObjectSchema),
    /// `type: array`; the single item schema.
    Array(Box<SchemaNode>),
    /// `type: string | number | integer | boolean`.
    Scalar(ScalarSchema),
}

/// Object shape: ordered properties plus optional `oneOf` alternatives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaNode>,
    pub required: Vec<String>,
    pub one_of: Vec<SchemaNode>,
    pub discriminator: Option<Discriminator>,
}

/// Scalar leaf: kind plus the attributes synthesis cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSchema {
    pub kind: ScalarKind,
    pub format: Option<String>,
    pub example: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
}

/// `oneOf` branch selector: property name plus value → target mapping.
///
/// Mapping targets may be bare schema names or full `#/…/Name` refs;
/// comparisons always go through [`ref_segment`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Discriminator {
    pub property_name: String,
    pub mapping: IndexMap<String, String>,
}

impl Default for SchemaNode {
    /// The empty object schema — the recovery value for unresolvable refs.
    fn default() -> Self {
        Self {
            shape: Shape::Object(ObjectSchema::default()),
            read_only: false,
        }
    }
}

impl SchemaNode {
    /// Classify a raw schema value. Total: malformed input degrades to the
    /// empty object schema rather than failing.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let read_only = value
            .get("readOnly")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self {
            shape: classify(value),
            read_only,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.shape {
            Shape::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The trailing segment of the reference target, for reference nodes.
    #[must_use]
    pub fn reference_segment(&self) -> Option<&str> {
        match &self.shape {
            Shape::Reference(target) => Some(ref_segment(target)),
            _ => None,
        }
    }

    /// True for `type: string` leaves — the update step picks its target
    /// property with this.
    #[must_use]
    pub fn is_string_scalar(&self) -> bool {
        matches!(
            &self.shape,
            Shape::Scalar(ScalarSchema {
                kind: ScalarKind::String,
                ..
            })
        )
    }
}

fn classify(value: &Value) -> Shape {
    let Some(obj) = value.as_object() else {
        return Shape::Object(ObjectSchema::default());
    };

    if let Some(target) = obj.get("$ref").and_then(Value::as_str) {
        return Shape::Reference(target.to_string());
    }

    if let Some(branches) = obj.get("allOf").and_then(Value::as_array) {
        return Shape::AllOf(branches.iter().map(SchemaNode::from_value).collect());
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("array") => {
            let items = obj
                .get("items")
                .map(SchemaNode::from_value)
                .unwrap_or_default();
            Shape::Array(Box::new(items))
        }
        Some("string") => Shape::Scalar(scalar(obj, ScalarKind::String)),
        // OpenAPI distinguishes integer from number; synthesis does not.
        Some("number" | "integer") => Shape::Scalar(scalar(obj, ScalarKind::Number)),
        Some("boolean") => Shape::Scalar(scalar(obj, ScalarKind::Boolean)),
        _ => Shape::Object(parse_object(obj)),
    }
}

fn scalar(obj: &serde_json::Map<String, Value>, kind: ScalarKind) -> ScalarSchema {
    ScalarSchema {
        kind,
        format: obj
            .get("format")
            .and_then(Value::as_str)
            .map(String::from),
        example: obj.get("example").cloned(),
    }
}

fn parse_object(obj: &serde_json::Map<String, Value>) -> ObjectSchema {
    let mut properties = IndexMap::new();
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (name, sub) in props {
            properties.insert(name.clone(), SchemaNode::from_value(sub));
        }
    }

    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let one_of = obj
        .get("oneOf")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(SchemaNode::from_value).collect())
        .unwrap_or_default();

    let discriminator = obj.get("discriminator").and_then(Discriminator::from_value);

    ObjectSchema {
        properties,
        required,
        one_of,
        discriminator,
    }
}

impl Discriminator {
    /// Parse the OpenAPI v3 object form. The v2 string form carries no
    /// mapping and no `oneOf` to select from, so it is ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let property_name = value.get("propertyName")?.as_str()?.to_string();
        let mut mapping = IndexMap::new();
        if let Some(map) = value.get("mapping").and_then(Value::as_object) {
            for (key, target) in map {
                if let Some(target) = target.as_str() {
                    mapping.insert(key.clone(), target.to_string());
                }
            }
        }
        Some(Self {
            property_name,
            mapping,
        })
    }
}

/// Trailing path segment of a `$ref` target or mapping value:
/// `#/components/schemas/Pet` → `Pet`, `Pet` → `Pet`.
#[must_use]
pub fn ref_segment(target: &str) -> &str {
    target.rsplit('/').next().unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_reference() {
        let node = SchemaNode::from_value(&json!({"$ref": "#/components/schemas/Pet"}));
        assert_eq!(
            node.shape,
            Shape::Reference("#/components/schemas/Pet".into())
        );
    }

    #[test]
    fn reference_wins_over_type() {
        let node =
            SchemaNode::from_value(&json!({"$ref": "#/definitions/Pet", "type": "string"}));
        assert!(matches!(node.shape, Shape::Reference(_)));
    }

    #[test]
    fn classifies_all_of_with_members() {
        let node = SchemaNode::from_value(&json!({
            "allOf": [
                {"$ref": "#/definitions/Base"},
                {"type": "object", "properties": {"x": {"type": "string"}}}
            ]
        }));
        let Shape::AllOf(branches) = node.shape else {
            panic!("expected allOf");
        };
        assert_eq!(branches.len(), 2);
        assert!(matches!(branches[0].shape, Shape::Reference(_)));
        assert!(matches!(branches[1].shape, Shape::Object(_)));
    }

    #[test]
    fn object_preserves_property_order() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "properties": {
                "zebra": {"type": "string"},
                "apple": {"type": "number"},
                "mango": {"type": "boolean"}
            }
        }));
        let obj = node.as_object().unwrap();
        let names: Vec<_> = obj.properties.keys().cloned().collect();
        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn missing_type_parses_as_object() {
        let node = SchemaNode::from_value(&json!({
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        }));
        let obj = node.as_object().unwrap();
        assert_eq!(obj.required, vec!["name"]);
        assert!(obj.properties.contains_key("name"));
    }

    #[test]
    fn integer_normalizes_to_number() {
        let node = SchemaNode::from_value(&json!({"type": "integer", "example": 7}));
        let Shape::Scalar(scalar) = node.shape else {
            panic!("expected scalar");
        };
        assert_eq!(scalar.kind, ScalarKind::Number);
        assert_eq!(scalar.example, Some(json!(7)));
    }

    #[test]
    fn read_only_flag_is_parsed() {
        let node = SchemaNode::from_value(&json!({"type": "string", "readOnly": true}));
        assert!(node.read_only);
        let node = SchemaNode::from_value(&json!({"type": "string"}));
        assert!(!node.read_only);
    }

    #[test]
    fn array_without_items_gets_empty_item_schema() {
        let node = SchemaNode::from_value(&json!({"type": "array"}));
        let Shape::Array(items) = node.shape else {
            panic!("expected array");
        };
        assert_eq!(*items, SchemaNode::empty());
    }

    #[test]
    fn unknown_type_degrades_to_empty_object() {
        let node = SchemaNode::from_value(&json!({"type": "file"}));
        assert_eq!(node, SchemaNode::empty());
    }

    #[test]
    fn non_object_value_degrades_to_empty_object() {
        assert_eq!(SchemaNode::from_value(&json!(true)), SchemaNode::empty());
        assert_eq!(SchemaNode::from_value(&json!(null)), SchemaNode::empty());
    }

    #[test]
    fn discriminator_with_mapping() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "properties": {"kind": {"type": "string", "example": "cat"}},
            "oneOf": [
                {"$ref": "#/components/schemas/Cat"},
                {"$ref": "#/components/schemas/Dog"}
            ],
            "discriminator": {
                "propertyName": "kind",
                "mapping": {"cat": "Cat", "dog": "#/components/schemas/Dog"}
            }
        }));
        let obj = node.as_object().unwrap();
        assert_eq!(obj.one_of.len(), 2);
        let dis = obj.discriminator.as_ref().unwrap();
        assert_eq!(dis.property_name, "kind");
        let keys: Vec<_> = dis.mapping.keys().cloned().collect();
        assert_eq!(keys, vec!["cat", "dog"]);
        assert_eq!(dis.mapping["dog"], "#/components/schemas/Dog");
    }

    #[test]
    fn swagger_v2_string_discriminator_is_ignored() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "discriminator": "petType"
        }));
        assert!(node.as_object().unwrap().discriminator.is_none());
    }

    #[test]
    fn ref_segment_strips_path() {
        assert_eq!(ref_segment("#/components/schemas/Pet"), "Pet");
        assert_eq!(ref_segment("#/definitions/Order"), "Order");
        assert_eq!(ref_segment("Pet"), "Pet");
    }

    #[test]
    fn string_scalar_probe() {
        let s = SchemaNode::from_value(&json!({"type": "string"}));
        let n = SchemaNode::from_value(&json!({"type": "number"}));
        assert!(s.is_string_scalar());
        assert!(!n.is_string_scalar());
    }
}
