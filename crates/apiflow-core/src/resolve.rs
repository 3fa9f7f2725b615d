//! Shallow resolution of references and `allOf` composition

use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::schema::{SchemaNode, Shape, ref_segment};

/// Reference chains longer than this are treated as circular.
const MAX_DEPTH: usize = 20;

/// Resolves references and `allOf` composition against the named schema table.
///
/// Resolution is shallow: the top level of a node is reduced to an object,
/// array or scalar, while nested properties, array elements and `oneOf`
/// branches are left untouched for callers to resolve on demand.
pub struct Resolver<'a> {
    schemas: &'a IndexMap<String, SchemaNode>,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(schemas: &'a IndexMap<String, SchemaNode>) -> Self {
        Self { schemas }
    }

    /// Resolve the top level of `node`.
    ///
    /// Unresolvable references and chains deeper than [`MAX_DEPTH`] degrade
    /// to an empty object schema and record a diagnostic.
    #[must_use]
    pub fn resolve(&self, node: &SchemaNode, diags: &mut Diagnostics) -> SchemaNode {
        self.resolve_depth(node, 0, diags)
    }

    fn resolve_depth(
        &self,
        node: &SchemaNode,
        depth: usize,
        diags: &mut Diagnostics,
    ) -> SchemaNode {
        match &node.shape {
            Shape::Reference(target) => {
                let segment = ref_segment(target);
                if depth >= MAX_DEPTH {
                    diags.push(
                        DiagnosticKind::CircularReference,
                        segment,
                        format!("reference chain exceeds {MAX_DEPTH} levels"),
                    );
                    return SchemaNode::empty();
                }
                match self.schemas.get(segment) {
                    Some(found) => self.resolve_depth(found, depth + 1, diags),
                    None => {
                        diags.push(
                            DiagnosticKind::UnresolvedReference,
                            segment,
                            format!("no schema named {segment}"),
                        );
                        SchemaNode::empty()
                    }
                }
            }
            Shape::AllOf(members) => {
                let mut acc = SchemaNode::empty();
                for member in members {
                    let resolved = self.resolve_depth(member, depth + 1, diags);
                    acc = merge_member(acc, resolved);
                }
                acc
            }
            _ => node.clone(),
        }
    }
}

/// Fold one resolved `allOf` member into the accumulator.
///
/// Two objects merge field-wise: earlier members win on conflicting property
/// values, `required` becomes a first-seen union, and the latest member
/// carrying `oneOf` or a discriminator supplies them. A non-object member
/// replaces the accumulator outright.
fn merge_member(acc: SchemaNode, member: SchemaNode) -> SchemaNode {
    let read_only = acc.read_only || member.read_only;
    let shape = match (acc.shape, member.shape) {
        (Shape::Object(mut base), Shape::Object(next)) => {
            for (name, prop) in next.properties {
                base.properties.entry(name).or_insert(prop);
            }
            for name in next.required {
                if !base.required.contains(&name) {
                    base.required.push(name);
                }
            }
            if !next.one_of.is_empty() {
                base.one_of = next.one_of;
            }
            if next.discriminator.is_some() {
                base.discriminator = next.discriminator;
            }
            Shape::Object(base)
        }
        (_, other) => other,
    };
    SchemaNode { shape, read_only }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ObjectSchema, ScalarKind};
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn node(value: Value) -> SchemaNode {
        SchemaNode::from_value(&value)
    }

    fn named(pairs: &[(&str, Value)]) -> IndexMap<String, SchemaNode> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), SchemaNode::from_value(value)))
            .collect()
    }

    #[test]
    fn concrete_shapes_pass_through() {
        let schemas = named(&[]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let scalar = node(json!({"type": "string", "example": "x"}));
        assert_eq!(resolver.resolve(&scalar, &mut diags), scalar);

        // No descent: the array element stays a reference
        let array = node(json!({"type": "array", "items": {"$ref": "#/definitions/Item"}}));
        assert_eq!(resolver.resolve(&array, &mut diags), array);
        assert!(diags.is_empty());
    }

    #[test]
    fn reference_resolves_to_named_schema() {
        let schemas = named(&[(
            "Pet",
            json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        )]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let resolved = resolver.resolve(&node(json!({"$ref": "#/components/schemas/Pet"})), &mut diags);

        let obj = resolved.as_object().unwrap();
        assert!(obj.properties.contains_key("name"));
        assert!(diags.is_empty());
    }

    #[test]
    fn reference_chain_resolves() {
        let schemas = named(&[
            ("Alias", json!({"$ref": "#/definitions/Concrete"})),
            ("Concrete", json!({"type": "number", "example": 3})),
        ]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let resolved = resolver.resolve(&node(json!({"$ref": "#/definitions/Alias"})), &mut diags);

        match resolved.shape {
            Shape::Scalar(ref scalar) => assert_eq!(scalar.kind, ScalarKind::Number),
            ref other => panic!("expected scalar, got {other:?}"),
        }
        assert!(diags.is_empty());
    }

    #[test]
    fn unresolved_reference_degrades_to_empty_object() {
        let schemas = named(&[]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let resolved = resolver.resolve(&node(json!({"$ref": "#/definitions/Ghost"})), &mut diags);

        assert_eq!(resolved, SchemaNode::empty());
        assert_eq!(diags.count_of(DiagnosticKind::UnresolvedReference), 1);
        assert_eq!(diags.iter().next().unwrap().path, "Ghost");
    }

    #[test]
    fn circular_references_hit_depth_guard() {
        let schemas = named(&[
            ("A", json!({"$ref": "#/definitions/B"})),
            ("B", json!({"$ref": "#/definitions/A"})),
        ]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let resolved = resolver.resolve(&node(json!({"$ref": "#/definitions/A"})), &mut diags);

        assert_eq!(resolved, SchemaNode::empty());
        assert_eq!(diags.count_of(DiagnosticKind::CircularReference), 1);
    }

    #[test]
    fn all_of_merges_properties_earlier_wins() {
        let schemas = named(&[]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let composed = node(json!({
            "allOf": [
                {"type": "object", "properties": {
                    "x": {"type": "string", "example": "first"},
                    "y": {"type": "number"}
                }},
                {"type": "object", "properties": {
                    "x": {"type": "string", "example": "second"},
                    "z": {"type": "boolean"}
                }}
            ]
        }));
        let resolved = resolver.resolve(&composed, &mut diags);

        let obj = resolved.as_object().unwrap();
        let keys: Vec<&str> = obj.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
        match obj.properties["x"].shape {
            Shape::Scalar(ref scalar) => assert_eq!(scalar.example, Some(json!("first"))),
            ref other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn all_of_unions_required_first_seen() {
        let schemas = named(&[]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let composed = node(json!({
            "allOf": [
                {"type": "object", "required": ["a", "b"]},
                {"type": "object", "required": ["b", "c"]}
            ]
        }));
        let resolved = resolver.resolve(&composed, &mut diags);

        assert_eq!(resolved.as_object().unwrap().required, vec!["a", "b", "c"]);
    }

    #[test]
    fn all_of_resolves_referenced_members() {
        let schemas = named(&[(
            "Base",
            json!({"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]}),
        )]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let composed = node(json!({
            "allOf": [
                {"$ref": "#/components/schemas/Base"},
                {"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}
            ]
        }));
        let resolved = resolver.resolve(&composed, &mut diags);

        let obj = resolved.as_object().unwrap();
        let keys: Vec<&str> = obj.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name"]);
        assert_eq!(obj.required, vec!["id", "name"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn all_of_latest_discriminator_wins() {
        let schemas = named(&[]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let composed = node(json!({
            "allOf": [
                {"type": "object", "oneOf": [{"$ref": "#/x/Old"}],
                 "discriminator": {"propertyName": "old"}},
                {"type": "object", "oneOf": [{"$ref": "#/x/New"}],
                 "discriminator": {"propertyName": "new"}}
            ]
        }));
        let resolved = resolver.resolve(&composed, &mut diags);

        let obj = resolved.as_object().unwrap();
        assert_eq!(obj.discriminator.as_ref().unwrap().property_name, "new");
        assert_eq!(obj.one_of.len(), 1);
        assert_eq!(obj.one_of[0].shape, Shape::Reference("#/x/New".to_string()));
    }

    #[test]
    fn all_of_keeps_discriminator_from_earlier_member() {
        let schemas = named(&[]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let composed = node(json!({
            "allOf": [
                {"type": "object", "oneOf": [{"$ref": "#/x/Only"}],
                 "discriminator": {"propertyName": "kind"}},
                {"type": "object", "properties": {"extra": {"type": "string"}}}
            ]
        }));
        let resolved = resolver.resolve(&composed, &mut diags);

        let obj = resolved.as_object().unwrap();
        assert_eq!(obj.discriminator.as_ref().unwrap().property_name, "kind");
        assert_eq!(obj.one_of.len(), 1);
    }

    #[test]
    fn all_of_non_object_member_replaces() {
        let schemas = named(&[]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let composed = node(json!({
            "allOf": [
                {"type": "object", "properties": {"x": {"type": "string"}}},
                {"type": "string", "example": "flat"}
            ]
        }));
        let resolved = resolver.resolve(&composed, &mut diags);

        assert!(matches!(resolved.shape, Shape::Scalar(_)));
    }

    #[test]
    fn resolve_is_idempotent_on_merged_composition() {
        let schemas = named(&[(
            "Base",
            json!({"type": "object", "properties": {"id": {"type": "string"}}}),
        )]);
        let resolver = Resolver::new(&schemas);
        let mut diags = Diagnostics::new();

        let composed = node(json!({
            "allOf": [
                {"$ref": "#/definitions/Base"},
                {"type": "object", "required": ["id"]}
            ]
        }));
        let once = resolver.resolve(&composed, &mut diags);
        let twice = resolver.resolve(&once, &mut diags);

        assert_eq!(once, twice);
    }

    fn arb_schema() -> impl Strategy<Value = SchemaNode> {
        let leaf = prop_oneof![
            Just(SchemaNode::empty()),
            Just(node(json!({"type": "string"}))),
            Just(node(json!({"type": "number", "example": 7}))),
            Just(node(json!({"type": "boolean", "readOnly": true}))),
            Just(node(json!({"$ref": "#/components/schemas/Base"}))),
            Just(node(json!({"$ref": "#/components/schemas/Missing"}))),
        ];
        leaf.prop_recursive(3, 12, 3, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 1..3).prop_map(|members| SchemaNode {
                    shape: Shape::AllOf(members),
                    read_only: false,
                }),
                inner.clone().prop_map(|element| SchemaNode {
                    shape: Shape::Array(Box::new(element)),
                    read_only: false,
                }),
                prop::collection::vec(inner, 1..3).prop_map(|props| {
                    let mut properties = IndexMap::new();
                    for (i, prop) in props.into_iter().enumerate() {
                        properties.insert(format!("p{i}"), prop);
                    }
                    SchemaNode {
                        shape: Shape::Object(ObjectSchema {
                            properties,
                            ..ObjectSchema::default()
                        }),
                        read_only: false,
                    }
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn resolving_twice_matches_resolving_once(schema in arb_schema()) {
            let schemas = named(&[(
                "Base",
                json!({"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]}),
            )]);
            let resolver = Resolver::new(&schemas);

            let once = resolver.resolve(&schema, &mut Diagnostics::new());
            let twice = resolver.resolve(&once, &mut Diagnostics::new());

            prop_assert_eq!(once, twice);
        }
    }
}
