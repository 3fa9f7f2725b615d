//! Pruning synthesized instances down to required fields

use serde_json::{Map, Value};

use crate::diagnostics::Diagnostics;
use crate::resolve::Resolver;
use crate::schema::{ObjectSchema, SchemaNode, Shape};

/// Strip every optional field from a synthesized instance.
///
/// The schema is resolved before any key decision, so references and `allOf`
/// composition contribute their `required` lists. A field survives when it is
/// required here or declared by any `oneOf` branch, and is dropped regardless
/// when its raw property node is `readOnly`. Pruning descends into declared
/// object properties and keeps a single pruned element of array values.
#[must_use]
pub fn prune(
    instance: &Value,
    schema: &SchemaNode,
    resolver: &Resolver,
    diags: &mut Diagnostics,
) -> Value {
    let resolved = resolver.resolve(schema, diags);
    match (&resolved.shape, instance) {
        (Shape::Object(object), Value::Object(fields)) => {
            let required = effective_required(object, resolver, diags);
            let mut kept = Map::new();
            for (key, value) in fields {
                if !required.iter().any(|name| name == key) {
                    continue;
                }
                if object.properties.get(key).is_some_and(|prop| prop.read_only) {
                    continue;
                }
                let child = match object.properties.get(key) {
                    Some(prop) => prune(value, prop, resolver, diags),
                    // Contributed by a oneOf branch, kept as synthesized
                    None => value.clone(),
                };
                kept.insert(key.clone(), child);
            }
            Value::Object(kept)
        }
        (Shape::Array(element), Value::Array(items)) if !items.is_empty() => {
            Value::Array(vec![prune(&items[0], element, resolver, diags)])
        }
        _ => instance.clone(),
    }
}

/// The object's own `required` list extended with every property name
/// declared by a resolved `oneOf` branch, first seen first.
fn effective_required(
    object: &ObjectSchema,
    resolver: &Resolver,
    diags: &mut Diagnostics,
) -> Vec<String> {
    let mut required = object.required.clone();
    for branch in &object.one_of {
        let resolved = resolver.resolve(branch, diags);
        if let Some(branch_object) = resolved.as_object() {
            for name in branch_object.properties.keys() {
                if !required.contains(name) {
                    required.push(name.clone());
                }
            }
        }
    }
    required
}
