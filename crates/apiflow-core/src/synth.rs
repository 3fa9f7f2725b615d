//! Example synthesis from schema shapes

use rand::Rng;
use serde_json::{Map, Value, json};

use crate::config::Defaults;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::resolve::Resolver;
use crate::schema::{ObjectSchema, ScalarKind, ScalarSchema, SchemaNode, Shape, ref_segment};

/// Builds example instances from schemas.
///
/// Synthesis walks the schema top-down, resolving references on demand and
/// threading an optional override object alongside: wherever the override
/// carries a key matching the property being built, that value is used
/// verbatim in place of the schema's example. `None` means the property is
/// omitted entirely, which is how `readOnly` fields drop out of request
/// bodies.
pub struct Synthesizer<'a> {
    resolver: &'a Resolver<'a>,
    defaults: &'a Defaults,
}

impl<'a> Synthesizer<'a> {
    #[must_use]
    pub fn new(resolver: &'a Resolver<'a>, defaults: &'a Defaults) -> Self {
        Self { resolver, defaults }
    }

    /// Synthesize an instance of `schema`, or `None` for omitted values.
    pub fn synthesize(
        &self,
        schema: &SchemaNode,
        override_value: Option<&Value>,
        rng: &mut impl Rng,
        diags: &mut Diagnostics,
    ) -> Option<Value> {
        match &schema.shape {
            Shape::Reference(_) => {
                let resolved = self.resolver.resolve(schema, diags);
                self.synthesize(&resolved, override_value, rng, diags)
            }
            Shape::AllOf(members) => {
                // Unlike schema merging, instances merge with the later
                // member winning on conflicting keys.
                let mut acc = Value::Object(Map::new());
                for member in members {
                    if let Some(piece) = self.synthesize(member, override_value, rng, diags) {
                        acc = merge_instances(acc, piece);
                    }
                }
                Some(acc)
            }
            Shape::Object(object) => {
                Some(self.synthesize_object(object, override_value, rng, diags))
            }
            Shape::Array(element) => {
                let item = self.synthesize(element, override_value, rng, diags);
                Some(Value::Array(item.into_iter().collect()))
            }
            Shape::Scalar(scalar) => {
                self.synthesize_scalar(schema.read_only, scalar, override_value, rng)
            }
        }
    }

    fn synthesize_object(
        &self,
        object: &ObjectSchema,
        override_value: Option<&Value>,
        rng: &mut impl Rng,
        diags: &mut Diagnostics,
    ) -> Value {
        let mut result = Map::new();
        for (name, prop) in &object.properties {
            let prop_override = override_value.and_then(|o| o.get(name));
            if let Some(value) = self.synthesize(prop, prop_override, rng, diags) {
                result.insert(name.clone(), value);
            }
        }
        if !object.one_of.is_empty() {
            let index = self.pick_branch(object, &result, diags);
            if let Some(branch) = self.synthesize(&object.one_of[index], override_value, rng, diags)
            {
                // The chosen branch wins on conflicting keys
                return merge_instances(Value::Object(result), branch);
            }
        }
        Value::Object(result)
    }

    fn synthesize_scalar(
        &self,
        read_only: bool,
        scalar: &ScalarSchema,
        override_value: Option<&Value>,
        rng: &mut impl Rng,
    ) -> Option<Value> {
        if read_only {
            return None;
        }
        let example = override_value.cloned().or_else(|| scalar.example.clone());
        let value = match scalar.kind {
            ScalarKind::Number => example.unwrap_or_else(|| json!(self.defaults.number)),
            ScalarKind::Boolean => {
                let falsy = matches!(example, Some(Value::Bool(false)))
                    || matches!(example, Some(Value::String(ref s)) if s == "false");
                Value::Bool(!falsy)
            }
            ScalarKind::String => match example {
                Some(value) => value,
                None => match scalar.format.as_deref() {
                    Some("date-time") => Value::String(self.defaults.date_time.clone()),
                    Some("uuid") => Value::String(uuid_v4(rng)),
                    _ => Value::String(self.defaults.string.clone()),
                },
            },
        };
        Some(value)
    }

    /// Pick the `oneOf` branch named by the synthesized discriminator value.
    ///
    /// A value matching a branch reference segment wins outright, then the
    /// discriminator mapping is consulted. Anything else falls back to the
    /// first branch with a diagnostic.
    fn pick_branch(
        &self,
        object: &ObjectSchema,
        synthesized: &Map<String, Value>,
        diags: &mut Diagnostics,
    ) -> usize {
        let Some(discriminator) = &object.discriminator else {
            diags.push(
                DiagnosticKind::AmbiguousDiscriminator,
                "oneOf",
                "no discriminator declared, defaulting to the first branch",
            );
            return 0;
        };
        let value = synthesized
            .get(&discriminator.property_name)
            .and_then(Value::as_str);
        let Some(value) = value else {
            diags.push(
                DiagnosticKind::AmbiguousDiscriminator,
                discriminator.property_name.as_str(),
                "no discriminator value synthesized, defaulting to the first branch",
            );
            return 0;
        };
        if let Some(index) = object
            .one_of
            .iter()
            .position(|branch| branch.reference_segment() == Some(value))
        {
            return index;
        }
        if let Some(target) = discriminator.mapping.get(value) {
            if let Some(index) = object
                .one_of
                .iter()
                .position(|branch| branch.reference_segment() == Some(ref_segment(target)))
            {
                return index;
            }
        }
        diags.push(
            DiagnosticKind::AmbiguousDiscriminator,
            discriminator.property_name.as_str(),
            format!("value {value} matches no branch, defaulting to the first"),
        );
        0
    }
}

/// Merge one synthesized instance into another, later keys winning.
fn merge_instances(acc: Value, piece: Value) -> Value {
    match (acc, piece) {
        (Value::Object(mut base), Value::Object(next)) => {
            for (key, value) in next {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, other) => other,
    }
}

/// Expand a possibly dotted parameter name into a nested override object.
///
/// `"spec.name"` becomes `{"spec": {"name": value}}`; a name without an
/// interior dot maps directly.
#[must_use]
pub fn expand_override(name: &str, value: Value) -> Value {
    let mut map = Map::new();
    match name.find('.') {
        Some(index) if index > 0 => {
            let (head, rest) = name.split_at(index);
            map.insert(head.to_string(), expand_override(&rest[1..], value));
        }
        _ => {
            map.insert(name.to_string(), value);
        }
    }
    Value::Object(map)
}

/// Generate a random UUID v4 string
#[must_use]
pub fn uuid_v4(rng: &mut impl Rng) -> String {
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        rng.r#gen::<u32>(),
        rng.r#gen::<u16>(),
        rng.r#gen::<u16>() & 0x0fff,
        (rng.r#gen::<u16>() & 0x3fff) | 0x8000,
        rng.r#gen::<u64>() & 0xffff_ffff_ffff
    )
}
