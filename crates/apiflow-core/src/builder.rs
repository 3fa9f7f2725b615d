//! Scenario construction across an API document
//!
//! The builder walks the document's paths in five passes, in a fixed order:
//! minimal creation, missing-mandatory negatives, discriminator variants,
//! maximal creation and filter queries. Each pass emits named scenarios whose
//! step chains share captured environment state (`lastId`, `lastRequest`,
//! `putBody`).

use rand::Rng;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::document::{ApiDocument, Operation, PathItem};
use crate::prune::prune;
use crate::resolve::Resolver;
use crate::scenario::{
    Assertion, Capture, Method, QueryParam, Scenario, Step, StepBody, UpdateBody,
};
use crate::schema::{ObjectSchema, SchemaNode, Shape, ref_segment};
use crate::synth::{Synthesizer, expand_override};

pub struct ScenarioBuilder<'a> {
    document: &'a ApiDocument,
    config: &'a Config,
    resolver: Resolver<'a>,
}

impl<'a> ScenarioBuilder<'a> {
    #[must_use]
    pub fn new(document: &'a ApiDocument, config: &'a Config) -> Self {
        Self {
            document,
            config,
            resolver: Resolver::new(&document.schemas),
        }
    }

    /// Run all five passes over the document.
    pub fn build_all(&self, rng: &mut impl Rng, diags: &mut Diagnostics) -> Vec<Scenario> {
        let mut scenarios = Vec::new();
        let mut seen_body_gaps = Vec::new();

        self.creation_pass(true, &mut scenarios, rng, diags, &mut seen_body_gaps);
        self.missing_mandatory_pass(&mut scenarios, rng, diags, &mut seen_body_gaps);
        self.discriminator_pass(&mut scenarios, rng, diags, &mut seen_body_gaps);
        self.creation_pass(false, &mut scenarios, rng, diags, &mut seen_body_gaps);
        self.filter_pass(&mut scenarios, rng, diags, &mut seen_body_gaps);

        scenarios
    }

    fn creation_pass(
        &self,
        minimal: bool,
        scenarios: &mut Vec<Scenario>,
        rng: &mut impl Rng,
        diags: &mut Diagnostics,
        seen_body_gaps: &mut Vec<String>,
    ) {
        for (path, item) in &self.document.paths {
            let Some((post, body_schema)) = self.post_with_body(path, item, diags, seen_body_gaps)
            else {
                continue;
            };
            scenarios.push(
                self.create_scenario(path, item, post, body_schema, minimal, None, rng, diags),
            );
        }
    }

    fn missing_mandatory_pass(
        &self,
        scenarios: &mut Vec<Scenario>,
        rng: &mut impl Rng,
        diags: &mut Diagnostics,
        seen_body_gaps: &mut Vec<String>,
    ) {
        for (path, item) in &self.document.paths {
            let Some((post, body_schema)) = self.post_with_body(path, item, diags, seen_body_gaps)
            else {
                continue;
            };
            let synth = Synthesizer::new(&self.resolver, &self.config.defaults);
            let full = synth
                .synthesize(body_schema, None, rng, diags)
                .unwrap_or_else(|| Value::Object(Map::new()));
            let minimal = prune(&full, body_schema, &self.resolver, diags);
            let Value::Object(fields) = minimal else {
                continue;
            };

            for key in fields.keys() {
                let body: Map<String, Value> = fields
                    .iter()
                    .filter(|(name, _)| *name != key)
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();

                let mut step = Step::new(
                    step_name(post, Some(&format!("missing {key}"))),
                    Method::Post,
                    self.resource_url(path),
                );
                step.description = post.description.clone();
                step.body = StepBody::Json(Value::Object(body));
                step.assertions = vec![Assertion::ContentTypePresent, Assertion::StatusIsError];

                scenarios.push(Scenario {
                    name: format!(
                        "TC_{}_POST_E1_{} - Create Resource with missing mandatory parameter",
                        trimmed(path),
                        key
                    ),
                    steps: vec![step],
                });
            }
        }
    }

    fn discriminator_pass(
        &self,
        scenarios: &mut Vec<Scenario>,
        rng: &mut impl Rng,
        diags: &mut Diagnostics,
        seen_body_gaps: &mut Vec<String>,
    ) {
        for (path, item) in &self.document.paths {
            let Some((post, body_schema)) = self.post_with_body(path, item, diags, seen_body_gaps)
            else {
                continue;
            };
            let resolved = self.resolver.resolve(body_schema, diags);
            let Some(object) = resolved.as_object() else {
                continue;
            };
            if object.one_of.is_empty() {
                continue;
            }
            let Some(discriminator) = &object.discriminator else {
                continue;
            };
            // Which branch does the plain example already cover?
            let Some(example) = object
                .properties
                .get(&discriminator.property_name)
                .and_then(|prop| match &prop.shape {
                    Shape::Scalar(scalar) => scalar.example.as_ref(),
                    _ => None,
                })
            else {
                continue;
            };
            let current = plain_string(example);

            let values: Vec<String> = if discriminator.mapping.is_empty() {
                object
                    .one_of
                    .iter()
                    .filter_map(|branch| branch.reference_segment().map(str::to_string))
                    .collect()
            } else {
                discriminator.mapping.keys().cloned().collect()
            };

            for value in values.into_iter().filter(|value| *value != current) {
                let mut override_map = Map::new();
                override_map.insert(discriminator.property_name.clone(), Value::String(value));
                let override_value = Value::Object(override_map);
                scenarios.push(self.create_scenario(
                    path,
                    item,
                    post,
                    body_schema,
                    false,
                    Some(&override_value),
                    rng,
                    diags,
                ));
            }
        }
    }

    fn filter_pass(
        &self,
        scenarios: &mut Vec<Scenario>,
        rng: &mut impl Rng,
        diags: &mut Diagnostics,
        seen_body_gaps: &mut Vec<String>,
    ) {
        for (path, item) in &self.document.paths {
            let Some(get) = &item.get else {
                continue;
            };
            if get.parameters.is_empty() {
                continue;
            }
            let Some((post, body_schema)) = self.post_with_body(path, item, diags, seen_body_gaps)
            else {
                continue;
            };
            let synth = Synthesizer::new(&self.resolver, &self.config.defaults);

            for param in get
                .parameters
                .iter()
                .filter(|p| p.is_query() && !self.config.is_reserved_parameter(&p.name))
            {
                // One synthesized value seeds both the body override and
                // the query assertion
                let Some(value) = synth.synthesize(&param.schema, None, rng, diags) else {
                    continue;
                };
                let mut override_value = expand_override(&param.name, value.clone());
                self.add_one_of_attributes(body_schema, &mut override_value, diags);
                let example = synth
                    .synthesize(body_schema, Some(&override_value), rng, diags)
                    .unwrap_or_else(|| Value::Object(Map::new()));
                let filter_value = plain_string(&value);

                let mut steps = vec![self.create_step(path, post, &example, diags)];
                steps.push(self.get_all_step(path, get, Some((&param.name, &filter_value))));

                let id_path = format!("{path}/{{id}}");
                if let Some(delete) = self
                    .document
                    .paths
                    .get(&id_path)
                    .and_then(|sibling| sibling.delete.as_ref())
                {
                    steps.push(self.delete_step(&id_path, delete));
                }

                scenarios.push(Scenario {
                    name: format!(
                        "TC_{}_FILTER_N1_{} - Create Resource with filter parameters",
                        trimmed(path),
                        param.name
                    ),
                    steps,
                });
            }
        }
    }

    /// The full create chain: POST, then GET, PUT and GET again on the
    /// created resource, a collection GET, the fields projection for maximal
    /// runs, and a DELETE to clean up. Absent operations are skipped with a
    /// diagnostic.
    #[allow(clippy::too_many_arguments)]
    fn create_scenario(
        &self,
        path: &str,
        item: &PathItem,
        post: &Operation,
        body_schema: &SchemaNode,
        minimal: bool,
        override_value: Option<&Value>,
        rng: &mut impl Rng,
        diags: &mut Diagnostics,
    ) -> Scenario {
        let synth = Synthesizer::new(&self.resolver, &self.config.defaults);
        let full = synth
            .synthesize(body_schema, override_value, rng, diags)
            .unwrap_or_else(|| Value::Object(Map::new()));
        let example = if minimal {
            prune(&full, body_schema, &self.resolver, diags)
        } else {
            full
        };

        let id_path = format!("{path}/{{id}}");
        let id_item = self.document.paths.get(&id_path);

        let mut steps = vec![self.create_step(path, post, &example, diags)];

        match id_item {
            Some(sibling) => {
                match &sibling.get {
                    Some(get) => steps.push(self.get_step(&id_path, get, "lastRequest", diags)),
                    None => diags.push(
                        DiagnosticKind::MissingOperation,
                        id_path.as_str(),
                        "no getter for a concrete element",
                    ),
                }
                match &sibling.put {
                    Some(put) => {
                        if let Some(step) = self.update_step(&id_path, put, diags) {
                            steps.push(step);
                            if let Some(get) = &sibling.get {
                                steps.push(self.get_step(&id_path, get, "putBody", diags));
                            }
                        }
                    }
                    None => diags.push(
                        DiagnosticKind::MissingOperation,
                        id_path.as_str(),
                        "no PUT request to update the resource",
                    ),
                }
            }
            None => {
                diags.push(
                    DiagnosticKind::MissingOperation,
                    id_path.as_str(),
                    "no getter for a concrete element",
                );
                diags.push(
                    DiagnosticKind::MissingOperation,
                    id_path.as_str(),
                    "no PUT request to update the resource",
                );
            }
        }

        match &item.get {
            Some(get) => {
                steps.push(self.get_all_step(path, get, None));
                if !minimal && get.parameters.iter().any(|p| p.name == "fields") {
                    if let Some(step) = self.fields_step(path, get, diags) {
                        steps.push(step);
                    }
                }
            }
            None => diags.push(
                DiagnosticKind::MissingOperation,
                path,
                "no getter for a full search",
            ),
        }

        match id_item.and_then(|sibling| sibling.delete.as_ref()) {
            Some(delete) => steps.push(self.delete_step(&id_path, delete)),
            None => diags.push(
                DiagnosticKind::MissingOperation,
                id_path.as_str(),
                "no DELETE request to clean up",
            ),
        }

        let suffix = override_value
            .map(|o| format!("_{}", serde_json::to_string(o).unwrap_or_default()))
            .unwrap_or_default();
        Scenario {
            name: format!(
                "TC_{}_POST_N1{} - Create Resource with {} parameters",
                trimmed(path),
                suffix,
                if minimal { "minimal" } else { "maximal" }
            ),
            steps,
        }
    }

    fn create_step(
        &self,
        path: &str,
        post: &Operation,
        example: &Value,
        diags: &mut Diagnostics,
    ) -> Step {
        let mut step = Step::new(step_name(post, None), Method::Post, self.resource_url(path));
        step.description = post.description.clone();
        step.body = StepBody::Json(example.clone());
        step.assertions = vec![
            Assertion::ContentTypePresent,
            Assertion::StatusCode(201),
            Assertion::LocationHeaderPresent,
            Assertion::LocationHeaderCorrect {
                path: path.to_string(),
            },
        ];
        if let Some(schema) = post.response_schema("201") {
            let resolved = self.resolver.resolve(schema, diags);
            if let Some(object) = resolved.as_object() {
                if !object.required.is_empty() {
                    step.assertions.push(Assertion::RequiredFields {
                        fields: self.required_with_reserved(&object.required),
                    });
                }
            }
            step.assertions.push(Assertion::BodyEqualsRequest);
        }
        step.captures = vec![Capture::LastId, Capture::LastRequest];
        step
    }

    fn get_step(
        &self,
        id_path: &str,
        get: &Operation,
        compare: &str,
        diags: &mut Diagnostics,
    ) -> Step {
        let mut step = Step::new(step_name(get, None), Method::Get, self.resource_id_url(id_path));
        step.description = get.description.clone();
        step.assertions = vec![
            Assertion::ContentTypePresent,
            Assertion::StatusCode(200),
            Assertion::BodyEqualsEnv {
                variable: compare.to_string(),
            },
        ];
        if let Some(schema) = get.response_schema("200") {
            let resolved = self.resolver.resolve(schema, diags);
            if let Some(object) = resolved.as_object() {
                if !object.required.is_empty() {
                    step.assertions.push(Assertion::RequiredFields {
                        fields: self.required_with_reserved(&object.required),
                    });
                }
            }
        }
        step
    }

    /// The PUT step replaces one string property of the captured body. When
    /// the request schema has no non-reserved string property there is
    /// nothing to modify, so the step and its verification GET are skipped.
    fn update_step(&self, id_path: &str, put: &Operation, diags: &mut Diagnostics) -> Option<Step> {
        let body_schema = put.request_body.as_ref()?;
        let resolved = self.resolver.resolve(body_schema, diags);
        let property = self.find_string_property(resolved.as_object()?)?;

        let mut step = Step::new(step_name(put, None), Method::Put, self.resource_id_url(id_path));
        step.description = put.description.clone();
        step.body = StepBody::Template("{{putBody}}".to_string());
        step.assertions = vec![
            Assertion::ContentTypePresent,
            Assertion::StatusCode(200),
            Assertion::BodyEqualsEnv {
                variable: "putBody".to_string(),
            },
        ];
        step.pre_request = Some(UpdateBody {
            property,
            value: self.config.defaults.update_string.clone(),
        });
        Some(step)
    }

    fn get_all_step(&self, path: &str, get: &Operation, filter: Option<(&str, &str)>) -> Step {
        let mut url = self.resource_url(path);
        if let Some((name, value)) = filter {
            url.push_str(&format!("?{name}={value}"));
        }
        let mut step = Step::new(
            step_name(get, filter.map(|(name, _)| name)),
            Method::Get,
            url,
        );
        step.description = get.description.clone();
        step.assertions = vec![
            Assertion::ContentTypePresent,
            Assertion::StatusCode(200),
            Assertion::ContainsCreated,
        ];
        if let Some((name, value)) = filter {
            step.query.push(QueryParam {
                key: name.to_string(),
                value: value.to_string(),
            });
            step.assertions.push(Assertion::FieldValueInList {
                field: name.to_string(),
                value: value.to_string(),
            });
        }
        step
    }

    /// Projection step: request only the mandatory fields of the list
    /// element. Requires the collection GET to declare an array response.
    fn fields_step(&self, path: &str, get: &Operation, diags: &mut Diagnostics) -> Option<Step> {
        let schema = get.response_schema("200")?;
        let resolved = self.resolver.resolve(schema, diags);
        let Shape::Array(element) = &resolved.shape else {
            return None;
        };
        let element = self.resolver.resolve(element, diags);
        let required = element
            .as_object()
            .map(|object| object.required.clone())
            .unwrap_or_default();

        let mut fields: Vec<String> = required
            .iter()
            .filter(|name| !self.config.is_reserved_property(name))
            .cloned()
            .collect();
        if fields.is_empty() {
            fields.push("none".to_string());
        }

        let url = format!("{}?fields={}", self.resource_url(path), fields.join(","));
        let mut step = Step::new(step_name(get, Some("mandatory fields")), Method::Get, url);
        step.description = get.description.clone();
        step.assertions = vec![
            Assertion::ContentTypePresent,
            Assertion::StatusCode(200),
            Assertion::ContainsCreated,
            Assertion::OnlyFields {
                fields: self.required_with_reserved(&required),
            },
        ];
        Some(step)
    }

    fn delete_step(&self, id_path: &str, delete: &Operation) -> Step {
        let mut step = Step::new(
            step_name(delete, None),
            Method::Delete,
            self.resource_id_url(id_path),
        );
        step.description = delete.description.clone();
        step.assertions = vec![Assertion::StatusCode(200)];
        step
    }

    /// When the body schema discriminates over `oneOf` branches and the
    /// override touches a property declared by one of them, stamp that
    /// branch's discriminator value into the override so synthesis picks
    /// the matching branch.
    fn add_one_of_attributes(
        &self,
        schema: &SchemaNode,
        override_value: &mut Value,
        diags: &mut Diagnostics,
    ) {
        let resolved = self.resolver.resolve(schema, diags);
        let Some(object) = resolved.as_object() else {
            return;
        };
        if object.one_of.is_empty() {
            return;
        }
        let Some(discriminator) = &object.discriminator else {
            return;
        };
        let keys: Vec<String> = match override_value.as_object() {
            Some(map) => map.keys().cloned().collect(),
            None => return,
        };

        for branch in &object.one_of {
            let branch_resolved = self.resolver.resolve(branch, diags);
            let Some(branch_object) = branch_resolved.as_object() else {
                continue;
            };
            if !keys
                .iter()
                .any(|key| branch_object.properties.contains_key(key))
            {
                continue;
            }
            let Some(segment) = branch.reference_segment() else {
                continue;
            };
            let label = discriminator
                .mapping
                .iter()
                .filter(|(_, target)| ref_segment(target) == segment)
                .map(|(name, _)| name.clone())
                .last()
                .unwrap_or_else(|| segment.to_string());
            if let Some(map) = override_value.as_object_mut() {
                map.insert(discriminator.property_name.clone(), Value::String(label));
            }
        }
    }

    fn post_with_body<'b>(
        &self,
        path: &str,
        item: &'b PathItem,
        diags: &mut Diagnostics,
        seen_body_gaps: &mut Vec<String>,
    ) -> Option<(&'b Operation, &'b SchemaNode)> {
        let post = item.post.as_ref()?;
        match &post.request_body {
            Some(schema) => Some((post, schema)),
            None => {
                if !seen_body_gaps.iter().any(|seen| seen == path) {
                    seen_body_gaps.push(path.to_string());
                    diags.push(
                        DiagnosticKind::MissingRequestBody,
                        path,
                        "no request body for the POST operation",
                    );
                }
                None
            }
        }
    }

    fn find_string_property(&self, object: &ObjectSchema) -> Option<String> {
        object
            .properties
            .iter()
            .find(|(name, node)| {
                !self.config.is_reserved_property(name) && node.is_string_scalar()
            })
            .map(|(name, _)| name.clone())
    }

    /// Required fields with every reserved property moved to the end.
    fn required_with_reserved(&self, required: &[String]) -> Vec<String> {
        let mut result: Vec<String> = required
            .iter()
            .filter(|name| !self.config.is_reserved_property(name))
            .cloned()
            .collect();
        result.extend(self.config.reserved_properties.iter().cloned());
        result
    }

    fn resource_url(&self, path: &str) -> String {
        format!("{}{}", self.config.url_prefix(), path)
    }

    fn resource_id_url(&self, id_path: &str) -> String {
        format!(
            "{}{}",
            self.config.url_prefix(),
            id_path.replace("{id}", "{{lastId}}")
        )
    }
}

fn step_name(operation: &Operation, additional: Option<&str>) -> String {
    match additional {
        Some(additional) => format!("{} with {}", operation.summary, additional),
        None => operation.summary.clone(),
    }
}

fn trimmed(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Render a JSON value the way it reads in a URL or script literal:
/// strings bare, everything else in JSON notation.
fn plain_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
