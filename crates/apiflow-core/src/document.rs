//! OpenAPI document ingestion
//!
//! Accepts Swagger v2 and OpenAPI v3 documents already parsed into JSON and
//! lifts the parts scenario building needs into typed form. Detection is
//! shape-based per field rather than keyed off the version marker, so mixed
//! or partial documents still yield what they can.

use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::schema::SchemaNode;

/// The parts of an OpenAPI document relevant to scenario generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDocument {
    /// `info.title`, used as the collection name
    pub title: String,
    /// `info.description`, used as the collection description
    pub description: String,
    /// Named schemas from `definitions` or `components.schemas`
    pub schemas: IndexMap<String, SchemaNode>,
    /// Path templates in declaration order
    pub paths: IndexMap<String, PathItem>,
}

/// Operations declared on one path template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub delete: Option<Operation>,
}

/// One operation on a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub summary: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    /// JSON request body schema, from `requestBody` content or a v2 body parameter
    pub request_body: Option<SchemaNode>,
    /// Response body schemas keyed by status code, statuses without a schema omitted
    pub responses: IndexMap<String, SchemaNode>,
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// The `in` value: `query`, `path`, `header`, `body`, ...
    pub location: String,
    pub required: bool,
    pub schema: SchemaNode,
}

impl ApiDocument {
    /// Lift a parsed JSON document into the typed model.
    ///
    /// # Errors
    ///
    /// Returns error if the root is not an object or carries no `info` or
    /// `paths`.
    pub fn from_value(root: &Value) -> Result<Self, DocumentError> {
        let Some(doc) = root.as_object() else {
            return Err(DocumentError::NotAnObject);
        };

        let Some(info) = doc.get("info").and_then(Value::as_object) else {
            return Err(DocumentError::MissingInfo);
        };
        let title = info
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = info
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let schemas = doc
            .get("definitions")
            .or_else(|| doc.get("components").and_then(|c| c.get("schemas")))
            .and_then(Value::as_object)
            .map(|table| {
                table
                    .iter()
                    .map(|(name, value)| (name.clone(), SchemaNode::from_value(value)))
                    .collect()
            })
            .unwrap_or_default();

        let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
            return Err(DocumentError::MissingPaths);
        };
        let paths = paths
            .iter()
            .map(|(path, item)| (path.clone(), PathItem::from_value(item)))
            .collect();

        Ok(Self {
            title,
            description,
            schemas,
            paths,
        })
    }
}

impl PathItem {
    fn from_value(value: &Value) -> Self {
        Self {
            get: value.get("get").and_then(Operation::from_value),
            post: value.get("post").and_then(Operation::from_value),
            put: value.get("put").and_then(Operation::from_value),
            delete: value.get("delete").and_then(Operation::from_value),
        }
    }
}

impl Operation {
    fn from_value(value: &Value) -> Option<Self> {
        let op = value.as_object()?;

        let summary = op
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = op
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let parameters: Vec<Parameter> = op
            .get("parameters")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(parse_parameter).collect())
            .unwrap_or_default();

        let request_body = op
            .get("requestBody")
            .and_then(|rb| rb.get("content"))
            .and_then(|content| content.get("application/json"))
            .and_then(|media| media.get("schema"))
            .map(SchemaNode::from_value)
            .or_else(|| {
                parameters
                    .iter()
                    .find(|p| p.location == "body")
                    .map(|p| p.schema.clone())
            });

        let mut responses = IndexMap::new();
        if let Some(declared) = op.get("responses").and_then(Value::as_object) {
            for (status, body) in declared {
                if let Some(schema) = response_schema_value(body) {
                    responses.insert(status.clone(), SchemaNode::from_value(schema));
                }
            }
        }

        Some(Self {
            summary,
            description,
            parameters,
            request_body,
            responses,
        })
    }

    /// The response body schema for a status code, if one is declared.
    #[must_use]
    pub fn response_schema(&self, status: &str) -> Option<&SchemaNode> {
        self.responses.get(status)
    }
}

impl Parameter {
    #[must_use]
    pub fn is_query(&self) -> bool {
        self.location == "query"
    }
}

fn parse_parameter(value: &Value) -> Parameter {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let location = value
        .get("in")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let required = value
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    // v3 nests the schema, v2 inlines type/format/example on the parameter
    let schema = if let Some(nested) = value.get("schema") {
        SchemaNode::from_value(nested)
    } else if value.get("type").is_some() {
        SchemaNode::from_value(value)
    } else {
        SchemaNode::from_value(&json!({"type": "string"}))
    };

    Parameter {
        name,
        location,
        required,
        schema,
    }
}

fn response_schema_value(body: &Value) -> Option<&Value> {
    body.get("schema").or_else(|| {
        body.get("content")
            .and_then(|content| content.get("application/json"))
            .and_then(|media| media.get("schema"))
    })
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document root is not an object")]
    NotAnObject,
    #[error("document has no info object")]
    MissingInfo,
    #[error("document has no paths object")]
    MissingPaths,
}
