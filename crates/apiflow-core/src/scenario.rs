//! Scenario model produced by the builder
//!
//! A scenario is an ordered chain of HTTP steps sharing environment state.
//! Steps carry typed assertions and captures; rendering them into an
//! executable form is left to output crates.

use serde_json::Value;

/// One named chain of steps exercising a resource path.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

/// One HTTP request in a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub description: String,
    pub method: Method,
    pub url: String,
    pub body: StepBody,
    pub query: Vec<QueryParam>,
    pub assertions: Vec<Assertion>,
    pub captures: Vec<Capture>,
    pub pre_request: Option<UpdateBody>,
}

impl Step {
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            method,
            url: url.into(),
            body: StepBody::None,
            query: Vec::new(),
            assertions: Vec::new(),
            captures: Vec::new(),
            pre_request: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Request body of a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepBody {
    None,
    /// Synthesized JSON, serialized compactly on output
    Json(Value),
    /// Literal text, typically an environment template like `{{putBody}}`
    Template(String),
}

/// One query string entry, also baked into the step URL.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
}

/// A response check attached to a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// The Content-Type header is present
    ContentTypePresent,
    /// The status code equals the given code
    StatusCode(u16),
    /// The status code is 400 or above
    StatusIsError,
    /// A Location header is present
    LocationHeaderPresent,
    /// The Location header points at the created resource under `path`
    LocationHeaderCorrect { path: String },
    /// The response body equals the request body just sent
    BodyEqualsRequest,
    /// The response body equals a previously captured environment value
    BodyEqualsEnv { variable: String },
    /// The response body carries every listed field
    RequiredFields { fields: Vec<String> },
    /// The listed response array contains the captured `lastId`
    ContainsCreated,
    /// Every entry of the response array has `field` equal to `value`
    FieldValueInList { field: String, value: String },
    /// Entries of the response array carry only the listed fields
    OnlyFields { fields: Vec<String> },
}

/// Environment state captured from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// `lastId` from the response body's `id`
    LastId,
    /// `lastRequest` holding the raw response body
    LastRequest,
}

/// Pre-request mutation for an update step: reload the captured body,
/// replace one string property and stage the result as `putBody`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBody {
    pub property: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Put.as_str(), "PUT");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[test]
    fn new_step_is_bare() {
        let step = Step::new("Create", Method::Post, "{{host}}{{path}}/pets");
        assert_eq!(step.body, StepBody::None);
        assert!(step.query.is_empty());
        assert!(step.assertions.is_empty());
        assert!(step.captures.is_empty());
        assert!(step.pre_request.is_none());
    }
}
