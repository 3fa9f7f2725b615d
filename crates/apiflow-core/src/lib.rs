//! apiflow-core: Scenario synthesis from OpenAPI documents
//!
//! This crate parses Swagger v2 and OpenAPI v3 documents into a common model,
//! synthesizes request bodies from their schemas, and derives executable CRUD
//! test scenarios without performing any HTTP traffic.

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod prune;
pub mod resolve;
pub mod scenario;
pub mod schema;
pub mod synth;

pub use builder::ScenarioBuilder;
pub use config::{Config, ConfigError, Defaults};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use document::{ApiDocument, DocumentError, Operation, Parameter, PathItem};
pub use prune::prune;
pub use resolve::Resolver;
pub use scenario::{
    Assertion, Capture, Method, QueryParam, Scenario, Step, StepBody, UpdateBody,
};
pub use schema::SchemaNode;
pub use synth::Synthesizer;
