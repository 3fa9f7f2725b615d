//! Structured diagnostics for recoverable document gaps
//!
//! The pipeline never aborts on a broken reference or a missing operation;
//! it records what was skipped or substituted and keeps going. The CLI
//! renders the collected entries on stderr.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed set of recoverable gap kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `$ref` target absent from the schema table; an empty schema was used.
    UnresolvedReference,
    /// Reference chain exceeded the resolution guard; an empty schema was used.
    CircularReference,
    /// POST without a JSON body schema; the path was skipped.
    MissingRequestBody,
    /// Discriminator value missing or matching no branch; branch 0 was used.
    AmbiguousDiscriminator,
    /// Expected GET/PUT/DELETE not declared; the step was omitted.
    MissingOperation,
}

impl DiagnosticKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnresolvedReference => "unresolved_reference",
            Self::CircularReference => "circular_reference",
            Self::MissingRequestBody => "missing_request_body",
            Self::AmbiguousDiscriminator => "ambiguous_discriminator",
            Self::MissingOperation => "missing_operation",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recoverable gap: what happened, where, and what was done about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Document location: a path (`/pets`), an operation (`GET /pets/{id}`),
    /// or a reference target.
    pub path: String,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path, self.detail)
    }
}

/// Ordered diagnostic sink threaded through the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        path: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.entries.push(Diagnostic {
            kind,
            path: path.into(),
            detail: detail.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry count for one kind; handy for assertions and summaries.
    #[must_use]
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }
}
