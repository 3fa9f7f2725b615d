//! Legacy Postman collection envelope
//!
//! These types mirror the collection layout consumed by the classic Postman
//! importer and by Newman. Field spelling follows that JSON exactly, mixed
//! camelCase and snake_case included, so the serialized output round-trips
//! through tooling that predates the v2 collection format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level collection envelope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Ids of requests living directly under the collection root
    pub order: Vec<String>,
    pub folders: Vec<Folder>,
    pub folders_order: Vec<String>,
    /// Creation time, milliseconds since the epoch
    pub timestamp: u64,
    pub owner: u64,
    pub public: bool,
    /// Flat list of every request; folders reference them by id
    pub requests: Vec<Request>,
}

/// One folder per scenario; `order` lists its request ids.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "collectionId")]
    pub collection_id: String,
    pub order: Vec<String>,
    pub owner: u64,
    pub folders_order: Vec<String>,
}

/// A single request entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Request {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Raw header block, one `Name: value` line per header
    pub headers: String,
    #[serde(rename = "headerData")]
    pub header_data: Vec<HeaderEntry>,
    pub url: String,
    /// Id of the owning folder
    pub folder: String,
    #[serde(rename = "queryParams")]
    pub query_params: Vec<QueryEntry>,
    #[serde(rename = "preRequestScript")]
    pub pre_request_script: String,
    pub method: String,
    pub data: Vec<serde_json::Value>,
    #[serde(rename = "dataMode")]
    pub data_mode: String,
    pub version: u32,
    /// Test script source
    pub tests: String,
    #[serde(rename = "currentHelper")]
    pub current_helper: String,
    pub time: u64,
    #[serde(rename = "collectionId")]
    pub collection_id: String,
    #[serde(rename = "rawModeData")]
    pub raw_mode_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
    pub description: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryEntry {
    pub key: String,
    pub value: String,
    pub equals: bool,
    pub description: String,
    pub enabled: bool,
}

/// Generate JSON Schema for the collection envelope.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(Collection);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
