//! Input document loading
//!
//! Accepts JSON and YAML files. Detection follows the extension first
//! (`.json`, `.yaml`, `.yml`), then falls back to content sniffing: a
//! leading `{` reads as JSON, anything else as YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path)
        .map_err(|e| LoadError::Io(path.to_path_buf(), e.to_string()))?;
    parse_document(path, &content)
}

fn parse_document(path: &Path, content: &str) -> Result<Value, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => parse_json(content),
        "yaml" | "yml" => parse_yaml(content),
        _ => {
            if content.trim_start().starts_with('{') {
                parse_json(content)
            } else {
                parse_yaml(content)
            }
        }
    }
}

fn parse_json(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|e| LoadError::Parse(format!("Invalid JSON: {e}")))
}

fn parse_yaml(content: &str) -> Result<Value, LoadError> {
    serde_yml::from_str(content).map_err(|e| LoadError::Parse(format!("Invalid YAML: {e}")))
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, String),
    #[error("{0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_json_by_extension() {
        let json = r#"{"openapi": "3.0.0", "paths": {}}"#;
        let v = parse_document(Path::new("spec.json"), json).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn parse_yaml_by_extension() {
        let yaml = "swagger: '2.0'\ninfo:\n  title: T\npaths: {}\n";
        let v = parse_document(Path::new("spec.yaml"), yaml).unwrap();
        assert_eq!(v["swagger"], "2.0");
    }

    #[test]
    fn parse_yml_by_extension() {
        let yaml = "openapi: '3.0.0'\npaths: {}\n";
        let v = parse_document(Path::new("spec.yml"), yaml).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn sniff_json_without_extension() {
        let json = r#"  {"openapi": "3.0.0"}"#;
        let v = parse_document(Path::new("spec"), json).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn sniff_yaml_without_extension() {
        let yaml = "openapi: '3.0.0'\n";
        let v = parse_document(Path::new("spec"), yaml).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn invalid_json_reports_parse_error() {
        let err = parse_document(Path::new("spec.json"), "{not json").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(file, r#"{{"openapi": "3.0.0", "paths": {{}}}}"#).unwrap();

        let v = load_document(file.path()).unwrap();
        assert_eq!(v["openapi"], "3.0.0");
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = load_document(Path::new("/nonexistent/spec.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_, _)));
    }
}
