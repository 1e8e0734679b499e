//! Document linting - static analysis of OpenAPI 3.1 files.
//!
//! Checks documents for:
//! - JSON syntax and decode errors
//! - Missing required fields
//! - Broken internal `$ref` fragments
//! - Invalid `components` and `responses` keys
//! - Malformed parameters

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::document::{is_valid_component_key, is_valid_response_key, Method, OpenApi};
use crate::loader::load_json;
use crate::pointer::{Pointer, UriFragment};
use crate::types::json_type_name;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// JSON Pointer to the issue (e.g., "/paths/~1pets/get/responses/200")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_document_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single document file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let diagnostics = match load_json(file) {
        Ok(document) => lint_document(&document),
        Err(e) => vec![Diagnostic {
            severity: Severity::Error,
            code: "E001".to_string(),
            path: "/".to_string(),
            message: format!("syntax error: {}", e),
        }],
    };
    debug!(file = %file.display(), diagnostics = diagnostics.len(), "linted");

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

/// Lint a decoded document.
///
/// Structural checks run on the raw JSON so that one bad field does not hide
/// the rest. A decode failure is reported as E001 only when no structural
/// error already explains it.
pub fn lint_document(document: &Value) -> Vec<Diagnostic> {
    let mut linter = Linter {
        root: document,
        diagnostics: Vec::new(),
    };
    linter.check_root();
    linter.check_refs(document, &Pointer::root());

    let has_errors = linter
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error);
    if !has_errors {
        if let Err(e) = serde_json::from_value::<OpenApi>(document.clone()) {
            linter.error("E001", &Pointer::root(), format!("not an OpenAPI document: {e}"));
        }
    }
    linter.diagnostics
}

struct Linter<'a> {
    root: &'a Value,
    diagnostics: Vec<Diagnostic>,
}

fn location(at: &Pointer) -> String {
    if at.is_root() {
        "/".to_string()
    } else {
        at.to_string()
    }
}

impl Linter<'_> {
    fn error(&mut self, code: &str, at: &Pointer, message: String) {
        self.push(Severity::Error, code, at, message);
    }

    fn warning(&mut self, code: &str, at: &Pointer, message: String) {
        self.push(Severity::Warning, code, at, message);
    }

    fn push(&mut self, severity: Severity, code: &str, at: &Pointer, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            path: location(at),
            message,
        });
    }

    /// Reports E002 unless `map` has `field`.
    fn require(&mut self, map: &Map<String, Value>, field: &str, at: &Pointer) {
        if !map.contains_key(field) {
            self.error(
                "E002",
                at,
                format!("missing required field \"{field}\""),
            );
        }
    }

    fn check_root(&mut self) {
        let root = Pointer::root();
        let document = self.root;
        let Some(doc) = document.as_object() else {
            self.error(
                "E001",
                &root,
                format!("expected object, got {}", json_type_name(document)),
            );
            return;
        };

        self.require(doc, "openapi", &root);
        if let Some(version) = doc.get("openapi").and_then(Value::as_str) {
            if !version.starts_with("3.1.") {
                self.warning(
                    "W001",
                    &root.join("openapi"),
                    format!("openapi version \"{version}\" is not 3.1.x"),
                );
            }
        }

        self.require(doc, "info", &root);
        if let Some(info) = doc.get("info").and_then(Value::as_object) {
            let at = root.join("info");
            self.require(info, "title", &at);
            self.require(info, "version", &at);
            if let Some(license) = info.get("license").and_then(Value::as_object) {
                self.require(license, "name", &at.join("license"));
            }
        }

        self.check_servers(doc.get("servers"), &root.join("servers"));

        for section in ["paths", "webhooks"] {
            if let Some(items) = doc.get(section).and_then(Value::as_object) {
                let at = root.join(section);
                for (key, item) in items {
                    self.check_path_item(item, &at.join(key.as_str()));
                }
            }
        }

        if let Some(components) = doc.get("components").and_then(Value::as_object) {
            self.check_components(components, &root.join("components"));
        }
    }

    fn check_servers(&mut self, servers: Option<&Value>, at: &Pointer) {
        let Some(servers) = servers.and_then(Value::as_array) else {
            return;
        };
        for (i, server) in servers.iter().enumerate() {
            if let Some(server) = server.as_object() {
                self.require(server, "url", &at.join(i.to_string()));
            }
        }
    }

    fn check_path_item(&mut self, item: &Value, at: &Pointer) {
        let Some(item) = item.as_object() else {
            return;
        };
        self.check_servers(item.get("servers"), &at.join("servers"));
        self.check_parameters(item.get("parameters"), &at.join("parameters"));
        for method in Method::ALL {
            let Some(operation) = item.get(method.as_str()).and_then(Value::as_object) else {
                continue;
            };
            let at = at.join(method.as_str());
            self.check_servers(operation.get("servers"), &at.join("servers"));
            self.check_parameters(operation.get("parameters"), &at.join("parameters"));
            if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
                self.check_responses(responses, &at.join("responses"));
            }
            if let Some(callbacks) = operation.get("callbacks").and_then(Value::as_object) {
                let at = at.join("callbacks");
                for (name, callback) in callbacks {
                    let Some(callback) = callback.as_object() else {
                        continue;
                    };
                    for (expression, item) in callback {
                        self.check_path_item(item, &at.join(name.as_str()).join(expression.as_str()));
                    }
                }
            }
        }
    }

    fn check_parameters(&mut self, parameters: Option<&Value>, at: &Pointer) {
        let Some(parameters) = parameters.and_then(Value::as_array) else {
            return;
        };
        for (i, parameter) in parameters.iter().enumerate() {
            self.check_parameter(parameter, &at.join(i.to_string()));
        }
    }

    fn check_parameter(&mut self, parameter: &Value, at: &Pointer) {
        let Some(parameter) = parameter.as_object() else {
            return;
        };
        if parameter.contains_key("$ref") {
            return;
        }
        self.require(parameter, "name", at);
        self.require(parameter, "in", at);

        if parameter.get("in").and_then(Value::as_str) == Some("path")
            && parameter.get("required") != Some(&Value::Bool(true))
        {
            self.error(
                "E006",
                at,
                "path parameter must set \"required\": true".to_string(),
            );
        }

        let has_schema = parameter.contains_key("schema");
        let has_content = parameter.contains_key("content");
        if has_schema == has_content {
            self.error(
                "E007",
                at,
                "parameter must define exactly one of \"schema\" or \"content\"".to_string(),
            );
        }
    }

    fn check_responses(&mut self, responses: &Map<String, Value>, at: &Pointer) {
        for (key, response) in responses {
            if key.starts_with("x-") {
                continue;
            }
            let at = at.join(key.as_str());
            if !is_valid_response_key(key) {
                self.error(
                    "E005",
                    &at,
                    format!("invalid responses key \"{key}\": expected default or a status like 200 or 4XX"),
                );
            }
            self.check_response(response, &at);
        }
    }

    fn check_response(&mut self, response: &Value, at: &Pointer) {
        if let Some(response) = response.as_object() {
            if !response.contains_key("$ref") {
                self.require(response, "description", at);
            }
        }
    }

    fn check_components(&mut self, components: &Map<String, Value>, at: &Pointer) {
        for (section, entries) in components {
            if section.starts_with("x-") {
                continue;
            }
            let Some(entries) = entries.as_object() else {
                continue;
            };
            let at = at.join(section.as_str());
            for (key, entry) in entries {
                let entry_at = at.join(key.as_str());
                if !is_valid_component_key(key) {
                    self.error(
                        "E004",
                        &entry_at,
                        format!("invalid components key \"{key}\": expected [A-Za-z0-9._-]+"),
                    );
                }
                match section.as_str() {
                    "responses" => self.check_response(entry, &entry_at),
                    "parameters" => self.check_parameter(entry, &entry_at),
                    "pathItems" => self.check_path_item(entry, &entry_at),
                    _ => {}
                }
            }
        }
    }

    /// Walks every value for `$ref` fragments and `unevaluated*` keywords.
    fn check_refs(&mut self, value: &Value, at: &Pointer) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    self.check_single_ref(reference, at);
                }
                for keyword in ["unevaluatedItems", "unevaluatedProperties"] {
                    if map.contains_key(keyword) {
                        self.warning(
                            "W002",
                            &at.join(keyword),
                            format!("{keyword} is not supported by the validator"),
                        );
                    }
                }
                for (key, child) in map {
                    self.check_refs(child, &at.join(key.as_str()));
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_refs(item, &at.join(i.to_string()));
                }
            }
            _ => {}
        }
    }

    fn check_single_ref(&mut self, reference: &str, at: &Pointer) {
        // External references can't be checked locally.
        if !reference.starts_with('#') {
            return;
        }
        let resolved = UriFragment::parse(reference)
            .map_err(|e| e.to_string())
            .and_then(|fragment| {
                fragment
                    .access(self.root)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            });
        if let Err(reason) = resolved {
            self.error(
                "E003",
                &at.join("$ref"),
                format!("unresolved reference {reference}: {reason}"),
            );
        }
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_document_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn codes(document: Value) -> Vec<String> {
        lint_document(&document)
            .into_iter()
            .map(|d| d.code)
            .collect()
    }

    fn minimal() -> Value {
        json!({"openapi": "3.1.0", "info": {"title": "t", "version": "1"}})
    }

    #[test]
    fn minimal_document_is_clean() {
        assert!(lint_document(&minimal()).is_empty());
    }

    #[test]
    fn missing_required_fields() {
        let diagnostics = lint_document(&json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "license": {}},
            "servers": [{"description": "no url"}]
        }));
        let paths: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.code == "E002")
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(paths, vec!["/info", "/info/license", "/servers/0"]);
    }

    #[test]
    fn broken_internal_ref() {
        let mut doc = minimal();
        doc["components"] = json!({"schemas": {
            "Pet": {"properties": {"tag": {"$ref": "#/components/schemas/Tag"}}}
        }});
        let diagnostics = lint_document(&doc);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "E003");
        assert_eq!(
            diagnostics[0].path,
            "/components/schemas/Pet/properties/tag/$ref"
        );
    }

    #[test]
    fn external_refs_are_skipped() {
        let mut doc = minimal();
        doc["components"] = json!({"schemas": {"Pet": {"$ref": "pet.json#/Pet"}}});
        assert!(lint_document(&doc).is_empty());
    }

    #[test]
    fn invalid_component_and_response_keys() {
        let mut doc = minimal();
        doc["components"] = json!({"schemas": {"Pet Store": {}}});
        doc["paths"] = json!({"/pets": {"get": {"responses": {
            "200": {"description": "ok"},
            "2xx": {"description": "bad key"},
            "x-note": "ignored"
        }}}});
        assert_eq!(codes(doc), vec!["E005", "E004"]);
    }

    #[test]
    fn response_description_required() {
        let mut doc = minimal();
        doc["paths"] = json!({"/pets": {"get": {"responses": {"200": {}}}}});
        let diagnostics = lint_document(&doc);
        assert_eq!(diagnostics[0].code, "E002");
        assert_eq!(diagnostics[0].path, "/paths/~1pets/get/responses/200");
    }

    #[test]
    fn parameter_rules() {
        let mut doc = minimal();
        doc["paths"] = json!({"/pets/{id}": {
            "parameters": [
                {"name": "id", "in": "path", "schema": {"type": "string"}},
                {"name": "q", "in": "query"},
                {"name": "r", "in": "query", "schema": {}, "content": {}}
            ]
        }});
        assert_eq!(codes(doc), vec!["E006", "E007", "E007"]);
    }

    #[test]
    fn version_and_unevaluated_warnings() {
        let mut doc = minimal();
        doc["openapi"] = json!("3.0.3");
        doc["components"] = json!({"schemas": {"Pet": {"unevaluatedProperties": false}}});
        let diagnostics = lint_document(&doc);
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
        assert_eq!(
            diagnostics.iter().map(|d| d.code.as_str()).collect::<Vec<_>>(),
            vec!["W001", "W002"]
        );
    }

    #[test]
    fn decode_failure_without_structural_error() {
        let mut doc = minimal();
        doc["paths"] = json!({"/pets": {"get": {"parameters": [
            {"name": "id", "in": "body", "schema": {}}
        ]}}});
        assert_eq!(codes(doc), vec!["E001"]);
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not valid json }}").unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("valid.json"), minimal().to_string()).unwrap();
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("old.json");
        let mut doc = minimal();
        doc["openapi"] = json!("3.0.0");
        std::fs::write(&file_path, doc.to_string()).unwrap();

        let result = lint(&file_path, false);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        let result = lint(&file_path, true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
