//! Document loading from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::document::OpenApi;
use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load JSON from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), "loading file");
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_json_str(&content)
}

/// Load JSON from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load JSON from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the status is not
/// a success, or if the body isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_json_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    debug!(url, "fetching");
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load JSON from a file path or URL.
///
/// URL loading requires the `remote` feature; without it a URL is reported as
/// a missing file.
pub fn load_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_json_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_json(Path::new(source))
    }
}

/// Load and decode an OpenAPI document from a file path or URL.
///
/// # Errors
///
/// Any [`load_auto`] error, or `LoadError::InvalidDocument` when the JSON does
/// not decode as a document.
pub fn load_document(source: &str) -> Result<OpenApi, LoadError> {
    let value = load_auto(source)?;
    serde_json::from_value(value).map_err(|source| LoadError::InvalidDocument { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_json_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "object"}}"#).unwrap();

        let value = load_json(file.path()).unwrap();
        assert_eq!(value["type"], "object");
    }

    #[test]
    fn load_json_file_not_found() {
        let result = load_json(Path::new("/nonexistent/path.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_json_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_json(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_json_str_invalid() {
        assert!(matches!(
            load_json_str("not json"),
            Err(LoadError::InvalidJson { .. })
        ));
    }

    #[test]
    fn is_url_schemes() {
        assert!(is_url("https://example.com/openapi.json"));
        assert!(is_url("http://example.com/openapi.json"));
        assert!(!is_url("/path/to/openapi.json"));
        assert!(!is_url("openapi.json"));
    }

    #[test]
    fn load_document_decodes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"openapi": "3.1.0", "info": {{"title": "t", "version": "1"}}}}"#
        )
        .unwrap();

        let doc = load_document(file.path().to_str().unwrap()).unwrap();
        assert_eq!(doc.info.title, "t");
    }

    #[test]
    fn load_document_rejects_non_documents() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"openapi": "3.1.0"}}"#).unwrap();

        let result = load_document(file.path().to_str().unwrap());
        assert!(matches!(result, Err(LoadError::InvalidDocument { .. })));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_json_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/openapi.json")
                .with_header("content-type", "application/json")
                .with_body(r#"{"openapi": "3.1.0"}"#)
                .create();

            let value = load_json_url(&format!("{}/openapi.json", server.url())).unwrap();
            assert_eq!(value["openapi"], "3.1.0");
            mock.assert();
        }

        #[test]
        fn load_json_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_json_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_auto_dispatches_urls() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/schema.json")
                .with_body(r#"{"type": "string"}"#)
                .create();

            let value = load_auto(&format!("{}/schema.json", server.url())).unwrap();
            assert_eq!(value["type"], "string");
        }
    }
}
