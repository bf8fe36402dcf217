//! Request file loading.
//!
//! Requests are YAML or JSON. The format follows the file extension; other
//! extensions and stdin (`-`) are tried as JSON first, then YAML.

use std::io::{self, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Path that stands for stdin.
pub const STDIN: &str = "-";

/// Error type for request loading.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read request: {0}")]
    Read(#[from] io::Error),
    #[error("invalid YAML request: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request is neither valid JSON ({json}) nor valid YAML ({yaml})")]
    Unrecognized {
        json: serde_json::Error,
        yaml: serde_yaml::Error,
    },
}

/// Loads a request from a file, or from stdin when `path` is `-`.
pub fn load_request<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, RequestError> {
    let path = path.as_ref();
    if path == Path::new(STDIN) {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        return parse_any(&data);
    }
    let data = std::fs::read(path)?;
    parse_request(&data, path)
}

/// Parses request data, choosing the format from `path`'s extension.
pub fn parse_request<T: DeserializeOwned>(
    data: &[u8],
    path: impl AsRef<Path>,
) -> Result<T, RequestError> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_slice(data)?),
        Some("json") => Ok(serde_json::from_slice(data)?),
        _ => parse_any(data),
    }
}

fn parse_any<T: DeserializeOwned>(data: &[u8]) -> Result<T, RequestError> {
    let json = match serde_json::from_slice(data) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    match serde_yaml::from_slice(data) {
        Ok(v) => Ok(v),
        Err(yaml) => Err(RequestError::Unrecognized { json, yaml }),
    }
}
