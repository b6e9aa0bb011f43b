//! Reading YAML documents from disk.

use crate::error::{PromptError, Result};
use serde_yaml::Value;
use std::path::Path;

/// Read and parse a YAML file, preserving key insertion order.
///
/// Missing files and malformed YAML are reported as distinct errors.
pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PromptError::DocumentNotFound {
                path: path.display().to_string(),
            }
        } else {
            PromptError::DocumentSyntax {
                path: path.display().to_string(),
                message: format!("failed to read file: {}", e),
            }
        }
    })?;

    serde_yaml::from_str(&content).map_err(|e| PromptError::DocumentSyntax {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
