//! Shared helpers for command handlers.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use storefront_core::{ConfigOrigin, DocumentKind, EffectiveConfig, SyncStatus};

use crate::error::CliError;
use crate::output;

/// Read and parse a JSON document from disk.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CliError::NotFound {
            resource_type: "file".into(),
            identifier: path.display().to_string(),
            hint: "Check the path and try again.".into(),
        },
        _ => CliError::Io(e),
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::InvalidJson {
        path: path.display().to_string(),
        source,
    })
}

/// Select `pointer` inside a document, or the whole document.
pub fn select<'a>(value: &'a Value, pointer: Option<&str>) -> Result<&'a Value, CliError> {
    match pointer {
        None | Some("") => Ok(value),
        Some(ptr) => value.pointer(ptr).ok_or_else(|| CliError::NotFound {
            resource_type: "pointer".into(),
            identifier: ptr.into(),
            hint: "JSON pointers start with '/', e.g. /colors/brand".into(),
        }),
    }
}

/// Serializable view of one effective configuration and its sync status.
#[derive(Debug, Serialize)]
pub struct ConfigView<'a> {
    pub document: DocumentKind,
    pub origin: ConfigOrigin,
    pub status: &'a SyncStatus,
    pub revision: u64,
    pub merged_at: DateTime<Utc>,
    pub discarded: &'a [String],
    pub value: &'a Value,
}

impl<'a> ConfigView<'a> {
    pub fn new(config: &'a Arc<EffectiveConfig>, status: &'a SyncStatus, value: &'a Value) -> Self {
        Self {
            document: config.kind,
            origin: config.origin,
            status,
            revision: config.revision,
            merged_at: config.merged_at,
            discarded: &config.discarded,
            value,
        }
    }

    /// Header lines followed by the pretty-printed value.
    pub fn detail(&self, color: bool) -> Result<String, CliError> {
        let mut lines = vec![
            format!("document  {}", self.document),
            format!("origin    {}", output::paint_origin(self.origin, color)),
            format!("status    {}", output::paint_status(self.status, color)),
            format!("revision  {}", self.revision),
            format!("merged    {}", self.merged_at.to_rfc3339()),
        ];
        if !self.discarded.is_empty() {
            lines.push(format!("discarded {}", self.discarded.join(", ")));
        }
        lines.push(String::new());
        lines.push(output::render_json_pretty(self.value)?);
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn select_resolves_pointers() {
        let doc = json!({"colors": {"brand": "#000"}});
        assert_eq!(select(&doc, None).unwrap(), &doc);
        assert_eq!(select(&doc, Some("/colors/brand")).unwrap(), &json!("#000"));
        let err = select(&doc, Some("/fonts")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::NOT_FOUND);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }

    #[test]
    fn invalid_json_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_json_file(&path).unwrap_err();
        assert!(matches!(err, CliError::InvalidJson { .. }));
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }
}
