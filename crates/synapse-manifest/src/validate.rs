//! Manifest validation
//!
//! Turns extracted JSON into a [`Manifest`]. Structural problems with the
//! document as a whole are fatal ([`ManifestError`]); problems with a single
//! entry only drop that entry and record an [`EntryWarning`].
//!
//! Expected shape:
//!
//! ```text
//! { "files": [ { "name": "src/main.py", "content": "print('hi')" }, ... ] }
//! ```

use crate::entry::{FileEntry, Manifest};
use crate::warning::{EntryWarning, WarningKind};
use serde_json::{Map, Value};

/// Whole-document validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// Text is not valid JSON
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    /// Top-level value is not an object
    #[error("expected a JSON object at top level, found {0}")]
    NotAnObject(&'static str),

    /// Object lacks the file list, or it is not an array
    #[error("expected field '{field}' to be an array")]
    MissingFileList { field: String },
}

/// Manifest plus the entries that were skipped
#[derive(Debug, Clone, Default)]
pub struct ManifestReport {
    /// Valid entries in source order
    pub manifest: Manifest,
    /// One warning per skipped entry
    pub warnings: Vec<EntryWarning>,
}

/// Validator with configurable field names
#[derive(Debug, Clone)]
pub struct ManifestValidator {
    list_field: String,
    path_fields: Vec<String>,
    content_field: String,
}

impl Default for ManifestValidator {
    fn default() -> Self {
        Self {
            list_field: "files".to_string(),
            path_fields: vec!["name".to_string(), "path".to_string()],
            content_field: "content".to_string(),
        }
    }
}

impl ManifestValidator {
    /// Validator for `{"files": [{"name", "content"}]}`
    ///
    /// `path` is accepted when `name` is absent.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a different list field name
    #[inline]
    #[must_use]
    pub fn with_list_field(mut self, field: impl Into<String>) -> Self {
        self.list_field = field.into();
        self
    }

    /// Parse and check extracted text
    ///
    /// # Errors
    /// - `ManifestError::InvalidJson` if the text does not parse
    /// - `ManifestError::NotAnObject` if the top level is not an object
    /// - `ManifestError::MissingFileList` if the list field is absent or not an array
    pub fn validate(&self, extracted: &str) -> Result<ManifestReport, ManifestError> {
        let value: Value =
            serde_json::from_str(extracted).map_err(|e| ManifestError::InvalidJson(e.to_string()))?;

        let root = match value {
            Value::Object(root) => root,
            other => return Err(ManifestError::NotAnObject(type_name(&other))),
        };

        let items = match root.get(&self.list_field) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ManifestError::MissingFileList {
                    field: self.list_field.clone(),
                })
            }
        };

        tracing::info!(count = items.len(), "Received file entries from model response");

        let mut report = ManifestReport::default();
        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.validate_entry(index, item) {
                Ok(entry) => entries.push(entry),
                Err(warning) => {
                    tracing::warn!(%warning, "Skipping invalid file entry");
                    report.warnings.push(warning);
                }
            }
        }
        report.manifest = Manifest::new(entries);
        Ok(report)
    }

    fn validate_entry(&self, index: usize, item: &Value) -> Result<FileEntry, EntryWarning> {
        let Value::Object(fields) = item else {
            return Err(EntryWarning::new(
                index,
                WarningKind::MissingField,
                format!("entry is {}, not an object", type_name(item)),
            ));
        };

        let path = self.path_value(fields).ok_or_else(|| {
            EntryWarning::new(
                index,
                WarningKind::MissingField,
                format!("missing '{}' field", self.path_fields.join("' or '")),
            )
        })?;
        let Value::String(path) = path else {
            return Err(EntryWarning::new(
                index,
                WarningKind::InvalidFieldType,
                format!("path is {}, not a string", type_name(path)),
            ));
        };

        let content = fields.get(&self.content_field).ok_or_else(|| {
            EntryWarning::new(
                index,
                WarningKind::MissingField,
                format!("missing '{}' field", self.content_field),
            )
            .with_path(path.as_str())
        })?;
        let Value::String(content) = content else {
            return Err(EntryWarning::new(
                index,
                WarningKind::InvalidFieldType,
                format!("content is {}, not a string", type_name(content)),
            )
            .with_path(path.as_str()));
        };

        Ok(FileEntry::new(index, path.as_str(), content.as_str()))
    }

    fn path_value<'a>(&self, fields: &'a Map<String, Value>) -> Option<&'a Value> {
        self.path_fields.iter().find_map(|f| fields.get(f))
    }
}

/// Parse with the default field names
///
/// # Errors
/// See [`ManifestValidator::validate`]
pub fn validate(extracted: &str) -> Result<ManifestReport, ManifestError> {
    ManifestValidator::new().validate(extracted)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
