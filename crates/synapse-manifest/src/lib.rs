//! Synapse Manifest
//!
//! Typed file manifests parsed from untrusted generative-model output.
//!
//! # Core Concepts
//!
//! - [`extract_json`]: pulls a JSON payload out of a fenced or prose-wrapped response
//! - [`ManifestValidator`]: turns JSON into a [`Manifest`] of [`FileEntry`] values,
//!   skipping malformed entries with an [`EntryWarning`]
//! - [`PathSanitizer`]: maps declared paths onto [`RelativePath`]s that stay
//!   strictly inside an output root
//! - [`MaterializedSet`]: ordered record of files actually written
//!
//! # Example
//!
//! ```rust,ignore
//! use synapse_manifest::{extract_json, validate, PathSanitizer};
//!
//! let report = validate(extract_json(raw_response))?;
//! let sanitizer = PathSanitizer::new("generated_project")?;
//! let sanitized = sanitizer.sanitize_manifest(&report.manifest);
//! println!("{} safe entries", sanitized.entries.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod entry;
mod extract;
mod hash;
mod materialized;
mod path;
mod validate;
mod warning;

// Re-exports
pub use entry::{FileEntry, Manifest, SanitizedEntry};
pub use extract::{extract_json, preview};
pub use hash::{ContentHash, HashError};
pub use materialized::MaterializedSet;
pub use path::{is_strict_descendant, PathError, PathSanitizer, RelativePath, SanitizedManifest};
pub use validate::{validate, ManifestError, ManifestReport, ManifestValidator};
pub use warning::{EntryWarning, WarningKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
