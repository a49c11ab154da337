//! Synapse Workspace
//!
//! The only part of the system that writes generated content to disk.
//!
//! # Core Operations
//!
//! - **Reset**: [`OutputLayout::reset`] wipes the output root and stale archive
//! - **Plan**: [`plan_writes`] resolves duplicate and conflicting paths
//! - **Materialize**: [`Materializer`] writes files, isolating per-file failures
//! - **Archive**: [`Archiver`] zips the [`MaterializedSet`](synapse_manifest::MaterializedSet)
//!
//! # Architecture
//!
//! ```text
//! SanitizedEntry* → plan_writes → Materializer → MaterializedSet → Archiver → ArchiveHandle
//!                                      ↓
//!                                 output root
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod archive;
pub mod error;
pub mod layout;
pub mod materializer;
pub mod plan;

// Re-exports for convenience
pub use archive::{ArchiveHandle, Archiver};
pub use error::{ArchiveError, WorkspaceError};
pub use layout::OutputLayout;
pub use materializer::{Materialization, Materializer};
pub use plan::{plan_writes, WritePlan};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
