//! Synapse Core
//!
//! Turns requirements into generated projects.
//!
//! # Core Components
//!
//! - **Planner**: [`TaskPlanner`] breaks a requirement into a tech stack and goals
//! - **Generator**: [`ProjectGenerator`] asks a [`GenerativeBackend`] for a project
//! - **Pipeline**: [`Pipeline`] extracts, validates, writes and archives a response
//! - **Publisher**: [`Publisher`] pushes the result to a remote repository
//!
//! # Architecture
//!
//! ```text
//! requirement → TaskPlanner → goals → ProjectGenerator → backend text
//!                                                           ↓
//!                         Pipeline: extract → validate → sanitize/write → archive
//!                                                           ↓
//!                                                    PipelineResult → Publisher
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use synapse_core::{GeminiBackend, Pipeline, ProjectGenerator, SynapseConfig};
//!
//! let config = SynapseConfig::load(None)?;
//! let backend = Arc::new(GeminiBackend::new(&config.backend)?);
//! let generator = ProjectGenerator::new(backend, Pipeline::from_config(&config.output)?);
//!
//! let result = generator.generate(&["1. Build a todo API".into()], Some("web")).await;
//! println!("{} files", result.materialized.len());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod backend;
pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod planner;
pub mod prompt;
pub mod publish;
pub mod redact;

// Re-exports for convenience
pub use backend::{GeminiBackend, GenerationParams, GenerativeBackend};
pub use config::{BackendConfig, OutputConfig, PublisherConfig, Secret, SynapseConfig};
pub use error::{BackendError, ConfigError, ErrorKind, PipelineError, PlannerError, PublishError};
pub use generator::{ProjectGenerator, DEFAULT_PROJECT_TYPE};
pub use pipeline::{GeneratedProject, Pipeline, PipelineFailure, PipelineResult, RunId, Stage};
pub use planner::{TaskBreakdown, TaskPlanner, TechStack};
pub use publish::{publish_project, GitHubPublisher, Publisher};
pub use redact::Redactor;

pub use synapse_manifest::{EntryWarning, MaterializedSet, WarningKind};
pub use synapse_workspace::{ArchiveHandle, OutputLayout};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
