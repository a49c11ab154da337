//! Pipeline Orchestrator
//!
//! Drives one run from raw backend text to an archive:
//!
//! ```text
//! Idle → Preparing → Extracting → Validating → Writing → Archiving → Done
//! ```
//!
//! - **Preparing**: wipe the output root and stale archive
//! - **Extracting**: pull the JSON payload out of the response
//! - **Validating**: parse the manifest, skipping malformed entries
//! - **Writing**: sanitize paths and materialize files; per-entry failures
//!   accumulate as warnings
//! - **Archiving**: zip the materialized set
//!
//! Any stage failure other than per-entry warnings ends the run with a
//! stage-tagged error and no archive.

use crate::config::OutputConfig;
use crate::error::{ErrorKind, PipelineError};
use serde::{Deserialize, Serialize};
use synapse_manifest::{extract_json, EntryWarning, ManifestValidator, MaterializedSet};
use synapse_workspace::{ArchiveHandle, Archiver, Materializer, OutputLayout};
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Not started
    Idle,
    /// Waiting on the generative backend
    Requesting,
    /// Resetting the output root
    Preparing,
    /// Extracting JSON from the response
    Extracting,
    /// Validating the manifest
    Validating,
    /// Sanitizing paths and writing files
    Writing,
    /// Creating the archive
    Archiving,
    /// Finished
    Done,
}

impl Stage {
    /// Stage name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Preparing => "preparing",
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::Writing => "writing",
            Self::Archiving => "archiving",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal error with the stage it happened in
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    /// Stage that failed
    pub stage: Stage,
    /// Underlying error
    #[source]
    pub error: PipelineError,
}

impl PipelineFailure {
    /// Failure class
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Outcome of one run
///
/// On failure `archive` is always `None`. `materialized` still reports files
/// that reached disk before the failing stage.
#[derive(Debug)]
pub struct PipelineResult {
    /// Run identifier
    pub run_id: RunId,
    /// Archive, present only on success with at least one file
    pub archive: Option<ArchiveHandle>,
    /// Files on disk, in manifest order
    pub materialized: MaterializedSet,
    /// Entries dropped along the way, ordered by entry index
    pub warnings: Vec<EntryWarning>,
    /// Fatal error, if any
    pub failure: Option<PipelineFailure>,
    /// Stages entered, in order
    pub stages: Vec<Stage>,
}

impl PipelineResult {
    /// Result that failed before any file work
    #[must_use]
    pub fn failed(run_id: RunId, stage: Stage, error: PipelineError) -> Self {
        let mut stages = vec![Stage::Idle];
        if stage != Stage::Idle {
            stages.push(stage);
        }
        stages.push(Stage::Done);
        Self {
            run_id,
            archive: None,
            materialized: MaterializedSet::new(),
            warnings: Vec::new(),
            failure: Some(PipelineFailure { stage, error }),
            stages,
        }
    }

    /// Whether the run succeeded
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// Failure class, if failed
    #[inline]
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure.as_ref().map(PipelineFailure::kind)
    }

    /// Stage-tagged error message, if failed
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }

    /// Some entries were dropped but the run still produced files
    #[inline]
    #[must_use]
    pub fn has_partial_failure(&self) -> bool {
        self.success() && !self.warnings.is_empty()
    }

    /// Convert into a `Result`
    ///
    /// # Errors
    /// Returns the `PipelineFailure` of a failed run
    pub fn into_result(self) -> Result<GeneratedProject, PipelineFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(GeneratedProject {
                run_id: self.run_id,
                archive: self.archive,
                materialized: self.materialized,
                warnings: self.warnings,
            }),
        }
    }
}

/// Successful run
#[derive(Debug)]
pub struct GeneratedProject {
    /// Run identifier
    pub run_id: RunId,
    /// Archive of the materialized files
    pub archive: Option<ArchiveHandle>,
    /// Files on disk
    pub materialized: MaterializedSet,
    /// Non-fatal warnings
    pub warnings: Vec<EntryWarning>,
}

/// Runs raw responses through extract, validate, write and archive
#[derive(Debug, Clone)]
pub struct Pipeline {
    layout: OutputLayout,
    validator: ManifestValidator,
    materializer: Materializer,
    archiver: Archiver,
}

impl Pipeline {
    /// Create pipeline for a layout
    #[must_use]
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            validator: ManifestValidator::new(),
            materializer: Materializer::new(),
            archiver: Archiver::new(),
        }
    }

    /// Create pipeline from output configuration
    ///
    /// # Errors
    /// Returns `PipelineError::Workspace` if the layout is unsafe
    pub fn from_config(config: &OutputConfig) -> Result<Self, PipelineError> {
        let layout = OutputLayout::new(&config.output_root, &config.archive_path)?;
        Ok(Self::new(layout)
            .with_materializer(Materializer::new().with_concurrency(config.write_concurrency)))
    }

    /// With validator
    #[inline]
    #[must_use]
    pub fn with_validator(mut self, validator: ManifestValidator) -> Self {
        self.validator = validator;
        self
    }

    /// With materializer
    #[inline]
    #[must_use]
    pub fn with_materializer(mut self, materializer: Materializer) -> Self {
        self.materializer = materializer;
        self
    }

    /// Output layout
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run the pipeline on raw response text
    pub async fn run(&self, raw: &str) -> PipelineResult {
        self.run_with_id(RunId::new(), raw).await
    }

    /// Run the pipeline under a caller-chosen run ID
    pub async fn run_with_id(&self, run_id: RunId, raw: &str) -> PipelineResult {
        let mut run = Run::new(run_id);
        tracing::info!(run_id = %run_id, response_chars = raw.chars().count(), "Starting pipeline run");

        run.enter(Stage::Preparing);
        let sanitizer = match self.layout.reset().await {
            Ok(sanitizer) => sanitizer,
            Err(e) => return run.fail(e.into()),
        };

        run.enter(Stage::Extracting);
        let extracted = extract_json(raw);

        run.enter(Stage::Validating);
        let report = match self.validator.validate(extracted) {
            Ok(report) => report,
            Err(e) => return run.fail(e.into()),
        };
        run.warnings.extend(report.warnings);
        tracing::info!(
            entries = report.manifest.len(),
            skipped = run.warnings.len(),
            "Validated manifest"
        );

        run.enter(Stage::Writing);
        let sanitized = sanitizer.sanitize_manifest(&report.manifest);
        run.warnings.extend(sanitized.warnings);
        let written = self
            .materializer
            .materialize(&sanitizer, sanitized.entries)
            .await;
        run.warnings.extend(written.warnings);
        run.warnings.sort_by_key(|w| w.index);
        run.materialized = written.set;

        if run.materialized.is_empty() {
            let dropped = run.warnings.len();
            return run.fail(PipelineError::NoFilesGenerated { dropped });
        }

        run.enter(Stage::Archiving);
        match self
            .archiver
            .archive(&run.materialized, self.layout.archive_path())
            .await
        {
            Ok(archive) => run.finish(archive),
            Err(e) => run.fail(e.into()),
        }
    }
}

/// In-progress run state
struct Run {
    run_id: RunId,
    stage: Stage,
    stages: Vec<Stage>,
    materialized: MaterializedSet,
    warnings: Vec<EntryWarning>,
}

impl Run {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            stage: Stage::Idle,
            stages: vec![Stage::Idle],
            materialized: MaterializedSet::new(),
            warnings: Vec::new(),
        }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(run_id = %self.run_id, stage = %stage, "Entering stage");
        self.stage = stage;
        self.stages.push(stage);
    }

    fn fail(mut self, error: PipelineError) -> PipelineResult {
        let failure = PipelineFailure {
            stage: self.stage,
            error,
        };
        tracing::error!(run_id = %self.run_id, error = %failure, "Pipeline run failed");
        self.stages.push(Stage::Done);
        PipelineResult {
            run_id: self.run_id,
            archive: None,
            materialized: self.materialized,
            warnings: self.warnings,
            failure: Some(failure),
            stages: self.stages,
        }
    }

    fn finish(mut self, archive: Option<ArchiveHandle>) -> PipelineResult {
        tracing::info!(
            run_id = %self.run_id,
            files = self.materialized.len(),
            warnings = self.warnings.len(),
            "Pipeline run complete"
        );
        self.stages.push(Stage::Done);
        PipelineResult {
            run_id: self.run_id,
            archive,
            materialized: self.materialized,
            warnings: self.warnings,
            failure: None,
            stages: self.stages,
        }
    }
}
