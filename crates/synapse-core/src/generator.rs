//! Project Generator
//!
//! Asks the backend for a whole project and runs the answer through the
//! [`Pipeline`].

use crate::backend::{GenerationParams, GenerativeBackend};
use crate::error::PipelineError;
use crate::pipeline::{Pipeline, PipelineResult, RunId, Stage};
use crate::prompt::project_prompt;
use crate::redact::Redactor;
use std::sync::Arc;

/// Project type used when the caller does not name one
pub const DEFAULT_PROJECT_TYPE: &str = "generic";

/// Generates projects from task lists
#[derive(Clone)]
pub struct ProjectGenerator {
    backend: Arc<dyn GenerativeBackend>,
    pipeline: Pipeline,
    params: GenerationParams,
    redactor: Redactor,
}

impl std::fmt::Debug for ProjectGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectGenerator")
            .field("backend", &self.backend.name())
            .field("pipeline", &self.pipeline)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl ProjectGenerator {
    /// Create generator
    #[must_use]
    pub fn new(backend: Arc<dyn GenerativeBackend>, pipeline: Pipeline) -> Self {
        Self {
            backend,
            pipeline,
            params: GenerationParams::project(),
            redactor: Redactor::new(),
        }
    }

    /// With request parameters
    #[inline]
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// With redactor applied to backend error messages
    #[inline]
    #[must_use]
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Pipeline used for responses
    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Generate a project for `tasks`
    ///
    /// `project_type` defaults to [`DEFAULT_PROJECT_TYPE`]. A backend failure
    /// ends the run in the `Requesting` stage without touching the output root.
    pub async fn generate(&self, tasks: &[String], project_type: Option<&str>) -> PipelineResult {
        let run_id = RunId::new();
        let tasks: Vec<String> = tasks
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tasks.is_empty() {
            return PipelineResult::failed(
                run_id,
                Stage::Idle,
                PipelineError::InvalidInput("no tasks provided".into()),
            );
        }

        let project_type = project_type
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROJECT_TYPE);
        tracing::info!(
            run_id = %run_id,
            backend = self.backend.name(),
            project_type,
            tasks = tasks.len(),
            "Requesting project generation"
        );

        let prompt = project_prompt(&tasks, project_type);
        match self.backend.generate(&prompt, &self.params).await {
            Ok(text) => self.pipeline.run_with_id(run_id, &text).await,
            Err(e) => {
                let message = self.redactor.redact(&e.to_string());
                tracing::error!(run_id = %run_id, error = %message, "Backend request failed");
                PipelineResult::failed(
                    run_id,
                    Stage::Requesting,
                    PipelineError::BackendUnavailable(message),
                )
            }
        }
    }
}
