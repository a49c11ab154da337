//! Task Planner
//!
//! Breaks a free-text requirement into a technical stack and a numbered list
//! of development goals using two backend requests:
//!
//! 1. **Tech stack**: a JSON object `{language, frameworks, app_type}`
//! 2. **Goals**: a numbered list, renumbered `1. ..`, `2. ..` on parse
//!
//! Planning never fails once the requirement is non-empty. A backend or parse
//! failure falls back to the default stack and goals.

use crate::backend::{GenerationParams, GenerativeBackend};
use crate::error::PlannerError;
use crate::prompt::{goals_prompt, tech_stack_prompt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use synapse_manifest::{extract_json, preview};

/// Goals used when none can be obtained from the backend
pub const DEFAULT_GOALS: [&str; 10] = [
    "Define project requirements and scope.",
    "Set up the development environment and project structure.",
    "Implement core features based on requirements.",
    "Develop necessary utility functions or modules.",
    "Integrate external services or APIs if needed.",
    "Implement user interface (if applicable).",
    "Write unit and integration tests.",
    "Add comprehensive error handling and logging.",
    "Create documentation (README, code comments).",
    "Prepare for deployment.",
];

/// Technical stack of a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    /// Main programming language
    pub language: String,
    /// Key frameworks or libraries
    pub frameworks: Vec<String>,
    /// Kind of application
    pub app_type: String,
}

impl Default for TechStack {
    fn default() -> Self {
        Self {
            language: "Unknown".to_string(),
            frameworks: Vec::new(),
            app_type: "Unknown".to_string(),
        }
    }
}

/// Result of planning a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskBreakdown {
    /// Numbered goals, `"1. ..."` first
    pub goals: Vec<String>,
    /// Detected stack, or the default
    pub tech_stack: TechStack,
}

/// Plans requirements with a generative backend
#[derive(Clone)]
pub struct TaskPlanner {
    backend: Arc<dyn GenerativeBackend>,
    params: GenerationParams,
}

impl std::fmt::Debug for TaskPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPlanner")
            .field("backend", &self.backend.name())
            .field("params", &self.params)
            .finish()
    }
}

impl TaskPlanner {
    /// Create planner using planning parameters
    #[must_use]
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            params: GenerationParams::planning(),
        }
    }

    /// With request parameters
    #[inline]
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Break a requirement into a tech stack and goals
    ///
    /// # Errors
    /// Returns `PlannerError::EmptyRequirement` for a blank requirement
    pub async fn break_down(&self, requirement: &str) -> Result<TaskBreakdown, PlannerError> {
        let requirement = requirement.trim();
        if requirement.is_empty() {
            return Err(PlannerError::EmptyRequirement);
        }

        tracing::info!(backend = self.backend.name(), "Requesting tech stack analysis");
        let tech_stack = match self
            .backend
            .generate(&tech_stack_prompt(requirement), &self.params)
            .await
        {
            Ok(text) => parse_tech_stack(&text).unwrap_or_else(|| {
                tracing::warn!(
                    response = %preview(&text, 200),
                    "Could not parse tech stack, using default"
                );
                TechStack::default()
            }),
            Err(e) => {
                tracing::error!(error = %e, "Tech stack request failed, using defaults");
                return Ok(TaskBreakdown {
                    goals: default_goals(),
                    tech_stack: TechStack::default(),
                });
            }
        };

        tracing::info!(language = %tech_stack.language, "Requesting goal generation");
        let goals = match self
            .backend
            .generate(&goals_prompt(requirement, &tech_stack), &self.params)
            .await
        {
            Ok(text) => {
                let goals = parse_goals(&text);
                if goals.is_empty() {
                    tracing::warn!("Could not parse numbered goals, using defaults");
                    default_goals()
                } else {
                    tracing::info!(count = goals.len(), "Parsed goals");
                    goals
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Goal request failed, using defaults");
                default_goals()
            }
        };

        Ok(TaskBreakdown { goals, tech_stack })
    }
}

/// Parse a tech stack from a possibly fenced JSON response
///
/// All three fields must be present with the right types.
#[must_use]
pub fn parse_tech_stack(text: &str) -> Option<TechStack> {
    serde_json::from_str(extract_json(text)).ok()
}

/// Extract numbered lines (`3. Do x`) and renumber them from 1
#[must_use]
pub fn parse_goals(text: &str) -> Vec<String> {
    static NUMBERED: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(numbered) = NUMBERED
        .get_or_init(|| Regex::new(r"^\d+\.\s+(.*)").ok())
        .as_ref()
    else {
        return Vec::new();
    };

    text.lines()
        .filter_map(|line| numbered.captures(line.trim()))
        .filter_map(|caps| caps.get(1))
        .map(|goal| goal.as_str().trim())
        .filter(|goal| !goal.is_empty())
        .enumerate()
        .map(|(i, goal)| format!("{}. {goal}", i + 1))
        .collect()
}

/// The ten default goals, numbered
#[must_use]
pub fn default_goals() -> Vec<String> {
    DEFAULT_GOALS
        .iter()
        .enumerate()
        .map(|(i, goal)| format!("{}. {goal}", i + 1))
        .collect()
}
