//! Testing utilities for Synapse workspace
//!
//! Shared test helpers, fixtures, and in-memory collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use synapse_core::{
    BackendError, GenerationParams, GenerativeBackend, MaterializedSet, Pipeline, PublishError,
    Publisher,
};
use synapse_workspace::OutputLayout;
use tempfile::TempDir;

/// `{"files":[...]}` response for `(name, content)` pairs
pub fn files_response(files: &[(&str, &str)]) -> String {
    let entries: Vec<serde_json::Value> = files
        .iter()
        .map(|(name, content)| serde_json::json!({ "name": name, "content": content }))
        .collect();
    serde_json::json!({ "files": entries }).to_string()
}

/// Wrap a payload in a ```` ```json ```` fence with surrounding prose
pub fn fenced(payload: &str) -> String {
    format!("Here is your project:\n```json\n{payload}\n```\nLet me know if you need changes.")
}

/// Scratch directory with a pipeline writing into `project/` and `project.zip`
pub struct TestWorkspace {
    pub dir: TempDir,
    pub pipeline: Pipeline,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout =
            OutputLayout::new(dir.path().join("project"), dir.path().join("project.zip")).unwrap();
        Self {
            pipeline: Pipeline::new(layout),
            dir,
        }
    }

    pub fn output_root(&self) -> std::path::PathBuf {
        self.dir.path().join("project")
    }

    pub fn archive_path(&self) -> std::path::PathBuf {
        self.dir.path().join("project.zip")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend returning queued replies in order and recording every prompt
///
/// Once the queue is empty, every call fails with `BackendError::Unavailable`.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    #[must_use]
    pub fn fail(self, error: BackendError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Unavailable("no scripted reply".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Publisher keeping everything in memory
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub repositories: Mutex<Vec<String>>,
    pub files: Mutex<Vec<(String, String, String)>>,
    pub issues: Mutex<Vec<(String, String)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn ensure_repository(&self, name: &str, _description: &str) -> Result<String, PublishError> {
        self.repositories.lock().unwrap().push(name.to_string());
        Ok(format!("https://example.test/{name}"))
    }

    async fn push_files(&self, repo: &str, files: &MaterializedSet) -> Result<usize, PublishError> {
        let mut pushed = self.files.lock().unwrap();
        for (path, content) in files.iter() {
            pushed.push((repo.to_string(), path.as_key(), content.to_string()));
        }
        Ok(files.len())
    }

    async fn create_issues(&self, repo: &str, tasks: &[String]) -> Result<usize, PublishError> {
        let mut issues = self.issues.lock().unwrap();
        for task in tasks {
            issues.push((repo.to_string(), task.clone()));
        }
        Ok(tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_response_is_a_manifest() {
        let text = files_response(&[("a.txt", "hi")]);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["files"][0]["name"], "a.txt");
        assert_eq!(value["files"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn scripted_backend_replays_in_order() {
        let backend = ScriptedBackend::new().reply("one").reply("two");
        let params = GenerationParams::default();

        assert_eq!(backend.generate("p1", &params).await.unwrap(), "one");
        assert_eq!(backend.generate("p2", &params).await.unwrap(), "two");
        assert!(backend.generate("p3", &params).await.is_err());
        assert_eq!(backend.prompts(), vec!["p1", "p2", "p3"]);
    }
}
