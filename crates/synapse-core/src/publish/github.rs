//! GitHub REST publisher

use super::Publisher;
use crate::config::{PublisherConfig, Secret};
use crate::error::PublishError;
use crate::redact::Redactor;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use synapse_manifest::{preview, MaterializedSet};
use tokio::sync::OnceCell;

const MAX_ERROR_BODY: usize = 300;

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct Repository {
    html_url: String,
}

#[derive(Deserialize)]
struct Contents {
    sha: String,
}

#[derive(Serialize)]
struct CreateRepository<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Serialize)]
struct CreateIssue<'a> {
    title: &'a str,
    body: String,
    labels: [&'a str; 1],
}

/// Publisher for GitHub (or a GitHub-compatible API)
#[derive(Debug)]
pub struct GitHubPublisher {
    client: reqwest::Client,
    api_base: Url,
    token: Secret,
    owner: OnceCell<String>,
    issue_label: String,
    private: bool,
    redactor: Redactor,
}

impl GitHubPublisher {
    /// Create publisher from configuration
    ///
    /// # Errors
    /// - `PublishError::NotConfigured` if no token is set or the API base is invalid
    /// - `PublishError::Http` if the HTTP client cannot be built
    pub fn new(config: &PublisherConfig) -> Result<Self, PublishError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_blank())
            .ok_or_else(|| PublishError::NotConfigured("GITHUB_TOKEN is not set".into()))?;
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| PublishError::NotConfigured(format!("api_base: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(PublishError::NotConfigured(format!(
                "api_base {api_base} cannot be a base URL"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("synapse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::Http(e.to_string()))?;

        let owner = OnceCell::new();
        if let Some(name) = config.owner.clone().filter(|o| !o.trim().is_empty()) {
            // Fresh cell, cannot already be set
            let _ = owner.set(name);
        }

        Ok(Self {
            client,
            api_base,
            redactor: Redactor::new().with_secret(token.expose()),
            token,
            owner,
            issue_label: config.issue_label.clone(),
            private: config.private,
        })
    }

    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PublishError> {
        request
            .send()
            .await
            .map_err(|e| PublishError::Http(self.redactor.redact(&e.without_url().to_string())))
    }

    async fn error_for(&self, operation: &str, response: Response) -> PublishError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return PublishError::Unauthorized {
                status: status.as_u16(),
            };
        }
        let body = response.text().await.unwrap_or_default();
        PublishError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            message: self.redactor.redact(preview(&body, MAX_ERROR_BODY)),
        }
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, PublishError> {
        response
            .json()
            .await
            .map_err(|e| PublishError::UnexpectedResponse(e.without_url().to_string()))
    }

    async fn owner(&self) -> Result<&str, PublishError> {
        self.owner
            .get_or_try_init(|| async {
                let response = self.send(self.request(Method::GET, self.url(["user"]))).await?;
                if !response.status().is_success() {
                    return Err(self.error_for("resolve user", response).await);
                }
                let user: User = Self::json(response).await?;
                tracing::debug!(owner = %user.login, "Resolved repository owner");
                Ok::<_, PublishError>(user.login)
            })
            .await
            .map(String::as_str)
    }

    async fn existing_sha(
        &self,
        owner: &str,
        repo: &str,
        path: &[String],
    ) -> Result<Option<String>, PublishError> {
        let url = self.url(
            ["repos", owner, repo, "contents"]
                .into_iter()
                .chain(path.iter().map(String::as_str)),
        );
        let response = self.send(self.request(Method::GET, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let contents: Contents = Self::json(response).await?;
                Ok(Some(contents.sha))
            }
            _ => Err(self.error_for("read contents", response).await),
        }
    }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    async fn ensure_repository(&self, name: &str, description: &str) -> Result<String, PublishError> {
        let owner = self.owner().await?;

        let response = self
            .send(self.request(Method::GET, self.url(["repos", owner, name])))
            .await?;
        if response.status().is_success() {
            let repo: Repository = Self::json(response).await?;
            tracing::info!(repo = name, "Using existing repository");
            return Ok(repo.html_url);
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(self.error_for("read repository", response).await);
        }

        tracing::info!(repo = name, "Repository not found, creating");
        let body = CreateRepository {
            name,
            description,
            private: self.private,
            auto_init: true,
        };
        let response = self
            .send(self.request(Method::POST, self.url(["user", "repos"])).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(self.error_for("create repository", response).await);
        }
        let repo: Repository = Self::json(response).await?;
        Ok(repo.html_url)
    }

    async fn push_files(&self, repo: &str, files: &MaterializedSet) -> Result<usize, PublishError> {
        let owner = self.owner().await?;
        let mut pushed = 0;

        for (path, content) in files.iter() {
            let key = path.as_key();
            let sha = self.existing_sha(owner, repo, path.segments()).await?;
            let body = PutContents {
                message: if sha.is_some() {
                    format!("Update {key}")
                } else {
                    format!("Add {key}")
                },
                content: STANDARD.encode(content.as_bytes()),
                sha: sha.as_deref(),
            };

            let url = self.url(
                ["repos", owner, repo, "contents"]
                    .into_iter()
                    .chain(path.segments().iter().map(String::as_str)),
            );
            let response = self.send(self.request(Method::PUT, url).json(&body)).await?;
            if !response.status().is_success() {
                return Err(self.error_for(&format!("push {key}"), response).await);
            }
            tracing::debug!(path = %key, updated = sha.is_some(), "Pushed file");
            pushed += 1;
        }

        tracing::info!(repo, files = pushed, "Pushed files");
        Ok(pushed)
    }

    async fn create_issues(&self, repo: &str, tasks: &[String]) -> Result<usize, PublishError> {
        let owner = self.owner().await?;
        let url = self.url(["repos", owner, repo, "issues"]);

        for task in tasks {
            let body = CreateIssue {
                title: task,
                body: format!("Task from Synapse:\n{task}"),
                labels: [self.issue_label.as_str()],
            };
            let response = self
                .send(self.request(Method::POST, url.clone()).json(&body))
                .await?;
            if !response.status().is_success() {
                return Err(self.error_for("create issue", response).await);
            }
        }

        tracing::info!(repo, issues = tasks.len(), "Created issues");
        Ok(tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher(api_base: &str) -> GitHubPublisher {
        GitHubPublisher::new(
            &PublisherConfig::default()
                .with_api_base(api_base)
                .with_token("ghp_test_token"),
        )
        .unwrap()
    }

    #[test]
    fn requires_token() {
        let result = GitHubPublisher::new(&PublisherConfig::default());
        assert!(matches!(result, Err(PublishError::NotConfigured(_))));
    }

    #[test]
    fn url_segments_are_escaped() {
        let publisher = publisher("https://api.github.com");
        let url = publisher.url(["repos", "me", "demo", "contents", "my file.txt"]);
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/me/demo/contents/my%20file.txt"
        );
    }

    #[test]
    fn url_keeps_base_path() {
        let publisher = publisher("http://localhost:8080/api/v3/");
        assert_eq!(
            publisher.url(["user"]).as_str(),
            "http://localhost:8080/api/v3/user"
        );
    }

    #[test]
    fn owner_from_config_is_used() {
        let publisher = GitHubPublisher::new(
            &PublisherConfig::default()
                .with_token("ghp_test_token")
                .with_owner("octocat"),
        )
        .unwrap();
        assert_eq!(publisher.owner.get().map(String::as_str), Some("octocat"));
    }
}
