//! Commits generated files to GitHub on fresh feature branches.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use crate::config::GithubConfig;
use crate::integrations::types::{json_body, send, IntegrationError};

const GITHUB: &str = "github";
const ACCEPT: &str = "application/vnd.github+json";

/// A file to add on a new branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommit {
    pub branch: String,
    pub path: String,
    pub message: String,
    pub content: String,
}

/// Source repository host.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Cut `commit.branch` from the base branch and add the file on it.
    /// Returns the browsable URL of the new branch.
    async fn commit_file(&self, commit: &FileCommit) -> Result<String, IntegrationError>;
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

/// GitHub REST v3 client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(client: reqwest::Client, config: GithubConfig) -> Self {
        Self { client, config }
    }

    fn credentials(&self) -> Result<(&str, &str), IntegrationError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("GITHUB_TOKEN"))?;
        let repo = self
            .config
            .repository
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("GITHUB_REPOSITORY"))?;
        Ok((token, repo))
    }

    fn request(&self, method: reqwest::Method, token: &str, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, ACCEPT)
    }
}

#[async_trait]
impl CodeHost for GithubClient {
    async fn commit_file(&self, commit: &FileCommit) -> Result<String, IntegrationError> {
        let (token, repo) = self.credentials()?;
        let api = format!(
            "{}/repos/{repo}",
            self.config.api_base_url.trim_end_matches('/')
        );

        let base = self.request(
            reqwest::Method::GET,
            token,
            format!("{api}/git/ref/heads/{}", self.config.base_branch),
        );
        let base: GitRef = json_body(GITHUB, send(GITHUB, base).await?).await?;

        let create_ref = self
            .request(reqwest::Method::POST, token, format!("{api}/git/refs"))
            .json(&json!({
                "ref": format!("refs/heads/{}", commit.branch),
                "sha": base.object.sha,
            }));
        send(GITHUB, create_ref).await?;

        let put_file = self
            .request(reqwest::Method::PUT, token, format!("{api}/contents/{}", commit.path))
            .json(&json!({
                "message": commit.message,
                "content": BASE64.encode(commit.content.as_bytes()),
                "branch": commit.branch,
            }));
        send(GITHUB, put_file).await?;

        Ok(format!("https://github.com/{repo}/tree/{}", commit.branch))
    }
}
