//! Downloading repository archives from GitHub.
//!
//! Resolves repository, branch and pull request URLs to a branch archive,
//! downloads it into a temporary file and hands back its path. The file is
//! deleted when the returned [`DownloadedArchive`] is dropped unless it is
//! explicitly kept.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const API_BASE: &str = "https://api.github.com";
const ARCHIVE_BASE: &str = "https://github.com";
const USER_AGENT: &str = concat!("zip-linearizer/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors while resolving or downloading a GitHub repository.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("URL is not a GitHub repository: {0}")]
    InvalidUrl(String),

    #[error("Invalid Pull Request number: {0}")]
    InvalidPullRequest(String),

    #[error("Pull Request number not specified in URL: {0}")]
    MissingPullRequestNumber(String),

    #[error("Failed to determine branch for PR #{0}")]
    MissingHeadBranch(u64),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("Failed to save archive: {0}")]
    Io(#[from] io::Error),
}

/// A repository reference parsed from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    pub pull_request: Option<u64>,
}

/// Source branch of a pull request, possibly living in a fork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestInfo {
    pub head_branch: String,
    pub head_owner: String,
    pub head_repo: String,
    pub base_branch: Option<String>,
}

/// Parse a GitHub repository, branch, archive or pull request URL.
///
/// Accepted shapes:
/// - `https://github.com/owner/repo` (optionally `.git` or a trailing `/`)
/// - `https://github.com/owner/repo/tree/<branch>`
/// - `https://github.com/owner/repo/pull/<n>` (optionally `/files`)
/// - `https://github.com/owner/repo/archive/refs/heads/<branch>.zip`
pub fn parse_repository_url(url: &str) -> Result<RepoRef, GitHubError> {
    let mut normalized = url.trim().trim_end_matches('/');
    normalized = normalized.strip_suffix(".git").unwrap_or(normalized);
    normalized = normalized.strip_suffix("/files").unwrap_or(normalized);

    let with_scheme = if normalized.contains("://") {
        normalized.to_string()
    } else {
        format!("https://{}", normalized)
    };

    let parsed = Url::parse(&with_scheme).map_err(|_| GitHubError::InvalidUrl(url.to_string()))?;
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    if !host.contains("github.com") {
        return Err(GitHubError::InvalidUrl(url.to_string()));
    }

    let parts: Vec<&str> = parsed.path().split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return Err(GitHubError::InvalidUrl(url.to_string()));
    }

    let mut repo_ref = RepoRef {
        owner: parts[0].to_string(),
        repo: parts[1].to_string(),
        branch: None,
        pull_request: None,
    };

    match parts.get(2).copied() {
        Some("pull") => {
            let number = parts
                .get(3)
                .ok_or_else(|| GitHubError::MissingPullRequestNumber(url.to_string()))?;
            let number = number
                .parse()
                .map_err(|_| GitHubError::InvalidPullRequest(number.to_string()))?;
            repo_ref.pull_request = Some(number);
        }
        Some("tree") if parts.len() > 3 => {
            repo_ref.branch = Some(parts[3..].join("/"));
        }
        Some("archive") => {
            repo_ref.branch = parts
                .last()
                .and_then(|name| name.strip_suffix(".zip"))
                .filter(|stem| {
                    !stem.is_empty() && stem.chars().all(|c| c.is_alphanumeric() || c == '_')
                })
                .map(str::to_string);
        }
        _ => {}
    }

    Ok(repo_ref)
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PullRequestResponse {
    #[serde(default)]
    head: HeadResponse,
    base: Option<BranchResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct HeadResponse {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    repo: Option<HeadRepoResponse>,
}

#[derive(Debug, Deserialize)]
struct HeadRepoResponse {
    name: Option<String>,
    owner: Option<OwnerResponse>,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

impl RepositoryResponse {
    fn default_branch(self) -> String {
        self.default_branch.unwrap_or_else(|| "main".to_string())
    }
}

impl PullRequestResponse {
    /// Missing head repository (a deleted fork) falls back to the base one.
    fn into_info(self, owner: &str, repo: &str, number: u64) -> Result<PullRequestInfo, GitHubError> {
        let head_branch = self
            .head
            .git_ref
            .ok_or(GitHubError::MissingHeadBranch(number))?;
        let head_repo = self.head.repo;

        Ok(PullRequestInfo {
            head_branch,
            head_owner: head_repo
                .as_ref()
                .and_then(|r| r.owner.as_ref())
                .and_then(|o| o.login.clone())
                .unwrap_or_else(|| owner.to_string()),
            head_repo: head_repo
                .and_then(|r| r.name)
                .unwrap_or_else(|| repo.to_string()),
            base_branch: self.base.and_then(|b| b.git_ref),
        })
    }
}

/// A downloaded archive living in a temporary file.
#[derive(Debug)]
pub struct DownloadedArchive {
    path: TempPath,
    stem: String,
}

impl DownloadedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<owner>-<repo>-<branch>`, usable as a file name.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Keep the file on disk and return its final path.
    pub fn keep(self) -> io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }

    /// Delete the file now, reporting failures instead of ignoring them.
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Minimal GitHub REST and archive client.
pub struct GitHubClient {
    client: Client,
    api_base: String,
    archive_base: String,
}

impl GitHubClient {
    pub fn new() -> Result<Self, GitHubError> {
        Self::with_base_urls(API_BASE, ARCHIVE_BASE)
    }

    /// Point the client at different API and archive hosts.
    pub fn with_base_urls(api_base: &str, archive_base: &str) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| GitHubError::Http {
                url: api_base.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            archive_base: archive_base.trim_end_matches('/').to_string(),
        })
    }

    fn archive_url(&self, owner: &str, repo: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            self.archive_base, owner, repo, branch
        )
    }

    async fn get(&self, url: &str) -> Result<Response, GitHubError> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| GitHubError::Http {
                url: url.to_string(),
                source,
            })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GitHubError> {
        self.get(url)
            .await?
            .json()
            .await
            .map_err(|source| GitHubError::Http {
                url: url.to_string(),
                source,
            })
    }

    /// Default branch of a repository, `main` when the API omits it.
    pub async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, GitHubError> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, repo);
        debug!(%url, "Requesting repository information");

        let branch = self.get_json::<RepositoryResponse>(&url).await?.default_branch();
        info!(%branch, "Repository default branch");
        Ok(branch)
    }

    /// Head branch and repository of a pull request.
    pub async fn pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestInfo, GitHubError> {
        let url = format!("{}/repos/{}/{}/pulls/{}", self.api_base, owner, repo, number);
        debug!(%url, "Requesting pull request information");

        let info = self
            .get_json::<PullRequestResponse>(&url)
            .await?
            .into_info(owner, repo, number)?;
        info!(
            pr = number,
            branch = %info.head_branch,
            repository = %format!("{}/{}", info.head_owner, info.head_repo),
            "Resolved pull request source branch"
        );
        Ok(info)
    }

    /// Download a branch archive, resolving the default branch when `branch`
    /// is `None`.
    pub async fn download_repository(
        &self,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
    ) -> Result<DownloadedArchive, GitHubError> {
        let branch = match branch {
            Some(branch) => branch.to_string(),
            None => self.default_branch(owner, repo).await?,
        };

        let url = self.archive_url(owner, repo, &branch);
        info!(%url, "Downloading repository archive");

        let mut response = self.get(&url).await?;

        let stem = format!("{}-{}-{}", owner, repo, branch.replace('/', "-"));
        let temp = tempfile::Builder::new()
            .prefix(&format!("{}-", stem))
            .suffix(".zip")
            .tempfile()?;
        let mut file = tokio::fs::File::from_std(temp.reopen()?);

        while let Some(chunk) = response.chunk().await.map_err(|source| GitHubError::Http {
            url: url.clone(),
            source,
        })? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        let path = temp.into_temp_path();
        info!(path = %path.display(), "Archive downloaded");
        Ok(DownloadedArchive { path, stem })
    }

    /// Resolve any supported GitHub URL and download its archive.
    pub async fn download_from_url(&self, url: &str) -> Result<DownloadedArchive, GitHubError> {
        let repo_ref = parse_repository_url(url)?;

        if let Some(number) = repo_ref.pull_request {
            info!(pr = number, "Pull Request detected");
            let pr = self.pull_request(&repo_ref.owner, &repo_ref.repo, number).await?;
            return self
                .download_repository(&pr.head_owner, &pr.head_repo, Some(&pr.head_branch))
                .await;
        }

        self.download_repository(&repo_ref.owner, &repo_ref.repo, repo_ref.branch.as_deref())
            .await
    }
}
