//! GitHub REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{StatusCode, Url};
use tracing::{debug, info, instrument};

use crate::errors::GitHubError;
use crate::identity::UserLookup;

/// Longest login GitHub hands out.
const MAX_LOGIN_LEN: usize = 39;

/// Whether `login` can name a GitHub account: ASCII letters, digits and
/// hyphens, not starting with a hyphen, at most 39 characters.
pub fn is_github_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= MAX_LOGIN_LEN
        && !login.starts_with('-')
        && login.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Asynchronous GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    base: Url,
    token: String,
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&api_url).map_err(|e| GitHubError::InvalidApiUrl {
            url: api_url.clone(),
            detail: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(GitHubError::InvalidApiUrl {
                url: api_url,
                detail: "URL cannot carry a path".into(),
            });
        }
        let token = token.into();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("ownerscount/0.1"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(api_url = %api_url, "created GitHubClient");
        Ok(Self {
            http,
            api_url,
            base,
            token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `{api_url}/users/{login}`, with `login` percent-encoded as a single
    /// path segment.
    pub fn user_url(&self, login: &str) -> Result<Url, GitHubError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidApiUrl {
                url: self.api_url.clone(),
                detail: "URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(["users", login]);
        Ok(url)
    }

    /// Check whether `login` is an existing GitHub account.
    ///
    /// `Ok(true)` on a success status, `Ok(false)` on 404 or when `login`
    /// is not a well-formed GitHub login (no request is made). Every other
    /// status or transport failure is an error.
    #[instrument(skip(self))]
    pub async fn user_exists(&self, login: &str) -> Result<bool, GitHubError> {
        if !is_github_login(login) {
            debug!(login, "not a GitHub login, skipping lookup");
            return Ok(false);
        }
        let url = self.user_url(login)?;
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(login, "user not found");
            return Ok(false);
        }
        self.check_response(&resp)?;
        debug!(login, "user exists");
        Ok(true)
    }

    fn check_response(&self, resp: &reqwest::Response) -> Result<(), GitHubError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(GitHubError::AuthenticationFailed(format!("HTTP {}", status)));
        }
        let remaining = resp
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());
        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && remaining == Some("0"))
        {
            let reset = resp
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            return Err(GitHubError::RateLimited { reset_at: reset });
        }
        if status == StatusCode::FORBIDDEN {
            return Err(GitHubError::AuthenticationFailed(format!("HTTP {}", status)));
        }
        Err(GitHubError::ApiError {
            status: status.as_u16(),
            body: format!("HTTP {}", status),
        })
    }
}

#[async_trait]
impl UserLookup for GitHubClient {
    async fn user_exists(&self, login: &str) -> Result<bool, GitHubError> {
        GitHubClient::user_exists(self, login).await
    }
}
