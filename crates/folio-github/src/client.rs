use std::fmt;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::GitHubError;
use crate::host::{BoxFuture, CodeHost};
use crate::types::{AuthenticatedUser, ContentEntry, RepoSummary};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const MAX_REPOS: u32 = 100;

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// # Panics
    ///
    /// Panics if the underlying `reqwest` client cannot be constructed (unreachable in practice).
    #[must_use]
    pub fn new(mut api_url: String, token: Option<String>) -> Self {
        while api_url.ends_with('/') {
            api_url.pop();
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client builder should not fail with timeout and user_agent");
        Self {
            client,
            api_url,
            token,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// GET `path` and decode the JSON body; `None` on 404.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, GitHubError> {
        let mut request = self
            .client
            .get(format!("{}{path}", self.api_url))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(GitHubError::Unauthorized);
        }
        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && rate_limit_exhausted(&response))
        {
            return Err(GitHubError::RateLimited);
        }

        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("GitHub API error {status} for {path}: {body}");
            return Err(GitHubError::Status {
                status: status.as_u16(),
                path: path.to_owned(),
            });
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn fetch_authenticated_user(&self) -> Result<String, GitHubError> {
        if self.token.is_none() {
            return Err(GitHubError::Unauthorized);
        }
        let user: AuthenticatedUser = self
            .get_json("/user")
            .await?
            .ok_or(GitHubError::Unauthorized)?;
        Ok(user.login)
    }

    async fn fetch_repos(&self, user: &str) -> Result<Vec<RepoSummary>, GitHubError> {
        let path = format!("/users/{user}/repos?sort=pushed&per_page={MAX_REPOS}&type=owner");
        let repos: Vec<RepoSummary> = self.get_json(&path).await?.unwrap_or_default();
        tracing::debug!(user, count = repos.len(), "listed repositories");
        Ok(repos)
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        file: &str,
    ) -> Result<Option<String>, GitHubError> {
        let path = format!("/repos/{owner}/{repo}/contents/{file}");
        let Some(entry) = self.get_json::<ContentEntry>(&path).await? else {
            return Ok(None);
        };
        if entry.kind != "file" {
            return Ok(None);
        }
        let Some(content) = entry.content else {
            return Ok(None);
        };
        if entry.encoding.as_deref().is_some_and(|e| e != "base64") {
            return Err(GitHubError::Content {
                path,
                reason: "unsupported encoding".into(),
            });
        }
        decode_content(&content)
            .map(Some)
            .map_err(|reason| GitHubError::Content { path, reason })
    }
}

fn rate_limit_exhausted(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0")
}

/// GitHub wraps base64 content at 60 columns.
fn decode_content(content: &str) -> Result<String, String> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

impl CodeHost for GitHubClient {
    fn authenticated_user(&self) -> BoxFuture<'_, Result<String, GitHubError>> {
        Box::pin(self.fetch_authenticated_user())
    }

    fn list_repos(&self, user: &str) -> BoxFuture<'_, Result<Vec<RepoSummary>, GitHubError>> {
        let user = user.to_owned();
        Box::pin(async move { self.fetch_repos(&user).await })
    }

    fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> BoxFuture<'_, Result<Option<String>, GitHubError>> {
        let (owner, repo, path) = (owner.to_owned(), repo.to_owned(), path.to_owned());
        Box::pin(async move { self.fetch_file(&owner, &repo, &path).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> GitHubClient {
        GitHubClient::new(server.uri(), token.map(str::to_owned))
    }

    #[test]
    fn debug_redacts_token() {
        let c = GitHubClient::new(DEFAULT_API_URL.into(), Some("ghp_secret".into()));
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("ghp_secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn decode_content_handles_wrapped_base64() {
        let encoded = "eyJkZXBlbmRlbmNpZXMiOnsi\nZXhwcmVzcyI6IjEuMCJ9fQ==\n";
        assert_eq!(
            decode_content(encoded).unwrap(),
            r#"{"dependencies":{"express":"1.0"}}"#
        );
    }

    #[tokio::test]
    async fn list_repos_sends_expected_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("sort", "pushed"))
            .and(query_param("per_page", "100"))
            .and(query_param("type", "owner"))
            .and(header("authorization", "Bearer tkn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "name": "api",
                    "description": "REST service",
                    "html_url": "https://github.com/octo/api",
                    "language": "TypeScript",
                    "topics": ["express"],
                    "pushed_at": "2026-01-02T03:04:05Z",
                    "stargazers_count": 4
                },
                {"name": "dotfiles", "description": null, "html_url": "https://github.com/octo/dotfiles", "language": null}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let repos = client(&server, Some("tkn")).list_repos("octo").await.unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "api");
        assert_eq!(repos[0].topics, vec!["express"]);
        assert!(repos[1].description.is_none());
        assert!(repos[1].topics.is_empty());
    }

    #[tokio::test]
    async fn get_file_decodes_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/api/contents/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "encoding": "base64",
                "content": "IyBhcGkK"
            })))
            .mount(&server)
            .await;

        let file = client(&server, None)
            .get_file("octo", "api", "README.md")
            .await
            .unwrap();
        assert_eq!(file.as_deref(), Some("# api\n"));
    }

    #[tokio::test]
    async fn get_file_missing_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let file = client(&server, None)
            .get_file("octo", "api", "package.json")
            .await
            .unwrap();
        assert!(file.is_none());
    }

    #[tokio::test]
    async fn get_file_directory_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "dir"})))
            .mount(&server)
            .await;

        let file = client(&server, None).get_file("o", "r", "docs").await.unwrap();
        assert!(file.is_none());
    }

    #[tokio::test]
    async fn server_error_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client(&server, None)
            .get_file("o", "r", "README.md")
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn exhausted_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "0"))
            .mount(&server)
            .await;

        let err = client(&server, None).list_repos("octo").await.unwrap_err();
        assert!(matches!(err, GitHubError::RateLimited));
    }

    #[tokio::test]
    async fn authenticated_user_returns_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octo"})))
            .mount(&server)
            .await;

        let login = client(&server, Some("tkn")).authenticated_user().await.unwrap();
        assert_eq!(login, "octo");
    }

    #[tokio::test]
    async fn authenticated_user_without_token_is_unauthorized() {
        let server = MockServer::start().await;
        let err = client(&server, None).authenticated_user().await.unwrap_err();
        assert!(matches!(err, GitHubError::Unauthorized));
    }
}
