use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GitHubConfig;
use crate::error::{RepodocError, Result};
use crate::identifier::RepositoryIdentifier;
use crate::types::{FileEntry, RepositoryMetadata, TreeListing};

/// The three read-only calls the analysis needs from a repository host.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    async fn fetch_metadata(&self, repo: &RepositoryIdentifier) -> Result<RepositoryMetadata>;

    /// Recursive listing of `branch`, reduced to blob entries.
    async fn fetch_tree(&self, repo: &RepositoryIdentifier, branch: &str) -> Result<TreeListing>;

    /// Decoded text of one file.
    async fn fetch_file_content(&self, repo: &RepositoryIdentifier, path: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| RepodocError::Other(format!("invalid user agent: {}", e)))?,
        );
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("token {}", token))
                    .map_err(|e| RepodocError::Other(format!("invalid GitHub token: {}", e)))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn fetch_metadata(&self, repo: &RepositoryIdentifier) -> Result<RepositoryMetadata> {
        let url = format!("{}/repos/{}", self.api_url, repo);
        debug!("Fetching repository metadata from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            warn!(repo = %repo, status = %response.status(), "Repository metadata request failed");
            return Err(RepodocError::RepositoryNotFound(repo.to_string()));
        }
        Ok(response.json().await?)
    }

    async fn fetch_tree(&self, repo: &RepositoryIdentifier, branch: &str) -> Result<TreeListing> {
        let url = format!("{}/repos/{}/git/trees/{}?recursive=1", self.api_url, repo, branch);
        debug!("Fetching file tree from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            warn!(repo = %repo, status = %response.status(), "Tree listing request failed");
            return Err(RepodocError::TreeUnavailable(repo.to_string()));
        }

        let body: TreeResponse = response.json().await?;
        let entries = body
            .tree
            .into_iter()
            .filter(|item| item.kind == "blob")
            .map(|item| FileEntry {
                path: item.path,
                size: item.size,
            })
            .collect();

        Ok(TreeListing {
            entries,
            truncated: body.truncated,
        })
    }

    async fn fetch_file_content(&self, repo: &RepositoryIdentifier, path: &str) -> Result<String> {
        let url = format!("{}/repos/{}/contents/{}", self.api_url, repo, path);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RepodocError::Other(format!(
                "content request for {} returned {}",
                path,
                response.status()
            )));
        }

        let body: ContentResponse = response.json().await?;
        match body.content {
            Some(encoded) if !encoded.is_empty() => decode_content(&encoded),
            _ => Err(RepodocError::Other(format!("no content returned for {}", path))),
        }
    }
}

/// Decode a base64 content body. The host wraps the encoding across lines.
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RepodocError::Other(format!("invalid base64 content: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GitHubClient {
        let config = GitHubConfig {
            api_url: server.uri(),
            token: Some("secret".to_string()),
            ..GitHubConfig::default()
        };
        GitHubClient::new(&config).unwrap()
    }

    fn repo() -> RepositoryIdentifier {
        RepositoryIdentifier::parse("octo/widgets").unwrap()
    }

    #[test]
    fn test_decode_content_with_line_breaks() {
        // "hello world\n" split across lines the way the API returns it
        let encoded = "aGVsbG8g\nd29ybGQK\n";
        assert_eq!(decode_content(encoded).unwrap(), "hello world\n");
    }

    #[test]
    fn test_decode_content_rejects_garbage() {
        assert!(decode_content("***not base64***").is_err());
    }

    #[tokio::test]
    async fn test_fetch_metadata_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets"))
            .and(header("authorization", "token secret"))
            .and(header("user-agent", "Readme-Generator-App"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "full_name": "octo/widgets",
                "name": "widgets",
                "description": "Widgets",
                "language": "Rust",
                "stargazers_count": 5,
                "forks_count": 1,
                "topics": ["cli"],
                "default_branch": "main"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let meta = client_for(&server).fetch_metadata(&repo()).await.unwrap();
        assert_eq!(meta.name, "widgets");
        assert_eq!(meta.topics, vec!["cli".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_metadata_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_metadata(&repo()).await.unwrap_err();
        assert!(matches!(err, RepodocError::RepositoryNotFound(_)));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_fetch_tree_keeps_only_blobs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/git/trees/main"))
            .and(query_param("recursive", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "abc",
                "truncated": true,
                "tree": [
                    {"path": "src", "type": "tree"},
                    {"path": "src/main.rs", "type": "blob", "size": 120},
                    {"path": "Cargo.toml", "type": "blob", "size": 300}
                ]
            })))
            .mount(&server)
            .await;

        let listing = client_for(&server).fetch_tree(&repo(), "main").await.unwrap();
        assert!(listing.truncated);
        assert_eq!(listing.paths(), vec!["src/main.rs", "Cargo.toml"]);
        assert_eq!(listing.entries[0].size, Some(120));
    }

    #[tokio::test]
    async fn test_fetch_tree_failure_is_hard() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/git/trees/main"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_tree(&repo(), "main").await.unwrap_err();
        assert!(matches!(err, RepodocError::TreeUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_file_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/contents/package.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "encoding": "base64",
                "content": STANDARD.encode("{\"name\":\"widgets\"}")
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/contents/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let content = client.fetch_file_content(&repo(), "package.json").await.unwrap();
        assert_eq!(content, "{\"name\":\"widgets\"}");
        assert!(client.fetch_file_content(&repo(), "missing.json").await.is_err());
    }
}
