use std::time::Duration;

use futures_util::StreamExt;
use importer_core::Project;
use importer_logging::importer_debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::tracker::IssueTracker;
use crate::{CreatedIssue, CurrentUser, NewIssue, ProjectQuery, TrackerError, TrackerErrorKind};

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

/// GitLab REST v4 client authenticated with a personal access token.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    base: Url,
    token: String,
    client: reqwest::Client,
    max_response_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: u64,
    username: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectBody {
    id: u64,
    name: String,
    path: String,
    path_with_namespace: String,
    #[serde(default)]
    web_url: String,
}

impl From<ProjectBody> for Project {
    fn from(body: ProjectBody) -> Self {
        Project {
            id: body.id,
            path_with_namespace: body.path_with_namespace,
            name: body.name,
            path: body.path,
            web_url: body.web_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssueBody {
    iid: u64,
    web_url: String,
}

#[derive(Debug, Serialize)]
struct IssuePayload<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<&'a str>,
}

impl GitLabClient {
    /// `domain` may be a bare host (`gitlab.example.com`) or a full base URL.
    pub fn new(
        domain: &str,
        token: impl Into<String>,
        settings: TrackerSettings,
    ) -> Result<Self, TrackerError> {
        let base = normalize_base_url(domain)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TrackerError::new(TrackerErrorKind::Network, err.to_string()))?;
        Ok(Self {
            base,
            token: token.into(),
            client,
            max_response_bytes: settings.max_response_bytes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TrackerError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TrackerError::new(TrackerErrorKind::InvalidUrl, "base url cannot hold a path"))?
            .pop_if_empty()
            .extend(["api", "v4"])
            .extend(segments);
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<T, TrackerError> {
        importer_debug!("{} {}", method, url.path());
        let mut request = self
            .client
            .request(method, url)
            .header(TOKEN_HEADER, &self.token);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = self.read_body(response).await?;
        if !status.is_success() {
            return Err(status_error(status, &bytes));
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| TrackerError::new(TrackerErrorKind::Decode, err.to_string()))
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, TrackerError> {
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > self.max_response_bytes {
                return Err(TrackerError::new(
                    TrackerErrorKind::Decode,
                    format!("response exceeds {} bytes", self.max_response_bytes),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl IssueTracker for GitLabClient {
    async fn validate_connection(&self) -> Result<CurrentUser, TrackerError> {
        let user: UserBody = self
            .request(Method::GET, self.endpoint(&["user"])?, None)
            .await?;
        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            name: user.name,
        })
    }

    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, TrackerError> {
        let mut url = self.endpoint(&["projects"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("membership", "true");
            pairs.append_pair("per_page", &query.per_page.to_string());
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(search) = query.search.as_deref() {
                pairs.append_pair("search", search);
            }
        }
        let projects: Vec<ProjectBody> = self.request(Method::GET, url, None).await?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    async fn project_by_path(&self, path: &str) -> Result<Option<Project>, TrackerError> {
        let url = self.endpoint(&["projects", path])?;
        match self.request::<ProjectBody>(Method::GET, url, None).await {
            Ok(project) => Ok(Some(project.into())),
            Err(err) if err.kind == TrackerErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_issue(
        &self,
        project_id: u64,
        issue: &NewIssue,
    ) -> Result<CreatedIssue, TrackerError> {
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "issues"])?;
        let payload = IssuePayload {
            title: &issue.title,
            description: issue.description.as_deref(),
            labels: issue.labels.as_deref(),
        };
        let body = serde_json::to_vec(&payload)
            .map_err(|err| TrackerError::new(TrackerErrorKind::Decode, err.to_string()))?;
        let created: IssueBody = self.request(Method::POST, url, Some(body)).await?;
        Ok(CreatedIssue {
            iid: created.iid,
            web_url: created.web_url,
        })
    }
}

fn normalize_base_url(domain: &str) -> Result<Url, TrackerError> {
    let domain = domain.trim().trim_end_matches('/');
    if domain.is_empty() {
        return Err(TrackerError::new(TrackerErrorKind::InvalidUrl, "tracker domain is empty"));
    }
    let with_scheme = if domain.starts_with("http") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };
    Url::parse(&with_scheme)
        .map_err(|err| TrackerError::new(TrackerErrorKind::InvalidUrl, err.to_string()))
}

fn status_error(status: StatusCode, body: &[u8]) -> TrackerError {
    let code = status.as_u16();
    let kind = match code {
        401 | 403 => TrackerErrorKind::Unauthorized(code),
        404 => TrackerErrorKind::NotFound,
        _ => TrackerErrorKind::HttpStatus(code),
    };
    let message = error_body_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
    TrackerError::new(kind, message)
}

/// GitLab reports errors as `{"message": ...}` or `{"error": ...}`; the
/// message may be a string or a field → errors object.
fn error_body_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let pick = |key: &str| match value.get(key)? {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    };
    pick("message").or_else(|| pick("error"))
}

fn map_reqwest_error(err: reqwest::Error) -> TrackerError {
    if err.is_timeout() {
        return TrackerError::new(TrackerErrorKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return TrackerError::new(TrackerErrorKind::InvalidUrl, err.to_string());
    }
    TrackerError::new(TrackerErrorKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        let url = normalize_base_url("gitlab.example.com/").unwrap();
        assert_eq!(url.as_str(), "https://gitlab.example.com/");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = normalize_base_url("http://localhost:8080").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn empty_domain_is_invalid() {
        let err = normalize_base_url("  ").unwrap_err();
        assert_eq!(err.kind, TrackerErrorKind::InvalidUrl);
    }

    #[test]
    fn error_body_prefers_message_then_error() {
        assert_eq!(
            error_body_message(br#"{"message":"401 Unauthorized"}"#).as_deref(),
            Some("401 Unauthorized")
        );
        assert_eq!(
            error_body_message(br#"{"error":"insufficient_scope"}"#).as_deref(),
            Some("insufficient_scope")
        );
        assert_eq!(
            error_body_message(br#"{"message":{"title":["can't be blank"]}}"#).as_deref(),
            Some(r#"{"title":["can't be blank"]}"#)
        );
        assert_eq!(error_body_message(b"not json"), None);
    }
}
