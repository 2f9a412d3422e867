//! GitHub issue source connector.
//!
//! Resolves an issue URL into a normalized [`BugReport`]: the issue itself,
//! an error message extracted from the body, and the content of any source
//! files the body links to. Linked-file fetches are independently marked
//! success/failure — the overall resolution succeeds as long as the issue
//! was fetched. Also exposes the `post_comment` operation used by the
//! report sink.

use crate::errors::ConnectorError;
use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

static ISSUE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com/([^/\s]+)/([^/\s]+)/issues/(\d+)").expect("static regex is valid")
});

static BLOB_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://github\.com/[^\s)"'<>]+/blob/[^\s)"'<>]+"#).expect("static regex is valid")
});

static ERROR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)Traceback.*?(\w+Error:\s*[^\n]+)",
        r"(?i)error:\s*(.+)",
        r"(?i)exception:\s*(.+)",
        r"(?i)panicked at\s*'?([^'\n]+)",
        r"(?i)fatal:\s*(.+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex is valid"))
    .collect()
});

/// Parsed coordinates of a GitHub issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl IssueRef {
    pub fn api_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/issues/{}",
            self.owner, self.repo, self.number
        )
    }

    pub fn comments_url(&self) -> String {
        format!("{}/comments", self.api_url())
    }
}

/// Parse `https://github.com/<owner>/<repo>/issues/<n>` into an [`IssueRef`].
pub fn parse_issue_url(url: &str) -> Result<IssueRef, ConnectorError> {
    let caps = ISSUE_URL_RE
        .captures(url)
        .ok_or_else(|| ConnectorError::InvalidIssueUrl(url.to_string()))?;
    let number = caps[3]
        .parse()
        .map_err(|_| ConnectorError::InvalidIssueUrl(url.to_string()))?;
    Ok(IssueRef {
        owner: caps[1].to_string(),
        repo: caps[2].to_string(),
        number,
    })
}

/// Normalized representation of the reported defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugReport {
    pub title: String,
    pub state: String,
    pub description: String,
    pub issue_url: String,
    pub issue_number: u64,
    pub labels: Vec<String>,
    /// Error message extracted from the issue body, when one was found.
    pub error_message: Option<String>,
    /// Source files the issue body links to, each independently fetched.
    pub linked_files: Vec<LinkedFile>,
}

impl BugReport {
    /// The error message, or the undetermined fallback for display.
    pub fn error_display(&self) -> &str {
        self.error_message.as_deref().unwrap_or("undetermined")
    }
}

/// One linked-file fetch result. Failure here is recorded, not escalated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedFile {
    pub url: String,
    pub file_name: String,
    pub success: bool,
    pub content: Option<String>,
    pub error: Option<String>,
}

/// Extract the first recognizable error message from an issue body.
pub fn extract_error_message(body: &str) -> Option<String> {
    for pattern in ERROR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(body) {
            return Some(caps[1].trim().to_string());
        }
    }
    None
}

/// Extract GitHub blob URLs from an issue body.
pub fn extract_code_links(body: &str) -> Vec<String> {
    BLOB_URL_RE
        .find_iter(body)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Rewrite a `github.com/.../blob/...` URL to its raw content equivalent.
pub fn raw_content_url(blob_url: &str) -> Option<String> {
    let rest = blob_url.strip_prefix("https://github.com/")?;
    let (repo_part, path_part) = rest.split_once("/blob/")?;
    // Strip a #L10-L20 line fragment if present.
    let path_part = path_part.split('#').next().unwrap_or(path_part);
    Some(format!(
        "https://raw.githubusercontent.com/{repo_part}/{path_part}"
    ))
}

/// Wire shape of the GitHub issues API (subset of fields we care about).
#[derive(Debug, Deserialize)]
struct IssueResponse {
    title: String,
    body: Option<String>,
    state: String,
    #[serde(default)]
    labels: Vec<IssueLabel>,
}

#[derive(Debug, Deserialize)]
struct IssueLabel {
    name: String,
}

/// HTTP connector to the GitHub REST API.
pub struct IssueConnector {
    client: reqwest::Client,
    token: Option<String>,
}

impl IssueConnector {
    pub fn new(token: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, token }
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "triage-debug-tool");
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    /// Fetch the issue and every source file it links to.
    ///
    /// Linked-file failures are captured per link; only a failure to fetch
    /// the issue itself is an error.
    pub async fn fetch_bug_report(&self, issue_url: &str) -> Result<BugReport, ConnectorError> {
        let issue_ref = parse_issue_url(issue_url)?;

        let resp = self
            .authorized(self.client.get(issue_ref.api_url()))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ConnectorError::IssueNotFound(issue_url.to_string()));
        }
        let issue: IssueResponse = resp.error_for_status()?.json().await?;

        let body = issue.body.unwrap_or_default();
        let links = extract_code_links(&body);
        let linked_files = join_all(links.iter().map(|url| self.fetch_linked_file(url))).await;

        Ok(BugReport {
            title: issue.title,
            state: issue.state,
            error_message: extract_error_message(&body),
            description: body,
            issue_url: issue_url.to_string(),
            issue_number: issue_ref.number,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            linked_files,
        })
    }

    async fn fetch_linked_file(&self, blob_url: &str) -> LinkedFile {
        let file_name = blob_url
            .rsplit('/')
            .next()
            .unwrap_or(blob_url)
            .split('#')
            .next()
            .unwrap_or(blob_url)
            .to_string();

        let Some(raw_url) = raw_content_url(blob_url) else {
            return LinkedFile {
                url: blob_url.to_string(),
                file_name,
                success: false,
                content: None,
                error: Some("not a recognizable blob URL".to_string()),
            };
        };

        let result = async {
            self.authorized(self.client.get(&raw_url))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        }
        .await;

        match result {
            Ok(content) => LinkedFile {
                url: blob_url.to_string(),
                file_name,
                success: true,
                content: Some(content),
                error: None,
            },
            Err(e) => {
                tracing::warn!("linked file fetch failed for {blob_url}: {e}");
                LinkedFile {
                    url: blob_url.to_string(),
                    file_name,
                    success: false,
                    content: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Post a comment on the issue. Requires a configured token.
    pub async fn post_comment(&self, issue_url: &str, body: &str) -> Result<(), ConnectorError> {
        if self.token.is_none() {
            return Err(ConnectorError::MissingToken);
        }
        let issue_ref = parse_issue_url(issue_url)?;

        self.authorized(self.client.post(issue_ref.comments_url()))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
