//! reqwest-backed [`IssueApi`] talking to `{base}/api/0/organizations/{org}/…`.

use async_trait::async_trait;
use color_eyre::eyre::Result;
use ilw_core::model::{Group, GroupStats, SavedSearch};
use ilw_core::params::QueryPairs;
use ilw_core::traits::{BulkUpdate, IssueApi, ListResponse};
use ilw_core::widgets::{SeriesResponse, TableResponse};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, Response};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Request timed out")]
    Timeout,
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
}

impl ApiError {
    fn from_send(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Connect(e.to_string())
        } else {
            ApiError::Transport(e)
        }
    }
}

pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
    org: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, org: &str, token: Option<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            client,
            base: normalize_base(base_url)?,
            org: org.to_string(),
            token,
        })
    }

    /// `{base}/api/0/organizations/{org}/{path}`
    pub fn org_url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self
            .base
            .join(&format!("api/0/organizations/{}/{path}", self.org))?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get(&self, url: Url, params: &QueryPairs) -> Result<Response, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self
            .authorized(self.client.get(url).query(params))
            .send()
            .await
            .map_err(ApiError::from_send)?;
        check_status(response).await
    }
}

/// Base URL with a trailing slash so relative joins append instead of replacing.
fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

/// `{"detail": "..."}` bodies are unwrapped; anything else is passed through.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn list_response(response: Response) -> Result<ListResponse, ApiError> {
    let headers = response.headers().clone();
    let groups: Vec<Group> = response.json().await?;
    Ok(ListResponse {
        groups,
        hits: header(&headers, "X-Hits"),
        max_hits: header(&headers, "X-Max-Hits"),
        link: header(&headers, "Link"),
        direct_hit: header(&headers, "X-Sentry-Direct-Hit").as_deref() == Some("1"),
    })
}

fn bulk_update_pairs(update: &BulkUpdate) -> QueryPairs {
    update
        .ids
        .iter()
        .map(|id| ("id".to_string(), id.clone()))
        .chain(update.projects.iter().map(|p| ("project".to_string(), p.clone())))
        .collect()
}

#[async_trait]
impl IssueApi for HttpApi {
    fn organization(&self) -> &str {
        &self.org
    }

    async fn list_issues(&self, params: &QueryPairs) -> Result<ListResponse> {
        let response = self.get(self.org_url("issues/")?, params).await?;
        Ok(list_response(response).await?)
    }

    async fn issue_stats(&self, params: &QueryPairs) -> Result<Vec<GroupStats>> {
        let response = self.get(self.org_url("issues-stats/")?, params).await?;
        Ok(response.json().await.map_err(ApiError::Transport)?)
    }

    async fn issue_counts(&self, params: &QueryPairs) -> Result<HashMap<String, u64>> {
        let response = self.get(self.org_url("issues-count/")?, params).await?;
        Ok(response.json().await.map_err(ApiError::Transport)?)
    }

    async fn bulk_update(&self, update: &BulkUpdate) -> Result<()> {
        let url = self.org_url("issues/")?;
        tracing::debug!(%url, ids = ?update.ids, "PUT");
        let response = self
            .authorized(
                self.client
                    .put(url)
                    .query(&bulk_update_pairs(update))
                    .json(&update.body()),
            )
            .send()
            .await
            .map_err(ApiError::from_send)?;
        check_status(response).await?;
        Ok(())
    }

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>> {
        let response = self.get(self.org_url("searches/")?, &Vec::new()).await?;
        Ok(response.json().await.map_err(ApiError::Transport)?)
    }

    async fn poll(&self, endpoint: &str) -> Result<ListResponse> {
        let response = self
            .get(Url::parse(endpoint).map_err(ApiError::Url)?, &Vec::new())
            .await?;
        Ok(list_response(response).await?)
    }

    async fn events_table(&self, params: &QueryPairs) -> Result<TableResponse> {
        let response = self.get(self.org_url("events/")?, params).await?;
        Ok(response.json().await.map_err(ApiError::Transport)?)
    }

    async fn events_stats(&self, params: &QueryPairs) -> Result<SeriesResponse> {
        let response = self.get(self.org_url("events-stats/")?, params).await?;
        Ok(response.json().await.map_err(ApiError::Transport)?)
    }
}
