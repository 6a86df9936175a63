//! HTTP adapter for the hosted content backend.
//!
//! Queries are sent as `GET {base}/v{api_version}/data/query/{dataset}` with
//! the query text in `query` and each parameter JSON-encoded as `$name`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::source::{ContentSource, Query, SourceError};
use crate::config::BackendSettings;

use super::error::InfraError;

/// Which revisions a source can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Published documents only; may be served from the CDN.
    Published,
    /// Every revision including drafts; authenticated.
    Preview,
}

impl Channel {
    fn perspective(self) -> &'static str {
        match self {
            Channel::Published => "published",
            Channel::Preview => "raw",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Channel::Published => "published",
            Channel::Preview => "preview",
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HttpContentSource {
    client: Client,
    endpoint: Url,
    channel: Channel,
    token: Option<String>,
}

impl HttpContentSource {
    pub fn new(
        base: &Url,
        api_version: &str,
        dataset: &str,
        channel: Channel,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, InfraError> {
        let endpoint = base
            .join(&format!("v{api_version}/data/query/{dataset}"))
            .map_err(|err| InfraError::configuration(format!("invalid backend endpoint: {err}")))?;

        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| InfraError::backend(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint,
            channel,
            token,
        })
    }

    /// Published-channel source built from settings.
    pub fn published(settings: &BackendSettings) -> Result<Self, InfraError> {
        Self::new(
            &settings.published_base,
            &settings.api_version,
            &settings.dataset,
            Channel::Published,
            None,
            settings.request_timeout,
        )
    }

    /// Preview-channel source, or `None` when no preview token is configured.
    pub fn preview(settings: &BackendSettings) -> Result<Option<Self>, InfraError> {
        let Some(token) = settings.preview_token.clone() else {
            return Ok(None);
        };
        Self::new(
            &settings.preview_base,
            &settings.api_version,
            &settings.dataset,
            Channel::Preview,
            Some(token),
            settings.request_timeout,
        )
        .map(Some)
    }

    pub fn user_agent() -> &'static str {
        concat!("gazette/", env!("CARGO_PKG_VERSION"))
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Full request URL for `query`.
    pub fn query_url(&self, query: &Query) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query.text());
            for (name, value) in query.params() {
                pairs.append_pair(&format!("${name}"), &value.to_string());
            }
            pairs.append_pair("perspective", self.channel.perspective());
        }
        url
    }

    async fn handle(response: Response) -> Result<Value, SourceError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            if status == StatusCode::BAD_REQUEST
                && let Ok(parsed) = serde_json::from_slice::<ErrorResponse>(&bytes)
            {
                let message = parsed
                    .error
                    .description
                    .or(parsed.error.message)
                    .unwrap_or(body);
                return Err(SourceError::Query(message));
            }
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = serde_json::from_slice(&bytes).map_err(SourceError::decode)?;
        if let Some(ms) = parsed.ms {
            debug!(backend_ms = ms, "backend query timing");
        }
        Ok(parsed.result)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        let url = self.query_url(query);
        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }

        debug!(channel = self.channel.as_str(), query = query.name(), "sending backend query");
        let response = request.send().await.map_err(|err| {
            warn!(
                channel = self.channel.as_str(),
                query = query.name(),
                error = %err,
                "backend request failed"
            );
            SourceError::Transport(err.to_string())
        })?;

        Self::handle(response).await
    }
}
