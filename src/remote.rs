// Remote spreadsheet sync: POST uploads one request, GET ?method=GET returns {"rows": [...]}

use crate::error::SyncError;
use crate::models::Request;
use async_trait::async_trait;
use eyre::Context;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Upload and download of requests
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Upload one request
    async fn push(&self, request: &Request) -> Result<(), SyncError>;

    /// Fetch the full remote collection
    async fn pull(&self) -> Result<Vec<Request>, SyncError>;
}

/// HTTP implementation of [`RemoteSync`]
pub struct HttpRemote {
    endpoint: String,
    token: Option<String>,
    client: Client,
}

impl HttpRemote {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> eyre::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(endpoint, token, client))
    }

    pub fn with_client(endpoint: impl Into<String>, token: Option<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }
}

#[async_trait]
impl RemoteSync for HttpRemote {
    async fn push(&self, request: &Request) -> Result<(), SyncError> {
        let failure = |reason: String| SyncError::Push {
            id: request.id.clone(),
            reason,
        };

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        // Body is never read; only the status decides
        if !response.status().is_success() {
            return Err(failure(format!("remote answered {}", response.status())));
        }

        debug!(id = %request.id, "Pushed request");
        Ok(())
    }

    async fn pull(&self) -> Result<Vec<Request>, SyncError> {
        let response = self
            .authorize(self.client.get(&self.endpoint).query(&[("method", "GET")]))
            .send()
            .await
            .map_err(|e| SyncError::Pull(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Pull(format!("remote answered {}", response.status())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::Pull(format!("response is not JSON: {}", e)))?;
        let requests = parse_rows(body)?;

        debug!(count = requests.len(), "Pulled requests");
        Ok(requests)
    }
}

/// Decode a `{ "rows": [...] }` body; any malformed row fails the whole pull
pub fn parse_rows(body: Value) -> Result<Vec<Request>, SyncError> {
    let Value::Object(mut map) = body else {
        return Err(SyncError::Pull("response is not an object".to_string()));
    };
    match map.remove("rows") {
        Some(rows @ Value::Array(_)) => {
            serde_json::from_value(rows).map_err(|e| SyncError::Pull(format!("invalid row: {}", e)))
        }
        Some(_) => Err(SyncError::Pull("`rows` is not a list".to_string())),
        None => Err(SyncError::Pull("response has no `rows`".to_string())),
    }
}
