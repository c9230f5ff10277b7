use serde::Deserialize;

use crate::{SessionSummary, StoreError, SummaryStore};

#[derive(Deserialize)]
struct SaveResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Remote endpoint that accepts a summary as a JSON POST and answers
/// `{"success": true}`.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SummaryStore for HttpEndpoint {
    async fn save(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.url)
            .json(summary)
            .send()
            .await?
            .error_for_status()?;

        let body: SaveResponse = response.json().await?;
        if body.success {
            Ok(())
        } else {
            Err(StoreError::Rejected(
                body.message.unwrap_or_else(|| "success flag not set".to_string()),
            ))
        }
    }
}
