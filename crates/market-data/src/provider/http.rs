//! HTTP access shared by the scraping adapters.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::SourceId;

use super::FetchContext;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser-like user agent; several sources reject the reqwest default.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Thin wrapper over a shared [`reqwest::Client`] that memoizes response
/// bodies in the request's [`FetchContext`].
#[derive(Clone, Debug)]
pub struct PageClient {
    client: Client,
}

impl Default for PageClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl PageClient {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// GETs `url` as text, reusing a body already fetched in this context.
    pub async fn get_text(
        &self,
        ctx: &mut FetchContext,
        source_id: SourceId,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Arc<str>, ProviderError> {
        if let Some(page) = ctx.cached_page(url) {
            debug!("{}: reusing page already fetched for {}", source_id, url);
            return Ok(page);
        }

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        debug!("{} request: {}", source_id, url);

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(source_id, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited(source_id));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NoData {
                source_id,
                instrument_id: ctx.instrument_id().to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::transport(
                source_id,
                format!("HTTP {} from {}", status, url),
            ));
        }

        let body: Arc<str> = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(source_id, e))?
            .into();

        ctx.remember_page(url, body.clone());
        Ok(body)
    }

    /// GETs `url` and decodes the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &mut FetchContext,
        source_id: SourceId,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let body = self.get_text(ctx, source_id, url, headers).await?;
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::parse(source_id, format!("Invalid JSON from {}: {}", url, e))
        })
    }
}
