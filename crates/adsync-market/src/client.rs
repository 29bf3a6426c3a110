use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{MarketplaceError, Result};
use crate::wire::{AdRequest, AdResponse, AdUpdate, BumpOptions};

/// Operations the sync coordinator needs from the marketplace.
///
/// Every call either succeeds or returns a [`MarketplaceError`]; callers
/// decide whether a failure is fatal.
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    async fn create_ad(&self, request: &AdRequest) -> Result<AdResponse>;

    async fn get_ad(&self, source_id: &str) -> Result<AdResponse>;

    async fn update_ad(&self, source_id: &str, update: &AdUpdate) -> Result<AdResponse>;

    /// Renew the ad's visibility. Processing is asynchronous on the
    /// marketplace side; the response only acknowledges the request.
    async fn bump_ad(&self, source_id: &str, options: &BumpOptions) -> Result<AdResponse>;

    async fn delete_ad(&self, source_id: &str) -> Result<()>;
}

/// [`MarketplaceClient`] over HTTPS, authenticated with an `X-Auth-Token`.
#[derive(Debug, Clone)]
pub struct HttpMarketplaceClient {
    http: Client,
    base_url: Url,
    auth_token: String,
}

impl HttpMarketplaceClient {
    pub fn new(base_url: &str, auth_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MarketplaceError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MarketplaceError::Config(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketplaceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            auth_token: auth_token.into(),
        })
    }

    /// `{base}/ad[/{source_id}[/{suffix}]]` with every segment percent-encoded.
    fn ad_url(&self, source_id: Option<&str>, suffix: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("ad");
            if let Some(id) = source_id {
                segments.push(id);
            }
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "Marketplace request");
        self.http
            .request(method, url)
            .header("X-Auth-Token", &self.auth_token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MarketplaceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = self.send(builder).await?;
        resp.json::<T>()
            .await
            .map_err(|e| MarketplaceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MarketplaceClient for HttpMarketplaceClient {
    async fn create_ad(&self, request: &AdRequest) -> Result<AdResponse> {
        let url = self.ad_url(None, None);
        self.send_json(self.request(Method::POST, url).json(request))
            .await
    }

    async fn get_ad(&self, source_id: &str) -> Result<AdResponse> {
        let url = self.ad_url(Some(source_id), None);
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn update_ad(&self, source_id: &str, update: &AdUpdate) -> Result<AdResponse> {
        let url = self.ad_url(Some(source_id), None);
        self.send_json(self.request(Method::PUT, url).json(update))
            .await
    }

    async fn bump_ad(&self, source_id: &str, options: &BumpOptions) -> Result<AdResponse> {
        let url = self.ad_url(Some(source_id), Some("bump"));
        let pairs = options.query_pairs();
        let mut builder = self.request(Method::GET, url);
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        self.send_json(builder).await
    }

    async fn delete_ad(&self, source_id: &str) -> Result<()> {
        let url = self.ad_url(Some(source_id), None);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
