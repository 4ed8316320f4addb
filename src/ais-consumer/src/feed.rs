use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::io::AsyncRead;
use tracing::info;

use crate::{
    error::{
        Result,
        error::{FailedRequestSnafu, InvalidAddressSnafu},
    },
    settings::{BoundingBox, FeedSettings},
};

pub type FeedStream = Box<dyn AsyncRead + Send + Unpin>;

/// Opens a new session against the live feed. Every call re-issues the same
/// subscription.
#[async_trait]
pub trait AisSource: Send + Sync {
    async fn connect(&self) -> Result<FeedStream>;
}

#[derive(Debug, Clone, Serialize)]
struct Subscription {
    #[serde(rename = "APIKey")]
    api_key: String,
    #[serde(rename = "BoundingBoxes")]
    bounding_boxes: Vec<BoundingBox>,
    #[serde(rename = "FilterMessageTypes", skip_serializing_if = "Vec::is_empty")]
    message_types: Vec<String>,
}

pub struct LiveFeedClient {
    api_address: Url,
    subscription: Subscription,
    client: Client,
}

impl LiveFeedClient {
    pub fn new(settings: &FeedSettings) -> Result<LiveFeedClient> {
        let api_address = Url::parse(&settings.api_address).map_err(|e| {
            InvalidAddressSnafu {
                address: settings.api_address.clone(),
                error_stringified: e.to_string(),
            }
            .build()
        })?;

        Ok(LiveFeedClient {
            api_address,
            subscription: Subscription {
                api_key: settings.api_key.clone(),
                bounding_boxes: settings.bounding_boxes.clone(),
                message_types: settings.message_types.clone(),
            },
            client: Client::new(),
        })
    }
}

#[async_trait]
impl AisSource for LiveFeedClient {
    async fn connect(&self) -> Result<FeedStream> {
        let response = self
            .client
            .post(self.api_address.clone())
            .json(&self.subscription)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return FailedRequestSnafu {
                url: self.api_address.to_string(),
                status,
                body: response.text().await?,
            }
            .fail();
        }

        info!("connected to feed at {}", self.api_address);

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other))
            .into_async_read();

        let compat = tokio_util::compat::FuturesAsyncReadCompatExt::compat(stream);

        Ok(Box::new(compat))
    }
}
