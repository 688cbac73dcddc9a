use super::{FetchError, ImageDescriptor, unique_keys};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Upper bound on images requested per collection load.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Remote host holding the photo collections.
///
/// Implementations must return [`FetchError::Aborted`] once `cancel` fires
/// instead of completing the request.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch_batch(
        &self,
        collection_id: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<RemoteBatch, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "publicId")]
    pub public_id: Option<String>,
}

/// Validated host response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBatch {
    pub images: Vec<RemoteImage>,
    /// Authoritative number of images in the collection, at least `images.len()`.
    pub total: usize,
}

#[derive(Deserialize)]
struct RawBatch {
    images: Vec<RemoteImage>,
    #[serde(default)]
    total: Option<u64>,
}

impl RemoteBatch {
    pub fn new(images: Vec<RemoteImage>, total: usize) -> Self {
        let total = total.max(images.len());
        Self { images, total }
    }

    /// Parses and validates an untrusted host payload.
    pub fn from_json(body: &[u8]) -> Result<Self, FetchError> {
        let raw: RawBatch = serde_json::from_slice(body)?;

        for (index, image) in raw.images.iter().enumerate() {
            let has_url = image.url.as_deref().is_some_and(|u| !u.trim().is_empty());
            let has_id = image
                .public_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty());
            if !has_url && !has_id {
                return Err(FetchError::Malformed(format!(
                    "image {} has neither url nor publicId",
                    index
                )));
            }
        }

        let returned = raw.images.len();
        let total = match raw.total {
            Some(total) => usize::try_from(total)
                .map_err(|_| FetchError::Malformed(format!("total {} out of range", total)))?,
            None => returned,
        };

        if total < returned {
            debug!(
                total,
                returned, "Host reported fewer images than it returned, using returned count"
            );
        }

        Ok(Self::new(raw.images, total))
    }

    /// Tags each image with its 1-based ordinal in arrival order.
    ///
    /// Keys are made unique so a host that repeats a content identifier does
    /// not produce two cards sharing one selection.
    pub fn into_descriptors(
        self,
        collection_title: &str,
        date: Option<&str>,
    ) -> Vec<ImageDescriptor> {
        let descriptors = self
            .images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                let public_id = image.public_id.filter(|id| !id.trim().is_empty());
                let reference = image
                    .url
                    .filter(|u| !u.trim().is_empty())
                    .or_else(|| public_id.clone())
                    .unwrap_or_default();

                ImageDescriptor::new(
                    collection_title,
                    index + 1,
                    reference,
                    public_id,
                    date.map(str::to_string),
                )
            })
            .collect();

        unique_keys(descriptors)
    }
}

/// Static lookup from collection id to endpoint. Unmapped ids use
/// `{api_base}/{collection_id}`.
#[derive(Debug, Clone)]
pub struct EndpointMap {
    api_base: String,
    endpoints: HashMap<String, String>,
}

impl EndpointMap {
    pub fn new(api_base: impl Into<String>, endpoints: HashMap<String, String>) -> Self {
        let api_base = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            endpoints,
        }
    }

    pub fn endpoint_for(&self, collection_id: &str) -> String {
        match self.endpoints.get(collection_id) {
            Some(endpoint) if endpoint.starts_with("http://") || endpoint.starts_with("https://") => {
                endpoint.clone()
            }
            Some(path) => format!("{}/{}", self.api_base, path.trim_start_matches('/')),
            None => format!(
                "{}/{}",
                self.api_base,
                urlencoding::encode(collection_id)
            ),
        }
    }
}

pub struct HttpMediaSource {
    http: reqwest::Client,
    endpoints: EndpointMap,
}

impl HttpMediaSource {
    pub fn new(endpoints: EndpointMap) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    async fn request(&self, url: &str, max_results: usize) -> Result<RemoteBatch, FetchError> {
        let response = self
            .http
            .get(url)
            .query(&[("max_results", max_results)])
            // Prefer whatever a cache in front of the host already has.
            .header(CACHE_CONTROL, "max-stale")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        RemoteBatch::from_json(&body)
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn fetch_batch(
        &self,
        collection_id: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<RemoteBatch, FetchError> {
        let url = self.endpoints.endpoint_for(collection_id);
        debug!(collection_id, url = %url, max_results, "Fetching collection batch");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Aborted),
            result = self.request(&url, max_results) => result,
        };

        if let Err(e) = &result
            && !e.is_abort()
        {
            warn!(collection_id, url = %url, "Collection fetch failed: {}", e);
        }

        result
    }
}
