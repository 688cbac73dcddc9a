use super::ImageDescriptor;
use tracing::warn;
use url::Url;

/// Transformation applied to every full-resolution viewer URL: fit inside a
/// 1200x1200 box, keep aspect ratio, automatic quality.
pub const FULL_RESOLUTION_TRANSFORM: &str = "w_1200,h_1200,c_limit,q_auto";

/// Turns raw image references into displayable URLs on the media host.
#[derive(Debug, Clone)]
pub struct MediaUrlBuilder {
    delivery_url: String,
}

impl MediaUrlBuilder {
    pub fn new(delivery_url: impl Into<String>) -> Self {
        let delivery_url = delivery_url.into();
        Self {
            delivery_url: delivery_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute http(s) URLs come back untouched. Anything else is treated as
    /// a content identifier and expanded to a full-resolution URL; if that
    /// fails the raw reference is returned as is.
    pub fn resolve(&self, raw: &str) -> String {
        if is_absolute_http_url(raw) {
            return raw.to_string();
        }

        match self.full_resolution_url(raw) {
            Ok(url) => url,
            Err(reason) => {
                warn!(reference = %raw, "Falling back to raw image reference: {}", reason);
                raw.to_string()
            }
        }
    }

    /// Grid thumbnails use the reference the host returned.
    pub fn thumbnail(&self, descriptor: &ImageDescriptor) -> String {
        self.resolve(&descriptor.reference)
    }

    /// Lightbox URL. Prefers the content identifier; an absolute URL that
    /// points at our own delivery host is re-derived through its file name so
    /// the size bound still applies.
    pub fn full_resolution(&self, descriptor: &ImageDescriptor) -> String {
        let source = descriptor.full_resolution_source();

        if is_absolute_http_url(source) && source.starts_with(&self.delivery_url) {
            let path = source.split(['?', '#']).next().unwrap_or(source);
            return match self.full_resolution_url(path) {
                Ok(url) => url,
                Err(reason) => {
                    warn!(reference = %source, "Keeping delivery URL as is: {}", reason);
                    source.to_string()
                }
            };
        }

        self.resolve(source)
    }

    fn full_resolution_url(&self, raw: &str) -> Result<String, String> {
        let identifier = extract_identifier(raw)?;
        let candidate = format!(
            "{}/upload/{}/{}",
            self.delivery_url, FULL_RESOLUTION_TRANSFORM, identifier
        );

        Url::parse(&candidate).map_err(|e| format!("invalid delivery URL: {}", e))?;
        Ok(candidate)
    }
}

pub fn is_absolute_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Last path segment without its extension, e.g. `events/2024/img_01.jpg` -> `img_01`.
fn extract_identifier(raw: &str) -> Result<&str, String> {
    let segment = raw
        .trim()
        .rsplit('/')
        .find(|s| !s.is_empty())
        .ok_or_else(|| "empty reference".to_string())?;

    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };

    if stem.chars().any(|c| c.is_whitespace() || matches!(c, '?' | '#' | '%')) {
        return Err(format!("unsupported characters in identifier '{}'", stem));
    }

    Ok(stem)
}
