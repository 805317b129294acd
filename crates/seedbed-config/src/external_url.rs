//! Decomposition of the forum's external URL.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// The `url` key split into the parts the web layer and asset pipeline need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalUrl {
    url: Url,
    host: String,
    relative_path: String,
}

impl ExternalUrl {
    /// Scheme without the trailing colon, e.g. `https`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host name without port.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Port written explicitly in the URL; default ports are reported as absent.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// Raw path component, always starting with `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Mount prefix for every route; empty when the forum lives at `/`.
    #[must_use]
    pub fn relative_path(&self) -> &str {
        self.relative_path.as_str()
    }

    /// Whether the forum is served over TLS.
    #[must_use]
    pub fn secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Base path under which static assets are served.
    #[must_use]
    pub fn asset_base_url(&self) -> String {
        format!("{}/assets", self.relative_path)
    }

    /// Base path under which uploaded files are served.
    #[must_use]
    pub fn upload_url(&self) -> String {
        format!("{}/assets/uploads", self.relative_path)
    }

    /// Origin pattern accepted by the realtime transport.
    #[must_use]
    pub fn origin_pattern(&self) -> String {
        format!("{}://{}:*", self.url.scheme(), self.host)
    }
}

impl fmt::Display for ExternalUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.url.as_str())
    }
}

impl FromStr for ExternalUrl {
    type Err = UrlParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| UrlParseError::MissingHost(input.to_string()))?
            .to_string();
        let relative_path = match url.path().trim_end_matches('/') {
            "" => String::new(),
            trimmed => trimmed.to_string(),
        };
        Ok(Self {
            url,
            host,
            relative_path,
        })
    }
}

/// Errors encountered while parsing an [`ExternalUrl`].
#[derive(Debug, Error)]
pub enum UrlParseError {
    /// The URL carried no host, e.g. `file:///srv/forum`.
    #[error("url '{0}' has no host")]
    MissingHost(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
