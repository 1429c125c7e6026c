//! Page retrieval
//!
//! The crawler only needs "give me the HTML behind this URL", so fetching is
//! a trait: [`HttpFetcher`] does real blocking HTTP, tests plug in maps.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

/// Redirects followed before a fetch is abandoned
const MAX_REDIRECTS: usize = 3;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("not an HTML page (content type {0:?})")]
    NotHtml(String),
}

/// Source of page HTML, shared by all crawl tasks
pub trait Fetcher: Send + Sync + 'static {
    fn fetch_html(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.to_ascii_lowercase().starts_with("text/html") {
            return Err(FetchError::NotHtml(content_type));
        }

        Ok(response.text()?)
    }
}
