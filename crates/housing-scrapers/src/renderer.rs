use async_trait::async_trait;
use housing_core::{HousingError, Result};
use reqwest::Client;
use scraper::Html;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::text::selector;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Per-navigation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub timeout: Duration,
    /// Pause after the page reports idle, for sites that fill listings in late.
    pub settle_delay: Duration,
}

/// An embedded sub-document (iframe) of a rendered page.
#[derive(Debug, Clone)]
pub struct FrameDocument {
    pub url: Option<Url>,
    pub html: String,
}

/// DOM snapshot of a page after navigation and settling.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: Url,
    pub html: String,
    pub frames: Vec<FrameDocument>,
}

impl RenderedPage {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
            frames: Vec::new(),
        }
    }

    pub fn with_frame(mut self, url: Option<Url>, html: impl Into<String>) -> Self {
        self.frames.push(FrameDocument {
            url,
            html: html.into(),
        });
        self
    }

    /// The top-level document followed by every sub-document.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.html.as_str()).chain(self.frames.iter().map(|f| f.html.as_str()))
    }

    /// First document whose markup contains `signature`.
    pub fn find_document(&self, signature: &str) -> Option<&str> {
        self.documents().find(|doc| doc.contains(signature))
    }
}

/// Loads a URL and hands back its DOM.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<RenderedPage>;
}

/// Fetches pages over HTTP and resolves `iframe[src]` sub-documents.
///
/// Sessions are bounded by a semaphore; a permit is held for the whole
/// navigation and released when the render future completes or is dropped.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
    sessions: Arc<Semaphore>,
}

impl HttpRenderer {
    pub fn new(max_sessions: usize) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
        })
    }

    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<String> {
        let request = async {
            self.client
                .get(url.clone())
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        };

        match tokio::time::timeout(timeout, request).await {
            Err(_) => Err(HousingError::Timeout {
                url: url.to_string(),
                seconds: timeout.as_secs(),
            }),
            Ok(Err(e)) if e.is_timeout() => Err(HousingError::Timeout {
                url: url.to_string(),
                seconds: timeout.as_secs(),
            }),
            Ok(Err(e)) => Err(HousingError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Ok(Ok(body)) => Ok(body),
        }
    }
}

/// Absolute URLs of every `iframe[src]` in `html`.
pub fn frame_sources(html: &str, base: &Url) -> Result<Vec<Url>> {
    let document = Html::parse_document(html);
    let iframe = selector("iframe[src]")?;

    Ok(document
        .select(&iframe)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| base.join(src.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .collect())
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<RenderedPage> {
        let _session = self
            .sessions
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| HousingError::Task(e.to_string()))?;

        let url = Url::parse(url)?;
        info!(url = %url, "Rendering page");
        let html = self.fetch(&url, options.timeout).await?;

        tokio::time::sleep(options.settle_delay).await;

        let mut page = RenderedPage::new(url.clone(), html);
        for frame_url in frame_sources(&page.html, &url)? {
            match self.fetch(&frame_url, options.timeout).await {
                Ok(html) => {
                    debug!(frame = %frame_url, "Loaded sub-document");
                    page.frames.push(FrameDocument {
                        url: Some(frame_url),
                        html,
                    });
                }
                Err(e) => warn!(frame = %frame_url, error = %e, "Skipping sub-document"),
            }
        }

        Ok(page)
    }
}

/// Serves canned pages; used for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct FixtureRenderer {
    pages: HashMap<String, RenderedPage>,
    failures: HashMap<String, String>,
}

impl FixtureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: RenderedPage) -> Self {
        self.pages.insert(page.url.to_string(), page);
        self
    }

    pub fn with_html(self, url: &str, html: impl Into<String>) -> Result<Self> {
        Ok(self.with_page(RenderedPage::new(Url::parse(url)?, html)))
    }

    pub fn with_failure(mut self, url: &str, message: impl Into<String>) -> Self {
        self.failures.insert(normalize(url), message.into());
        self
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl PageRenderer for FixtureRenderer {
    async fn render(&self, url: &str, _options: &RenderOptions) -> Result<RenderedPage> {
        let key = normalize(url);
        if let Some(message) = self.failures.get(&key) {
            return Err(HousingError::Navigation {
                url: key,
                message: message.clone(),
            });
        }
        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| HousingError::Navigation {
                url: key,
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })
    }
}
