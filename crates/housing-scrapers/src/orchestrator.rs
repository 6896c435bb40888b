use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::FutureExt;
use housing_core::{Database, HousingError, Listing, Result};
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::dedup::dedup_listings;
use crate::{all_sources, PageRenderer, ScrapeSettings, Source};

/// Output of one source's run. A failed source has no listings,
/// no timestamp and an error message.
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub listings: Vec<Listing>,
    pub scraped_at: Option<DateTime<Utc>>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceResult {
    fn failed(source: &str, error: String) -> Self {
        Self {
            listings: Vec::new(),
            scraped_at: None,
            source: source.to_string(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Combined output of a concurrent run over every source.
#[derive(Debug, Clone, Serialize)]
pub struct MergedResult {
    pub listings: Vec<Listing>,
    pub scraped_at: DateTime<Utc>,
    pub sources: Vec<String>,
    #[serde(skip)]
    pub results: Vec<SourceResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Extract,
    Persist,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub stored: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FailureStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    fn failed(source: &str, stage: FailureStage, error: String) -> Self {
        Self {
            source: source.to_string(),
            stored: 0,
            stage: Some(stage),
            error: Some(error),
        }
    }
}

/// What a sequential run wrote, source by source.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    pub fn stored(&self) -> usize {
        self.outcomes.iter().map(|o| o.stored).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }

    /// `Err` naming every source whose listings could not be written.
    pub fn ensure_persisted(&self) -> Result<()> {
        let failed: Vec<String> = self
            .failures()
            .filter(|o| o.stage == Some(FailureStage::Persist))
            .map(|o| format!("{}: {}", o.source, o.error.as_deref().unwrap_or_default()))
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(HousingError::Persist(failed.join("; ")))
        }
    }
}

pub(crate) fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Drives the sources through a renderer.
pub struct Orchestrator {
    renderer: Arc<dyn PageRenderer>,
    sources: Vec<Arc<dyn Source>>,
    settings: ScrapeSettings,
}

impl Orchestrator {
    pub fn new(renderer: Arc<dyn PageRenderer>, settings: ScrapeSettings) -> Self {
        Self {
            renderer,
            sources: all_sources(),
            settings,
        }
    }

    pub fn with_sources(mut self, sources: Vec<Arc<dyn Source>>) -> Self {
        self.sources = sources;
        self
    }

    async fn run_source(&self, source: &dyn Source) -> Result<SourceResult> {
        let options = source.render_options(&self.settings);
        let scraped_at = Utc::now();
        let mut listings = Vec::new();

        for url in source.urls() {
            let page = self.renderer.render(url, &options).await?;
            listings.extend(source.extract(&page, scraped_at)?);
        }

        Ok(SourceResult {
            listings: dedup_listings(listings),
            scraped_at: Some(scraped_at),
            source: source.id().to_string(),
            error: None,
        })
    }

    /// Run `source` inside a failure boundary: errors and panics become `Err`.
    async fn run_isolated(&self, source: &dyn Source) -> Result<SourceResult> {
        match AssertUnwindSafe(self.run_source(source)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(&panic);
                error!(source = source.id(), panic = %message, "Source panicked");
                Err(HousingError::Scraping(format!("{} panicked: {}", source.id(), message)))
            }
        }
    }

    /// Scrape a single source on demand. Failures go to the caller.
    pub async fn scrape_source(&self, id: &str) -> Result<SourceResult> {
        let source = self
            .sources
            .iter()
            .find(|s| s.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| HousingError::UnknownSource(id.to_string()))?;

        info!(source = source.id(), "Scraping source");
        let result = self.run_isolated(source.as_ref()).await;
        if let Err(e) = &result {
            warn!(source = source.id(), error = %e, "Scrape failed");
        }
        result
    }

    /// Scrape every source concurrently. A failing source contributes an
    /// empty result and never affects the others.
    pub async fn scrape_all(&self) -> MergedResult {
        let runs = self.sources.iter().map(|source| async move {
            match self.run_isolated(source.as_ref()).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(source = source.id(), error = %e, "Source failed");
                    SourceResult::failed(source.id(), e.to_string())
                }
            }
        });
        let results = join_all(runs).await;

        let mut listings = Vec::new();
        for result in &results {
            listings.extend(result.listings.iter().cloned().map(|mut listing| {
                if listing.source.is_empty() {
                    listing.source = result.source.clone();
                }
                listing
            }));
        }
        let scraped_at = results
            .iter()
            .filter_map(|r| r.scraped_at)
            .max()
            .unwrap_or_else(Utc::now);

        info!(
            listings = listings.len(),
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            "Scraped all sources"
        );

        MergedResult {
            listings,
            scraped_at,
            sources: self.sources.iter().map(|s| s.id().to_string()).collect(),
            results,
        }
    }

    /// Scrape sources one at a time, persisting each before the next starts.
    pub async fn run_all_to_db(&self, db: &Database) -> Result<RunSummary> {
        let started_at = Utc::now();
        info!(sources = self.sources.len(), "Starting scrape run");

        let mut outcomes = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let id = source.id();
            let result = match self.run_isolated(source.as_ref()).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(source = id, error = %e, "Extraction failed");
                    outcomes.push(SourceOutcome::failed(id, FailureStage::Extract, e.to_string()));
                    continue;
                }
            };

            match db.upsert_listings(&result.listings, id).await {
                Ok(stored) => {
                    info!(source = id, stored, "Upserted listings");
                    outcomes.push(SourceOutcome {
                        source: id.to_string(),
                        stored,
                        stage: None,
                        error: None,
                    });
                }
                Err(e) => {
                    error!(source = id, error = %e, "Persisting listings failed");
                    outcomes.push(SourceOutcome::failed(id, FailureStage::Persist, e.to_string()));
                }
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            stored = summary.stored(),
            failed = summary.failures().count(),
            "Scrape run complete"
        );
        Ok(summary)
    }
}
