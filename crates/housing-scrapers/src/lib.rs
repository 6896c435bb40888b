pub mod dedup;
pub mod orchestrator;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sources;
pub mod text;

use chrono::{DateTime, Utc};
use housing_core::{HousingError, Listing, Result};
use std::sync::Arc;

pub use dedup::dedup_listings;
pub use orchestrator::{FailureStage, MergedResult, Orchestrator, RunSummary, SourceOutcome, SourceResult};
pub use renderer::{FixtureRenderer, FrameDocument, HttpRenderer, PageRenderer, RenderOptions, RenderedPage};
pub use scheduler::{OrchestratorJob, ScheduledRun, Scheduler};
pub use settings::ScrapeSettings;
pub use sources::{Koto, Meridian, PlayaLife, Solis, Wolfe};

/// One property-management website and how to read its listings.
pub trait Source: Send + Sync {
    /// Stable identifier, stored as the listing's `source`.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn homepage(&self) -> &'static str;

    /// Pages to render, in order.
    fn urls(&self) -> &'static [&'static str];

    fn render_options(&self, settings: &ScrapeSettings) -> RenderOptions {
        settings.render_options()
    }

    /// Turn one rendered page into candidates, in document order.
    ///
    /// Elements that can't be read are skipped; an error here fails the
    /// whole source.
    fn extract(&self, page: &RenderedPage, scraped_at: DateTime<Utc>) -> Result<Vec<Listing>>;
}

/// Every supported source, in scheduled run order.
pub fn all_sources() -> Vec<Arc<dyn Source>> {
    vec![
        Arc::new(Meridian),
        Arc::new(PlayaLife),
        Arc::new(Koto),
        Arc::new(Solis),
        Arc::new(Wolfe),
    ]
}

pub fn find_source(id: &str) -> Result<Arc<dyn Source>> {
    all_sources()
        .into_iter()
        .find(|source| source.id().eq_ignore_ascii_case(id))
        .ok_or_else(|| HousingError::UnknownSource(id.to_string()))
}
