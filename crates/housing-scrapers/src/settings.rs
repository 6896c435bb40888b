use std::time::Duration;

use crate::renderer::RenderOptions;

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_SCRAPE_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Renderer and scheduling knobs shared by every source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub scrape_interval: Duration,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            scrape_interval: DEFAULT_SCRAPE_INTERVAL,
        }
    }
}

impl ScrapeSettings {
    /// Settings for tests and fixture runs: no settle delay.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_interval_hours(mut self, hours: f64) -> Self {
        if hours > 0.0 {
            if let Ok(interval) = Duration::try_from_secs_f64(hours * 3600.0) {
                self.scrape_interval = interval;
            }
        }
        self
    }

    pub fn with_navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout = Duration::from_secs(secs);
        self
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            timeout: self.navigation_timeout,
            settle_delay: self.settle_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ScrapeSettings::default();
        assert_eq!(settings.navigation_timeout, Duration::from_secs(30));
        assert_eq!(settings.settle_delay, Duration::from_secs(2));
        assert_eq!(settings.scrape_interval, Duration::from_secs(43_200));
    }

    #[test]
    fn test_interval_hours() {
        let settings = ScrapeSettings::default().with_interval_hours(0.5);
        assert_eq!(settings.scrape_interval, Duration::from_secs(1800));

        let unchanged = ScrapeSettings::default().with_interval_hours(-1.0);
        assert_eq!(unchanged.scrape_interval, DEFAULT_SCRAPE_INTERVAL);
    }

    #[test]
    fn test_out_of_range_interval_keeps_default() {
        for hours in [1e16, f64::INFINITY, f64::NAN] {
            let settings = ScrapeSettings::default().with_interval_hours(hours);
            assert_eq!(settings.scrape_interval, DEFAULT_SCRAPE_INTERVAL);
        }
    }
}
