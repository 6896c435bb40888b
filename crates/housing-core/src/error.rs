use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HousingError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Scraping error: {0}")]
    Scraping(String),
    #[error("Failed to load {url}: {message}")]
    Navigation { url: String, message: String },
    #[error("Navigation to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },
    #[error("Invalid selector: {0}")]
    Selector(String),
    #[error("Unknown source: {0}")]
    UnknownSource(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Failed to store listings: {0}")]
    Persist(String),
    #[error("Task error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, HousingError>;

/// Coarse classification used when reporting a failed on-demand scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    LoadFailed,
    TimedOut,
    Other,
}

impl HousingError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            HousingError::Timeout { .. } => FailureKind::TimedOut,
            HousingError::Navigation { .. } => FailureKind::LoadFailed,
            HousingError::Http(e) if e.is_timeout() => FailureKind::TimedOut,
            HousingError::Http(e) if e.is_connect() || e.is_request() || e.is_status() => {
                FailureKind::LoadFailed
            }
            other => {
                let message = other.to_string();
                if message.contains("Load failed") || message.contains("net::") {
                    FailureKind::LoadFailed
                } else if message.to_lowercase().contains("timeout")
                    || message.to_lowercase().contains("timed out")
                {
                    FailureKind::TimedOut
                } else {
                    FailureKind::Other
                }
            }
        }
    }

    /// Advisory message for whoever asked for the scrape.
    pub fn user_message(&self) -> String {
        match self.failure_kind() {
            FailureKind::LoadFailed => "The website failed to load. This could be due to network issues, the website being down, or blocking automated access.".to_string(),
            FailureKind::TimedOut => "The request timed out. The website may be slow or not responding.".to_string(),
            FailureKind::Other => format!("Scraping failed: {}", self),
        }
    }
}
