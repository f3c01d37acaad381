use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::research::Citation;

/// Inbound body of `POST /api/scrape`, discriminated by `mode`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ScrapeRequest {
    Web {
        url: String,
        #[serde(default)]
        query: String,
    },
    Research {
        query: String,
        /// Absent or `null` falls back to [`crate::research::DEFAULT_YEAR_FROM`].
        #[serde(default)]
        year_from: Option<i32>,
        /// Absent or `null` falls back to [`crate::research::DEFAULT_YEAR_TO`].
        #[serde(default)]
        year_to: Option<i32>,
    },
}

impl ScrapeRequest {
    pub fn mode(&self) -> &'static str {
        match self {
            ScrapeRequest::Web { .. } => "web",
            ScrapeRequest::Research { .. } => "research",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebExtractResponse {
    pub status: String,
    pub extracted_info: String,
    pub source_url: String,
    pub word_count: usize,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub status: String,
    pub summary: String,
    pub citations: Vec<Citation>,
    pub papers_found: usize,
    pub query: String,
    pub scraped_at: DateTime<Utc>,
}

/// Success payloads share one response path.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ScrapeResponse {
    Web(WebExtractResponse),
    Research(ResearchResponse),
}
