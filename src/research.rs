use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use crate::error::{AppError, Result};

pub const MAX_PAPERS: usize = 10;
pub const DEFAULT_YEAR_FROM: i32 = 2020;
pub const DEFAULT_YEAR_TO: i32 = 2025;

const NOT_AVAILABLE: &str = "N/A";

static RESULT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.gs_ri").expect("Failed to parse result selector")
});
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h3.gs_rt").expect("Failed to parse title selector")
});
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to parse link selector")
});
static AUTHORS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.gs_a").expect("Failed to parse authors selector")
});
static SNIPPET_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.gs_rs").expect("Failed to parse snippet selector")
});

/// One search hit as scraped from the results page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paper {
    pub title: String,
    pub authors: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub title: String,
    pub authors: String,
    pub year: String,
    pub venue: String,
    pub url: String,
}

pub fn build_search_url(base_url: &str, query: &str, year_from: i32, year_to: i32) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/scholar", base_url.trim_end_matches('/')))
        .map_err(|e| AppError::ConfigError(format!("Invalid scholar base URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("as_ylo", &year_from.to_string())
        .append_pair("as_yhi", &year_to.to_string());
    Ok(url)
}

/// Up to [`MAX_PAPERS`] result blocks. Missing pieces degrade instead of failing.
pub fn parse_papers(html: &str) -> Vec<Paper> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_SELECTOR)
        .take(MAX_PAPERS)
        .map(|block| {
            let heading = block.select(&TITLE_SELECTOR).next();

            let title = heading
                .map(element_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            let url = heading
                .and_then(|h| h.select(&LINK_SELECTOR).next())
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string();
            let authors = block
                .select(&AUTHORS_SELECTOR)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            let snippet = block
                .select(&SNIPPET_SELECTOR)
                .next()
                .map(element_text)
                .unwrap_or_default();

            Paper { title, authors, snippet, url }
        })
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-effort citation from a scraped result.
///
/// The authors line usually reads `Authors - Venue, Year - host`, so it is split
/// on `-`. Hyphenated names or venues break this; treat the output as a hint,
/// not bibliographic truth.
pub fn citation_from_paper(paper: &Paper) -> Citation {
    let parts: Vec<&str> = paper.authors.split('-').map(str::trim).collect();

    let (authors, year, venue) = if parts.len() < 2 {
        (paper.authors.trim().to_string(), NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string())
    } else {
        let (venue, year) = split_venue_year(parts[1]);
        (parts[0].to_string(), year, venue)
    };

    Citation {
        title: paper.title.clone(),
        authors,
        year,
        venue,
        url: paper.url.clone(),
    }
}

fn split_venue_year(text: &str) -> (String, String) {
    let (head, last) = match text.rsplit_once(',') {
        Some((head, last)) => (head.trim(), last.trim()),
        None => ("", text.trim()),
    };

    if last.len() == 4 && last.chars().all(|c| c.is_ascii_digit()) {
        let venue = if head.is_empty() { NOT_AVAILABLE } else { head };
        return (venue.to_string(), last.to_string());
    }

    let venue = if text.trim().is_empty() { NOT_AVAILABLE } else { text.trim() };
    (venue.to_string(), NOT_AVAILABLE.to_string())
}

pub fn build_research_prompt(query: &str, year_from: i32, year_to: i32, papers: &[Paper]) -> String {
    let mut prompt = format!(
        "You are a research assistant. Summarize the research landscape for the topic \"{}\" between {} and {}.\n\n",
        query, year_from, year_to
    );

    if papers.is_empty() {
        prompt.push_str("No papers were found in the search results. Explain briefly that nothing matched and suggest related search terms.\n");
        return prompt;
    }

    prompt.push_str("Papers found:\n\n");
    for (i, paper) in papers.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}\n   Authors: {}\n   Summary: {}\n\n",
            i + 1,
            paper.title,
            paper.authors,
            paper.snippet
        ));
    }
    prompt.push_str(
        "Provide:\n\
         1. An overview of the main research themes\n\
         2. Key findings and trends across these papers\n\
         3. Gaps or open questions worth exploring\n\n\
         Format the answer in clear Markdown.",
    );
    prompt
}
