use axum::{
    body::Bytes,
    routing::post,
    Router,
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use chrono::Utc;

use crate::error::{Result, AppError};
use crate::api::models::{ScrapeRequest, ScrapeResponse, WebExtractResponse, ResearchResponse};
use crate::api::response;
use crate::research::{
    build_research_prompt, build_search_url, citation_from_paper, parse_papers, DEFAULT_YEAR_FROM,
    DEFAULT_YEAR_TO,
};
use crate::scraper::{fetch_html, extract_text, truncate_chars, build_extraction_prompt, MAX_CONTENT_CHARS};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape_handler))
        // Oversized bodies must reach the JSON decoder, not a 413.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// Takes the raw body so malformed JSON lands on the same 500 envelope as
/// every other failure.
async fn scrape_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let start_time = std::time::Instant::now();

    let result = match serde_json::from_slice::<ScrapeRequest>(&body) {
        Ok(req) => {
            tracing::info!(mode = req.mode(), "processing scrape request");
            process_scrape_request(&state, req).await
        }
        Err(e) => Err(AppError::from(e)),
    };

    let elapsed = start_time.elapsed();
    match result {
        Ok(data) => {
            tracing::info!(?elapsed, "request completed");
            response::success(data).into_response()
        }
        Err(err) => {
            tracing::warn!(kind = err.kind(), error = %err, ?elapsed, "request failed");
            err.into_response()
        }
    }
}

async fn process_scrape_request(state: &AppState, req: ScrapeRequest) -> Result<ScrapeResponse> {
    match req {
        ScrapeRequest::Web { url, query } => {
            process_web_request(state, url, &query).await.map(ScrapeResponse::Web)
        }
        ScrapeRequest::Research { query, year_from, year_to } => {
            let year_from = year_from.unwrap_or(DEFAULT_YEAR_FROM);
            let year_to = year_to.unwrap_or(DEFAULT_YEAR_TO);
            process_research_request(state, query, year_from, year_to)
                .await
                .map(ScrapeResponse::Research)
        }
    }
}

async fn process_web_request(state: &AppState, url: String, query: &str) -> Result<WebExtractResponse> {
    tracing::info!(%url, "fetching page");
    let fetch_start = std::time::Instant::now();
    let html = fetch_html(&url).await?;
    tracing::debug!(elapsed = ?fetch_start.elapsed(), bytes = html.len(), "page fetched");

    let text = extract_text(&html);
    let word_count = text.split_whitespace().count();
    let content = truncate_chars(&text, MAX_CONTENT_CHARS);
    if content.len() < text.len() {
        tracing::debug!(chars = MAX_CONTENT_CHARS, "page text truncated");
    }

    let prompt = build_extraction_prompt(query, content);
    tracing::debug!(prompt_bytes = prompt.len(), word_count, "calling {}", state.llm.model_name());

    let llm_start = std::time::Instant::now();
    let extracted_info = state.llm.generate(&prompt).await?;
    tracing::debug!(elapsed = ?llm_start.elapsed(), "model responded");

    Ok(WebExtractResponse {
        status: "success".to_string(),
        extracted_info,
        source_url: url,
        word_count,
        scraped_at: Utc::now(),
    })
}

async fn process_research_request(
    state: &AppState,
    query: String,
    year_from: i32,
    year_to: i32,
) -> Result<ResearchResponse> {
    let search_url = build_search_url(&state.config.scholar_base_url, &query, year_from, year_to)?;
    tracing::info!(%query, year_from, year_to, "searching scholar");

    let html = fetch_html(search_url.as_str()).await?;
    let papers = parse_papers(&html);
    tracing::info!(papers = papers.len(), "parsed search results");

    let prompt = build_research_prompt(&query, year_from, year_to, &papers);
    let summary = state.llm.generate(&prompt).await?;

    let citations = papers.iter().map(citation_from_paper).collect();

    Ok(ResearchResponse {
        status: "success".to_string(),
        summary,
        citations,
        papers_found: papers.len(),
        query,
        scraped_at: Utc::now(),
    })
}
