#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use scholar_scrape::api::routes::create_router;
use scholar_scrape::config::Config;
use scholar_scrape::error::{AppError, Result};
use scholar_scrape::llm::TextGenerator;
use scholar_scrape::scraper::BROWSER_USER_AGENT;
use scholar_scrape::AppState;
use tower::ServiceExt;

static INIT: Once = Once::new();

pub fn init_test_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Generator that answers with a fixed reply and remembers every prompt.
pub struct CannedGenerator {
    reply: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(reply.to_string()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self { reply: Err(message.to_string()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(AppError::LlmError)
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

pub fn test_config(scholar_base_url: &str) -> Config {
    Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        gemini_api_key: "test-key".into(),
        gemini_model: "test-model".into(),
        gemini_base_url: "http://127.0.0.1:1".into(),
        scholar_base_url: scholar_base_url.trim_end_matches('/').to_string(),
    }
}

pub fn app(scholar_base_url: &str, llm: Arc<CannedGenerator>) -> Router {
    create_router(AppState {
        config: Arc::new(test_config(scholar_base_url)),
        llm,
    })
}

pub async fn post_scrape(app: Router, body: impl Into<Body>) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/scrape")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

/// Request matcher: the outgoing fetch carried the spoofed browser user agent.
pub fn sent_browser_user_agent(req: &wiremock::Request) -> bool {
    req.headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        == Some(BROWSER_USER_AGENT)
}
