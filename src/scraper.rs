use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use once_cell::sync::Lazy;
use crate::error::{AppError, Result};

/// Cleaned page text beyond this many characters is never sent to the model.
pub const MAX_CONTENT_CHARS: usize = 30_000;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const DEFAULT_EXTRACTION_QUERY: &str = "Extract the main information from this page";

const SKIPPED_TAGS: [&str; 4] = ["script", "style", "nav", "footer"];

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to build HTTP client")
});

/// GETs `url` and returns the body. Non-2xx statuses are errors.
pub async fn fetch_html(url: &str) -> Result<String> {
    let response = CLIENT
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| AppError::FetchError(format!("Upstream returned an error status: {}", e)))?;
    let html = response.text().await?;
    Ok(html)
}

/// Visible text of a document, one trimmed non-empty line per text fragment.
///
/// `script`, `style`, `nav` and `footer` subtrees are skipped entirely.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut fragments = Vec::new();
    collect_text(document.root_element(), &mut fragments);

    fragments
        .iter()
        .flat_map(|fragment| fragment.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(text),
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_extraction_prompt(query: &str, content: &str) -> String {
    let query = match query.trim() {
        "" => DEFAULT_EXTRACTION_QUERY,
        q => q,
    };

    let mut result = String::with_capacity(content.len() + query.len() + 400);
    result.push_str("You are an expert information extractor. Read the webpage content below and answer the user's request.\n\n");
    result.push_str("User request: ");
    result.push_str(query);
    result.push_str("\n\nWebpage content:\n");
    result.push_str(content);
    result.push_str("\n\nProvide the requested information in clear, well-structured Markdown. Use headers and bullet points where they help, and only include facts present in the content.");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_content_never_survives() {
        let text = extract_text("<html><body><script>alert(1)</script><p>Hello</p></body></html>");
        assert!(text.contains("Hello"));
        assert!(!text.contains("alert(1)"));
    }

    #[test]
    fn style_nav_and_footer_are_skipped() {
        let html = r#"
            <html>
              <head><title>Page</title><style>body { color: red; }</style></head>
              <body>
                <nav><a href="/">Home</a><a href="/about">About</a></nav>
                <article><h1>Headline</h1><p>Body text</p></article>
                <footer>Copyright 2024</footer>
              </body>
            </html>"#;
        let text = extract_text(html);

        assert!(text.contains("Headline"));
        assert!(text.contains("Body text"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("About"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn blank_lines_are_dropped_and_lines_trimmed() {
        let html = "<body><pre>first\n\n   \n\t\n   second   \n\n</pre><p>  third </p></body>";
        let text = extract_text(html);

        assert_eq!(text, "first\nsecond\nthird");
        assert!(text.lines().all(|line| !line.trim().is_empty()));
    }

    #[test]
    fn empty_document_yields_empty_text() {
        assert_eq!(extract_text(""), "");
        assert_eq!(extract_text("<script>only()</script>"), "");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 5), "héllo");
        assert_eq!(truncate_chars(text, 100), text);
        assert_eq!(truncate_chars("", 3), "");

        let long = "é".repeat(MAX_CONTENT_CHARS + 10);
        assert_eq!(truncate_chars(&long, MAX_CONTENT_CHARS).chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn prompt_carries_query_and_content() {
        let prompt = build_extraction_prompt("list the prices", "Widget: $5");
        assert!(prompt.contains("list the prices"));
        assert!(prompt.contains("Widget: $5"));

        let fallback = build_extraction_prompt("   ", "content");
        assert!(fallback.contains(DEFAULT_EXTRACTION_QUERY));
    }
}
