//! External collaborators used by the research tools: page fetch, web search
//! and video transcripts.

use std::time::Duration;

use async_trait::async_trait;
use htmd::HtmlToMarkdown;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SleuthError;
use crate::provider::http::transport_error;

const DEFAULT_SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_TRANSCRIPT_URL: &str = "https://www.youtube.com/api/timedtext";

/// One web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// I/O the research tools depend on.
#[async_trait]
pub trait ResearchBackend: Send + Sync {
    /// Page content as plain text with links preserved.
    async fn fetch_page(&self, url: &str) -> Result<String, SleuthError>;

    /// Up to `limit` search results for `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SleuthError>;

    /// Transcript text of a video.
    async fn video_transcript(&self, video_id: &str) -> Result<String, SleuthError>;
}

/// Plain-HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpResearchBackend {
    client: reqwest::Client,
    timeout: Duration,
    search_url: String,
    transcript_url: String,
}

impl HttpResearchBackend {
    pub fn new(timeout: Duration) -> Result<Self, SleuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SleuthError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            transcript_url: DEFAULT_TRANSCRIPT_URL.to_string(),
        })
    }

    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    pub fn with_transcript_url(mut self, url: impl Into<String>) -> Self {
        self.transcript_url = url.into();
        self
    }

    async fn get_text(&self, url: Url) -> Result<String, SleuthError> {
        debug!(url = %url, "Fetching");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SleuthError::api(
                status.as_u16(),
                format!("failed to fetch {url}"),
            ));
        }
        resp.text().await.map_err(|e| transport_error(e, self.timeout))
    }
}

#[async_trait]
impl ResearchBackend for HttpResearchBackend {
    async fn fetch_page(&self, url: &str) -> Result<String, SleuthError> {
        let html = self.get_text(parse_url(&normalize_url(url))?).await?;
        Ok(html_to_text(&html))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SleuthError> {
        let url = Url::parse_with_params(&self.search_url, &[("q", query)])
            .map_err(|e| SleuthError::Configuration(format!("invalid search url: {e}")))?;
        let html = self.get_text(url).await?;
        Ok(parse_search_results(&html, limit))
    }

    async fn video_transcript(&self, video_id: &str) -> Result<String, SleuthError> {
        let url = Url::parse_with_params(&self.transcript_url, &[("lang", "en"), ("v", video_id)])
            .map_err(|e| SleuthError::Configuration(format!("invalid transcript url: {e}")))?;
        let xml = self.get_text(url).await?;
        let text = parse_transcript(&xml);
        if text.is_empty() {
            return Err(SleuthError::InvalidState(format!(
                "no transcript available for video {video_id}"
            )));
        }
        Ok(text)
    }
}

fn parse_url(url: &str) -> Result<Url, SleuthError> {
    Url::parse(url).map_err(|e| SleuthError::InvalidArgument(format!("invalid url '{url}': {e}")))
}

/// Prefix scheme-less URLs with `http://`.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Extract the video id from a watch or embed URL.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    let id = if let Some((_, rest)) = url.split_once("youtube.com/embed/") {
        rest.split(['?', '&', '/']).next()
    } else if let Some((_, rest)) = url.split_once("youtube.com/watch?v=") {
        rest.split('&').next()
    } else if let Some((_, rest)) = url.split_once("youtu.be/") {
        rest.split(['?', '&']).next()
    } else {
        None
    };
    id.filter(|id| !id.is_empty())
}

/// Elements whose content never helps the model.
const NOISE_TAGS: [&str; 7] = ["script", "style", "noscript", "svg", "head", "iframe", "template"];

/// Convert an HTML page to markdown, keeping links as `[text](href)`.
pub fn html_to_text(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(NOISE_TAGS.to_vec())
        .build();
    match converter.convert(html) {
        Ok(markdown) => markdown.trim().to_string(),
        Err(err) => {
            debug!(error = %err, "Markdown conversion failed; falling back to document text");
            let document = Html::parse_document(html);
            collapse_whitespace(&document.root_element().text().collect::<String>())
        }
    }
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    Selector::parse(selector)
        .map(|sel| document.select(&sel).collect())
        .unwrap_or_default()
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse DuckDuckGo's HTML results page.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    let snippets: Vec<String> = select_all(&document, "a.result__snippet")
        .into_iter()
        .map(element_text)
        .collect();

    select_all(&document, "a.result__a")
        .into_iter()
        .enumerate()
        .filter_map(|(i, link)| {
            let href = link.value().attr("href")?;
            Some(SearchHit {
                title: element_text(link),
                href: resolve_result_href(href),
                body: snippets.get(i).cloned().unwrap_or_default(),
            })
        })
        .take(limit)
        .collect()
}

/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>`.
fn resolve_result_href(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// Caption text is entity-encoded twice in the timed-text XML.
fn parse_transcript(xml: &str) -> String {
    let document = Html::parse_fragment(xml);
    select_all(&document, "text")
        .into_iter()
        .map(|line| {
            let once = line.text().collect::<String>();
            Html::parse_fragment(&once)
                .root_element()
                .text()
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut the Crunchbase financials page down to the funding section.
///
/// The section starts after the `Organization` heading and ends at the
/// upsell banner.
pub fn trim_financials(page: &str) -> Result<String, SleuthError> {
    let mut offset = 0;
    let mut start = None;
    for line in page.split_inclusive('\n') {
        offset += line.len();
        if line.trim().trim_start_matches('#').trim() == "Organization" {
            start = Some(offset);
            break;
        }
    }
    let start = start.ok_or_else(|| {
        SleuthError::InvalidState("financials page has no Organization section".into())
    })?;
    let after = &page[start..];
    let section = after
        .split_once("Unlock even more features")
        .map_or(after, |(before, _)| before);
    Ok(section.trim().to_string())
}
