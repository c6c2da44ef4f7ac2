//! DuckDuckGo HTML search. No API key required.

use crate::error::SearchError;
use crate::traits::WebSearch;
use crate::{SearchQuery, SearchResult};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(user_agent: &str) -> Result<Self, SearchError> {
        Self::with_endpoint(DUCKDUCKGO_HTML_URL, user_agent)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, user_agent: &str) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder().user_agent(user_agent).build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query.text()), ("b", String::new())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status {
                status: response.status(),
            });
        }

        let html = response.text().await?;
        parse_results(&html, query.max_results)
    }
}

fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);
    let result_selector = selector(".result")?;
    let link_selector = selector(".result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut results = Vec::new();
    for element in document.select(&result_selector) {
        if results.len() >= max_results {
            break;
        }

        let Some(link) = element.select(&link_selector).next() else {
            continue;
        };
        let url = link
            .value()
            .attr("href")
            .map(resolve_redirect)
            .unwrap_or_default();
        if url.is_empty() {
            continue;
        }

        let title = link.text().collect::<String>().trim().to_string();
        let snippet = element
            .select(&snippet_selector)
            .next()
            .map(|snippet| snippet.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(SearchResult {
            url,
            title,
            snippet,
        });
    }

    if results.is_empty() {
        tracing::warn!("no results found in DuckDuckGo HTML response");
    }

    Ok(results)
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|error| SearchError::HtmlParse(format!("{css}: {error:?}")))
}

/// Result links point at `//duckduckgo.com/l/?uddg=<encoded target>&rut=...`.
fn resolve_redirect(href: &str) -> String {
    if let Some(position) = href.find("uddg=") {
        let start = position + "uddg=".len();
        let end = href[start..].find('&').map_or(href.len(), |offset| start + offset);
        let encoded = &href[start..end];
        urlencoding::decode(encoded)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| encoded.to_string())
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    }
}
