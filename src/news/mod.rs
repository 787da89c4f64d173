//! News scraping
//!
//! Best effort per ticker: a ticker whose feed fails or times out simply
//! contributes no headlines. Scrapers never fail the batch.

use crate::error::OrchestrationError;
use crate::models::{Headline, PortfolioSnapshot};
use crate::Result;
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

const YAHOO_RSS_URL: &str = "https://feeds.finance.yahoo.com/rss/2.0/headline";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

lazy_static! {
    static ref ITEM_RE: Regex = Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").unwrap();
    static ref TITLE_RE: Regex = Regex::new(r"(?s)<title\b[^>]*>(.*?)</title>").unwrap();
    static ref CDATA_RE: Regex = Regex::new(r"(?s)^<!\[CDATA\[(.*)\]\]>$").unwrap();
}

/// Trait for headline sources
#[async_trait::async_trait]
pub trait NewsScraper: Send + Sync {
    /// Headlines for the portfolio's tickers, tagged `"[TICKER] title"`,
    /// deduplicated.
    async fn scrape(&self, portfolio: &PortfolioSnapshot) -> Vec<Headline>;
}

/// Yahoo Finance per-ticker RSS feeds, fetched concurrently.
pub struct YahooRssScraper {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl YahooRssScraper {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: YAHOO_RSS_URL.to_string(),
            timeout,
        })
    }

    /// Point at a different feed host (mirrors, local fixtures).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_titles(&self, ticker: &str, region: &str, lang: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("s", ticker), ("region", region), ("lang", lang)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrchestrationError::ScraperError(format!(
                "feed for {} returned {}",
                ticker, status
            )));
        }

        let body = response.text().await?;
        Ok(parse_rss_titles(&body))
    }

    async fn scrape_ticker(&self, ticker: &str, region: &str, lang: &str) -> Vec<Headline> {
        debug!(ticker, region, "Scraping news");

        match tokio::time::timeout(self.timeout, self.fetch_titles(ticker, region, lang)).await {
            Ok(Ok(titles)) => titles
                .into_iter()
                .map(|title| format!("[{}] {}", ticker, title))
                .collect(),
            Ok(Err(e)) => {
                warn!(ticker, error = %e, "Could not fetch news");
                Vec::new()
            }
            Err(_) => {
                warn!(ticker, timeout_secs = self.timeout.as_secs(), "News fetch timed out");
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl NewsScraper for YahooRssScraper {
    async fn scrape(&self, portfolio: &PortfolioSnapshot) -> Vec<Headline> {
        let fetches = portfolio.iter().map(|(ticker, record)| {
            self.scrape_ticker(ticker, &record.region, &record.lang)
        });

        let per_ticker = join_all(fetches).await;
        let headlines = dedup_preserving_order(per_ticker.into_iter().flatten());

        info!(
            tickers = portfolio.len(),
            headline_count = headlines.len(),
            "Scrape complete"
        );
        headlines
    }
}

/// Fixed headlines keyed by ticker, for development & testing.
/// Only tickers present in the scraped portfolio contribute.
#[derive(Debug, Clone, Default)]
pub struct StaticScraper {
    titles_by_ticker: HashMap<String, Vec<String>>,
}

impl StaticScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_titles(mut self, ticker: &str, titles: &[&str]) -> Self {
        self.titles_by_ticker
            .entry(ticker.to_string())
            .or_default()
            .extend(titles.iter().map(|t| t.to_string()));
        self
    }
}

#[async_trait::async_trait]
impl NewsScraper for StaticScraper {
    async fn scrape(&self, portfolio: &PortfolioSnapshot) -> Vec<Headline> {
        let tagged = portfolio.keys().flat_map(|ticker| {
            self.titles_by_ticker
                .get(ticker)
                .into_iter()
                .flatten()
                .map(move |title| format!("[{}] {}", ticker, title))
        });
        dedup_preserving_order(tagged)
    }
}

/// Titles of every `<item>` in an RSS document (channel title excluded).
pub fn parse_rss_titles(xml: &str) -> Vec<String> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|item| {
            let body = item.get(1)?.as_str();
            let raw = TITLE_RE.captures(body)?.get(1)?.as_str().trim();
            let text = match CDATA_RE.captures(raw) {
                Some(c) => c.get(1).map_or("", |m| m.as_str()).trim().to_string(),
                None => decode_entities(raw),
            };
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn dedup_preserving_order(headlines: impl Iterator<Item = Headline>) -> Vec<Headline> {
    let mut seen = HashSet::new();
    headlines.filter(|h| seen.insert(h.clone())).collect()
}
