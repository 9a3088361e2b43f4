use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use scraper::Html;

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::http_cache::{PageCache, fetch_html_cached};
use crate::http_client::build_http_client;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// A fetched page with comment markers already stripped from `body`.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl RawPage {
    pub fn new(url: &str, raw_body: &str) -> Self {
        Self {
            url: url.to_string(),
            body: strip_comment_markers(raw_body),
            fetched_at: Utc::now(),
        }
    }

    pub fn into_document(self) -> Document {
        Document::parse(&self.url, &self.body)
    }
}

/// Parsed DOM of one page. Not `Send`; parse and normalize on the thread that fetched.
pub struct Document {
    pub url: String,
    pub html: Html,
}

impl Document {
    pub fn parse(url: &str, body: &str) -> Self {
        Self {
            url: url.to_string(),
            html: Html::parse_document(body),
        }
    }
}

/// Removes the literal comment markers the site wraps around secondary tables.
/// Plain substring removal; the contents of "comments" become live markup.
pub fn strip_comment_markers(raw: &str) -> String {
    raw.replace(COMMENT_OPEN, "").replace(COMMENT_CLOSE, "")
}

pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<RawPage, ScrapeError>;
}

pub struct HttpPageSource {
    client: Client,
    cache: Option<PageCache>,
}

impl HttpPageSource {
    pub fn new(config: &ScrapeConfig) -> anyhow::Result<Self> {
        let client = build_http_client(config)?;
        let cache = if config.page_cache {
            PageCache::default_location()
        } else {
            None
        };
        Ok(Self { client, cache })
    }

    pub fn with_cache(mut self, cache: Option<PageCache>) -> Self {
        self.cache = cache;
        self
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<RawPage, ScrapeError> {
        tracing::debug!(url, "fetching page");
        let body = fetch_html_cached(&self.client, url, self.cache.as_ref())
            .map_err(|err| ScrapeError::fetch(url, format!("{err:#}")))?;
        Ok(RawPage::new(url, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markers_without_touching_content() {
        let raw = "<div><!--<table><tr><td>x</td></tr></table>--></div>";
        assert_eq!(
            strip_comment_markers(raw),
            "<div><table><tr><td>x</td></tr></table></div>"
        );
    }

    #[test]
    fn strips_unbalanced_markers_literally() {
        assert_eq!(strip_comment_markers("a-->b<!--c"), "abc");
    }

    #[test]
    fn raw_page_body_is_stripped() {
        let page = RawPage::new("https://x/y.htm", "<p><!--hidden--></p>");
        assert_eq!(page.body, "<p>hidden</p>");
    }

    #[test]
    fn unreachable_host_maps_to_fetch_error() {
        let config = ScrapeConfig {
            request_timeout: std::time::Duration::from_secs(2),
            page_cache: false,
            ..ScrapeConfig::default()
        };
        let source = HttpPageSource::new(&config).expect("client should build");
        let url = "http://127.0.0.1:9/boxscores/201809090nwe.htm";
        match source.fetch(url) {
            Err(err @ ScrapeError::Fetch { .. }) => {
                assert!(err.is_retryable());
                assert!(err.to_string().contains(url));
            }
            other => panic!("expected a fetch error, got {:?}", other.map(|p| p.url)),
        }
    }
}
