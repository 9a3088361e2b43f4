use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.pro-football-reference.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; nflref_scrape/0.1)";

/// URL shapes of the source site. Paths must stay exactly as the live site serves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    base: String,
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl SiteUrls {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn schedule_url(&self, year: i32) -> String {
        format!("{}/years/{year}/games.htm", self.base)
    }

    pub fn combine_url(&self, year: i32) -> String {
        format!("{}/draft/{year}-combine.htm", self.base)
    }

    /// Resolves a site-relative href such as `/boxscores/201809090nwe.htm`.
    pub fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        if href.starts_with('/') {
            format!("{}{href}", self.base)
        } else {
            format!("{}/{href}", self.base)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub site: SiteUrls,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub fetch_parallelism: usize,
    pub fetch_retries: u32,
    pub retry_backoff: Duration,
    pub page_cache: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            site: SiteUrls::default(),
            request_timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_parallelism: 4,
            fetch_retries: 0,
            retry_backoff: Duration::from_millis(500),
            page_cache: true,
        }
    }
}

impl ScrapeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let site = env::var("NFLREF_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| SiteUrls::new(&v))
            .unwrap_or(defaults.site);
        let user_agent = env::var("NFLREF_USER_AGENT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.user_agent);
        let page_cache = env::var("PAGE_CACHE")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "0" | "false"))
            .unwrap_or(defaults.page_cache);

        Self {
            site,
            request_timeout: Duration::from_secs(env_u64("REQUEST_TIMEOUT_SECS").unwrap_or(20).clamp(1, 300)),
            user_agent,
            fetch_parallelism: fetch_parallelism(),
            fetch_retries: env_u64("FETCH_RETRIES").unwrap_or(0).min(5) as u32,
            retry_backoff: Duration::from_millis(env_u64("RETRY_BACKOFF_MS").unwrap_or(500).min(30_000)),
            page_cache,
        }
    }
}

fn fetch_parallelism() -> usize {
    env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(4)
        .clamp(1, 32)
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|val| val.trim().parse::<u64>().ok())
}
