use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "nflref_scrape";
const PAGES_DIR: &str = "pages";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    version: u32,
    pub url: String,
    pub body: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: i64,
}

/// One JSON file per page. Pages are large, so entries are never pooled in a single file.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> Option<Self> {
        app_cache_dir().map(|dir| Self::new(dir.join(PAGES_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self, url: &str) -> Option<CacheEntry> {
        let raw = fs::read_to_string(self.entry_path(url)).ok()?;
        let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
        if entry.version != CACHE_VERSION || entry.url != url {
            return None;
        }
        Some(entry)
    }

    pub fn store(&self, url: &str, body: &str, etag: Option<String>, last_modified: Option<String>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create page cache dir {}", self.dir.display()))?;
        let entry = CacheEntry {
            version: CACHE_VERSION,
            url: url.to_string(),
            body: body.to_string(),
            etag,
            last_modified,
            fetched_at: Utc::now().timestamp(),
        };
        let path = self.entry_path(url);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(&entry).context("serialize page cache entry")?;
        fs::write(&tmp, json).context("write page cache entry")?;
        fs::rename(&tmp, &path).context("swap page cache entry")?;
        Ok(())
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let stem = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
            .collect::<String>();
        self.dir.join(format!("{stem}.json"))
    }
}

/// GET `url`, revalidating against the cached copy when one exists.
pub fn fetch_html_cached(client: &Client, url: &str, cache: Option<&PageCache>) -> Result<String> {
    let cached_entry = cache.and_then(|c| c.load(url));

    let mut req = client.get(url);
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().context("request failed")?;
    if let Some(body) = resolve_status(resp.status(), cached_entry)? {
        tracing::debug!(url, "page cache revalidated");
        return Ok(body);
    }

    let headers = resp.headers().clone();
    let body = resp.text().context("failed reading body")?;

    if let Some(cache) = cache {
        let etag = header_string(&headers, ETAG);
        let last_modified = header_string(&headers, LAST_MODIFIED);
        if let Err(err) = cache.store(url, &body, etag, last_modified) {
            tracing::warn!(url, error = %err, "page cache write failed");
        }
    }
    Ok(body)
}

/// `Some(body)` when a 304 revalidates the cached copy, `None` when the fresh
/// body should be read, and an error for any other status.
fn resolve_status(status: StatusCode, cached: Option<CacheEntry>) -> Result<Option<String>> {
    if status == StatusCode::NOT_MODIFIED {
        return cached
            .map(|entry| Some(entry.body))
            .ok_or_else(|| anyhow!("received 304 without cache body"));
    }
    if !status.is_success() {
        return Err(anyhow!("http {status}"));
    }
    Ok(None)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn header_string(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
