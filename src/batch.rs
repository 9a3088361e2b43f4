use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combine::{CombineRecord, normalize_combine};
use crate::config::{ScrapeConfig, SiteUrls};
use crate::error::{FailureKind, ScrapeError};
use crate::page::{Document, PageSource, RawPage};
use crate::player_game::{PlayByPlayRecord, PlayerGameRecord, normalize_play_by_play, normalize_players};
use crate::table::TableSlot;
use crate::team_game::{TeamGameRecord, normalize_team_game};

const BOXSCORE_PATH: &str = "/boxscores/";
const BOXSCORE_SUFFIX: &str = ".htm";

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub parallelism: usize,
    pub retries: u32,
    pub retry_backoff: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallelism: 4,
            retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl From<&ScrapeConfig> for BatchOptions {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            parallelism: config.fetch_parallelism,
            retries: config.fetch_retries,
            retry_backoff: config.retry_backoff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl FailedUrl {
    pub fn new(url: &str, err: &ScrapeError) -> Self {
        Self {
            url: url.to_string(),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxscoreData {
    pub players: Vec<PlayerGameRecord>,
    pub teams: [TeamGameRecord; 2],
    pub plays: Vec<PlayByPlayRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoxscoreBatch {
    pub games: BTreeMap<String, BoxscoreData>,
    pub failures: Vec<FailedUrl>,
}

impl BoxscoreBatch {
    pub fn players(&self) -> impl Iterator<Item = &PlayerGameRecord> {
        self.games.values().flat_map(|g| g.players.iter())
    }

    pub fn team_games(&self) -> impl Iterator<Item = &TeamGameRecord> {
        self.games.values().flat_map(|g| g.teams.iter())
    }

    pub fn plays(&self) -> impl Iterator<Item = &PlayByPlayRecord> {
        self.games.values().flat_map(|g| g.plays.iter())
    }

    /// URLs that failed on the network and may succeed on a later run.
    pub fn retryable_urls(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter(|f| f.kind == FailureKind::Fetch)
            .map(|f| f.url.clone())
            .collect()
    }

    pub fn merge(&mut self, other: BoxscoreBatch) {
        self.games.extend(other.games);
        self.failures.extend(other.failures);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombineBatch {
    pub records: Vec<CombineRecord>,
    pub failures: Vec<FailedUrl>,
}

/// Fetches and normalizes one boxscore page. Runs entirely on the calling thread.
pub fn scrape_boxscore_page(page: RawPage) -> Result<BoxscoreData, ScrapeError> {
    let document = page.into_document();
    Ok(BoxscoreData {
        players: normalize_players(&document)?,
        teams: normalize_team_game(&document)?,
        plays: normalize_play_by_play(&document)?,
    })
}

/// Boxscore links on a season schedule page, resolved and deduplicated.
pub fn boxscore_urls_from_schedule(document: &Document, site: &SiteUrls) -> Result<BTreeSet<String>, ScrapeError> {
    let hrefs = document.anchor_hrefs(TableSlot::Schedule)?;
    Ok(hrefs
        .iter()
        .filter(|href| href.contains(BOXSCORE_PATH) && href.ends_with(BOXSCORE_SUFFIX))
        .map(|href| site.resolve(href))
        .collect())
}

/// Combine page URLs for `[start_year, end_year)`.
pub fn combine_urls_for_range(site: &SiteUrls, start_year: i32, end_year: i32) -> Vec<String> {
    (start_year..end_year).map(|year| site.combine_url(year)).collect()
}

pub struct BatchRunner<S> {
    source: S,
    site: SiteUrls,
    options: BatchOptions,
}

impl<S: PageSource> BatchRunner<S> {
    pub fn new(source: S, site: SiteUrls, options: BatchOptions) -> Self {
        Self {
            source,
            site,
            options,
        }
    }

    pub fn site(&self) -> &SiteUrls {
        &self.site
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn boxscore_urls_for_year(&self, year: i32) -> Result<BTreeSet<String>, ScrapeError> {
        let url = self.site.schedule_url(year);
        let document = self.fetch_with_retry(&url)?.into_document();
        let urls = boxscore_urls_from_schedule(&document, &self.site)?;
        tracing::info!(year, boxscores = urls.len(), "discovered boxscore urls");
        Ok(urls)
    }

    pub fn combine_urls_for_range(&self, start_year: i32, end_year: i32) -> Vec<String> {
        combine_urls_for_range(&self.site, start_year, end_year)
    }

    /// A failing URL is recorded and skipped; the rest of the batch still runs.
    pub fn scrape_boxscores<I>(&self, urls: I) -> BoxscoreBatch
    where
        I: IntoIterator<Item = String>,
    {
        let urls = urls.into_iter().collect::<Vec<_>>();
        tracing::info!(urls = urls.len(), parallelism = self.options.parallelism, "scraping boxscores");

        let results = self.with_fetch_pool(|| {
            urls.par_iter()
                .map(|url| {
                    let outcome = self.fetch_with_retry(url).and_then(scrape_boxscore_page);
                    (url.clone(), outcome)
                })
                .collect::<Vec<_>>()
        });

        let mut batch = BoxscoreBatch::default();
        for (url, outcome) in results {
            match outcome {
                Ok(data) => {
                    batch.games.insert(url, data);
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "boxscore skipped");
                    batch.failures.push(FailedUrl::new(&url, &err));
                }
            }
        }
        tracing::info!(
            games = batch.games.len(),
            failures = batch.failures.len(),
            "boxscore batch complete"
        );
        batch
    }

    /// Discovers a season's boxscores and scrapes them. Schedule failure aborts.
    pub fn scrape_season(&self, year: i32) -> Result<BoxscoreBatch, ScrapeError> {
        let urls = self.boxscore_urls_for_year(year)?;
        Ok(self.scrape_boxscores(urls))
    }

    /// Several seasons merged into one batch. A season whose schedule cannot be
    /// loaded is recorded as a failure on its schedule URL and the rest continue.
    pub fn scrape_seasons(&self, years: &[i32]) -> BoxscoreBatch {
        let mut batch = BoxscoreBatch::default();
        for &year in years {
            match self.scrape_season(year) {
                Ok(season) => batch.merge(season),
                Err(err) => {
                    tracing::warn!(year, error = %err, "schedule unavailable");
                    batch
                        .failures
                        .push(FailedUrl::new(&self.site.schedule_url(year), &err));
                }
            }
        }
        batch
    }

    pub fn scrape_combine(&self, start_year: i32, end_year: i32) -> CombineBatch {
        let years = (start_year..end_year)
            .map(|year| (year, self.site.combine_url(year)))
            .collect::<Vec<_>>();

        let results = self.with_fetch_pool(|| {
            years
                .par_iter()
                .map(|(year, url)| {
                    let outcome = self
                        .fetch_with_retry(url)
                        .and_then(|page| normalize_combine(&page.into_document(), *year));
                    (url.clone(), outcome)
                })
                .collect::<Vec<_>>()
        });

        let mut batch = CombineBatch::default();
        for (url, outcome) in results {
            match outcome {
                Ok(records) => {
                    tracing::info!(url = %url, players = records.len(), "combine page normalized");
                    batch.records.extend(records);
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "combine page skipped");
                    batch.failures.push(FailedUrl::new(&url, &err));
                }
            }
        }
        batch
    }

    fn fetch_with_retry(&self, url: &str) -> Result<RawPage, ScrapeError> {
        let mut attempt = 0u32;
        loop {
            match self.source.fetch(url) {
                Ok(page) => return Ok(page),
                Err(err) if err.is_retryable() && attempt < self.options.retries => {
                    attempt += 1;
                    tracing::debug!(url, attempt, error = %err, "retrying fetch");
                    thread::sleep(self.options.retry_backoff);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn with_fetch_pool<T>(&self, action: impl FnOnce() -> T + Send) -> T
    where
        T: Send,
    {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.parallelism.max(1))
            .build()
        {
            Ok(pool) => pool.install(action),
            Err(_) => action(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_range_is_half_open() {
        let urls = combine_urls_for_range(&SiteUrls::default(), 2015, 2018);
        assert_eq!(
            urls,
            vec![
                "https://www.pro-football-reference.com/draft/2015-combine.htm",
                "https://www.pro-football-reference.com/draft/2016-combine.htm",
                "https://www.pro-football-reference.com/draft/2017-combine.htm",
            ]
        );
        assert!(combine_urls_for_range(&SiteUrls::default(), 2018, 2018).is_empty());
    }

    #[test]
    fn schedule_links_are_deduplicated() {
        let document = Document::parse(
            "https://www.pro-football-reference.com/years/2018/games.htm",
            r#"<div class="overthrow table_container"><table><tbody>
                <tr><td><a href="/teams/phi/2018.htm">Eagles</a></td>
                    <td><a href="/boxscores/201809060phi.htm">boxscore</a></td></tr>
                <tr><td><a href="/boxscores/201809060phi.htm">boxscore</a></td></tr>
                <tr><td><a href="/boxscores/">index</a></td></tr>
            </tbody></table></div>"#,
        );
        let urls = boxscore_urls_from_schedule(&document, &SiteUrls::default())
            .expect("schedule should parse");
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://www.pro-football-reference.com/boxscores/201809060phi.htm"));
    }
}
