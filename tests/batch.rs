use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use nflref_scrape::batch::{BatchOptions, BatchRunner};
use nflref_scrape::config::SiteUrls;
use nflref_scrape::error::{FailureKind, ScrapeError};
use nflref_scrape::page::{PageSource, RawPage};

const BASE: &str = "https://www.pro-football-reference.com";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Serves canned pages; unknown URLs fail like a 404. Records every request.
#[derive(Default)]
struct FixtureSource {
    pages: HashMap<String, String>,
    flaky: Mutex<HashMap<String, u32>>,
    requests: Mutex<Vec<String>>,
}

impl FixtureSource {
    fn with_page(mut self, url: &str, body: String) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }

    /// First `failures` requests for `url` fail before the page is served.
    fn flaky(self, url: &str, failures: u32) -> Self {
        self.flaky
            .lock()
            .expect("lock")
            .insert(url.to_string(), failures);
        self
    }

    fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .expect("lock")
            .iter()
            .filter(|u| *u == url)
            .count()
    }
}

impl PageSource for FixtureSource {
    fn fetch(&self, url: &str) -> Result<RawPage, ScrapeError> {
        self.requests.lock().expect("lock").push(url.to_string());
        if let Some(left) = self.flaky.lock().expect("lock").get_mut(url)
            && *left > 0
        {
            *left -= 1;
            return Err(ScrapeError::fetch(url, "connection reset"));
        }
        match self.pages.get(url) {
            Some(body) => Ok(RawPage::new(url, body)),
            None => Err(ScrapeError::fetch(url, "http 404 Not Found")),
        }
    }
}

fn options(retries: u32) -> BatchOptions {
    BatchOptions {
        parallelism: 2,
        retries,
        retry_backoff: Duration::ZERO,
    }
}

fn boxscore_url(id: &str) -> String {
    format!("{BASE}/boxscores/{id}.htm")
}

#[test]
fn failing_url_is_recorded_and_batch_continues() {
    let good = boxscore_url("201809090nwe");
    let missing = boxscore_url("201809060phi");
    let broken = boxscore_url("201809090rav");
    let source = FixtureSource::default()
        .with_page(&good, read_fixture("boxscore.html"))
        .with_page(&broken, "<html><body><p>maintenance</p></body></html>".to_string());
    let runner = BatchRunner::new(source, SiteUrls::default(), options(0));

    let batch = runner.scrape_boxscores(vec![missing.clone(), good.clone(), broken.clone()]);

    assert_eq!(batch.games.len(), 1);
    assert!(batch.games.contains_key(&good));
    assert_eq!(batch.team_games().count(), 2);
    assert_eq!(batch.players().count(), 4);
    assert_eq!(batch.plays().count(), 3);

    assert_eq!(batch.failures.len(), 2);
    assert_eq!(batch.failures[0].url, missing);
    assert_eq!(batch.failures[0].kind, FailureKind::Fetch);
    assert_eq!(batch.failures[1].url, broken);
    assert_eq!(batch.failures[1].kind, FailureKind::TableNotFound);
    assert_eq!(batch.retryable_urls(), vec![missing]);
}

#[test]
fn season_scrape_fetches_each_boxscore_once() {
    let schedule = format!("{BASE}/years/2018/games.htm");
    let nwe = boxscore_url("201809090nwe");
    let source = FixtureSource::default()
        .with_page(&schedule, read_fixture("schedule.html"))
        .with_page(&nwe, read_fixture("boxscore.html"));
    let runner = BatchRunner::new(source, SiteUrls::default(), options(0));

    let batch = runner.scrape_season(2018).expect("schedule should load");

    assert_eq!(batch.games.keys().collect::<Vec<_>>(), vec![&nwe]);
    assert_eq!(batch.failures.len(), 2);
    assert_eq!(runner_source(&runner).request_count(&nwe), 1);
}

#[test]
fn missing_schedule_aborts_the_season() {
    let runner = BatchRunner::new(FixtureSource::default(), SiteUrls::default(), options(0));
    assert!(matches!(
        runner.scrape_season(1899),
        Err(ScrapeError::Fetch { .. })
    ));
}

#[test]
fn fetch_failures_are_retried_up_to_the_limit() {
    let url = boxscore_url("201809090nwe");
    let source = FixtureSource::default()
        .with_page(&url, read_fixture("boxscore.html"))
        .flaky(&url, 2);
    let runner = BatchRunner::new(source, SiteUrls::default(), options(2));

    let batch = runner.scrape_boxscores([url.clone()]);

    assert!(batch.failures.is_empty());
    assert_eq!(runner_source(&runner).request_count(&url), 3);
}

#[test]
fn structural_failures_are_not_retried() {
    let url = boxscore_url("201809090rav");
    let source = FixtureSource::default().with_page(&url, "<html></html>".to_string());
    let runner = BatchRunner::new(source, SiteUrls::default(), options(3));

    let batch = runner.scrape_boxscores([url.clone()]);

    assert_eq!(batch.failures.len(), 1);
    assert_eq!(runner_source(&runner).request_count(&url), 1);
}

#[test]
fn combine_range_skips_missing_years() {
    let source = FixtureSource::default()
        .with_page(&format!("{BASE}/draft/2018-combine.htm"), read_fixture("combine.html"));
    let runner = BatchRunner::new(source, SiteUrls::default(), options(0));

    let batch = runner.scrape_combine(2017, 2019);

    assert_eq!(batch.records.len(), 3);
    assert!(batch.records.iter().all(|r| r.year == 2018));
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].url, format!("{BASE}/draft/2017-combine.htm"));
}


#[test]
fn oversized_height_does_not_abort_the_combine_batch() {
    let malformed = read_fixture("combine.html").replace("<td>6-5</td>", "<td>999999999-0</td>");
    let source = FixtureSource::default()
        .with_page(&format!("{BASE}/draft/2017-combine.htm"), malformed)
        .with_page(&format!("{BASE}/draft/2018-combine.htm"), read_fixture("combine.html"));
    let runner = BatchRunner::new(source, SiteUrls::default(), options(0));

    let batch = runner.scrape_combine(2017, 2019);

    assert!(batch.failures.is_empty());
    assert_eq!(batch.records.len(), 6);
    let allen_2017 = batch
        .records
        .iter()
        .find(|r| r.year == 2017 && r.player == "Josh Allen")
        .expect("2017 row kept");
    assert_eq!(allen_2017.height_inches, 0);
    assert_eq!(allen_2017.height, "999999999-0");
}

#[test]
fn missing_schedule_is_recorded_and_other_seasons_continue() {
    let schedule = format!("{BASE}/years/2018/games.htm");
    let nwe = boxscore_url("201809090nwe");
    let source = FixtureSource::default()
        .with_page(&schedule, read_fixture("schedule.html"))
        .with_page(&nwe, read_fixture("boxscore.html"));
    let runner = BatchRunner::new(source, SiteUrls::default(), options(0));

    let batch = runner.scrape_seasons(&[2017, 2018]);

    assert!(batch.games.contains_key(&nwe));
    assert_eq!(batch.failures[0].url, format!("{BASE}/years/2017/games.htm"));
    assert_eq!(batch.failures[0].kind, FailureKind::Fetch);
    assert_eq!(batch.failures.len(), 3);
}

fn runner_source(runner: &BatchRunner<FixtureSource>) -> &FixtureSource {
    runner.source()
}
