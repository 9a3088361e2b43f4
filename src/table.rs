use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::page::Document;

/// Class marker wrapping every stats table on boxscore and schedule pages.
pub const TABLE_CONTAINER: &str = ".overthrow.table_container";
/// Class marker wrapping the draft-combine table.
pub const OUTER_TABLE_CONTAINER: &str = ".table_outer_container";
const SCOREBOX_META: &str = ".scorebox_meta";

static TABLE: Lazy<Selector> = Lazy::new(|| static_selector("table"));
static HEADER_ROWS: Lazy<Selector> = Lazy::new(|| static_selector("thead > tr"));
static BODY_ROWS: Lazy<Selector> = Lazy::new(|| static_selector("tbody > tr, tfoot > tr"));
static META_BLOCK: Lazy<Selector> = Lazy::new(|| static_selector(SCOREBOX_META));
static ANCHORS: Lazy<Selector> = Lazy::new(|| static_selector("a[href]"));

fn static_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must be valid css")
}

/// Positional contract with the live page layout. Index `n` means the n-th
/// element (zero-based, document order) matching `marker()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSlot {
    ScoringSummary,
    GameInfo,
    TeamStats,
    PlayerStats,
    PlayByPlay,
    Schedule,
    Combine,
}

impl TableSlot {
    pub fn marker(self) -> &'static str {
        match self {
            TableSlot::Combine => OUTER_TABLE_CONTAINER,
            _ => TABLE_CONTAINER,
        }
    }

    pub fn index(self) -> usize {
        match self {
            TableSlot::ScoringSummary => 0,
            TableSlot::GameInfo => 1,
            TableSlot::TeamStats => 4,
            TableSlot::PlayerStats => 5,
            TableSlot::PlayByPlay => 19,
            TableSlot::Schedule => 0,
            TableSlot::Combine => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TableSlot::ScoringSummary => "scoring_summary",
            TableSlot::GameInfo => "game_info",
            TableSlot::TeamStats => "team_stats",
            TableSlot::PlayerStats => "player_stats",
            TableSlot::PlayByPlay => "play_by_play",
            TableSlot::Schedule => "schedule",
            TableSlot::Combine => "combine",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub url: String,
    pub marker: String,
    pub index: usize,
    /// Single flattened header row.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }
}

impl Document {
    pub fn table(&self, slot: TableSlot) -> Result<RawTable, ScrapeError> {
        extract_table(self, slot.marker(), slot.index())
    }

    /// Text of each direct `<div>` child of the scorebox meta block, in order.
    pub fn meta_fields(&self) -> Result<Vec<String>, ScrapeError> {
        let block = self
            .html
            .select(&META_BLOCK)
            .next()
            .ok_or_else(|| ScrapeError::TableNotFound {
                marker: SCOREBOX_META.to_string(),
                index: 0,
                found: 0,
            })?;
        Ok(block
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "div")
            .map(cell_text)
            .collect())
    }

    /// `href` of every anchor inside the container at `slot`.
    pub fn anchor_hrefs(&self, slot: TableSlot) -> Result<Vec<String>, ScrapeError> {
        let container = nth_match(self, slot.marker(), slot.index())?;
        Ok(container
            .select(&ANCHORS)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .collect())
    }
}

/// Returns the first `<table>` inside the `index`-th element matching `marker`.
pub fn extract_table(document: &Document, marker: &str, index: usize) -> Result<RawTable, ScrapeError> {
    let container = nth_match(document, marker, index)?;
    let table = if container.value().name() == "table" {
        container
    } else {
        container.select(&TABLE).next().ok_or_else(|| {
            ScrapeError::mismatch("table", format!("`{marker}` index {index} holds no <table>"))
        })?
    };

    let header_rows = table.select(&HEADER_ROWS).map(row_cells).collect::<Vec<_>>();
    let body = table
        .select(&BODY_ROWS)
        .filter(|row| row_elements(*row).next().is_some())
        .collect::<Vec<_>>();
    let mut rows = body.iter().map(|row| row_cells(*row)).collect::<Vec<_>>();

    let headers = match header_rows.into_iter().last() {
        Some(last) => last,
        None => {
            let first_is_header = body
                .first()
                .is_some_and(|row| row_elements(*row).all(|cell| cell.value().name() == "th"));
            if first_is_header {
                rows.remove(0)
            } else {
                Vec::new()
            }
        }
    };

    Ok(RawTable {
        url: document.url.clone(),
        marker: marker.to_string(),
        index,
        headers,
        rows,
    })
}

fn nth_match<'a>(document: &'a Document, marker: &str, index: usize) -> Result<ElementRef<'a>, ScrapeError> {
    let selector = Selector::parse(marker).map_err(|err| ScrapeError::InvalidSelector {
        css: marker.to_string(),
        reason: err.to_string(),
    })?;
    let matches = document.html.select(&selector).collect::<Vec<_>>();
    let found = matches.len();
    matches.into_iter().nth(index).ok_or_else(|| ScrapeError::TableNotFound {
        marker: marker.to_string(),
        index,
        found,
    })
}

fn row_elements(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row_elements(row).map(cell_text).collect()
}

fn cell_text(el: ElementRef<'_>) -> String {
    let raw = el.text().collect::<String>();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
