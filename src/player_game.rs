use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::page::Document;
use crate::table::{RawTable, TableSlot};

pub const PLAYER_COLUMN: &str = "Player";
/// Name cells that mark separator or repeated-header rows rather than players.
pub const SENTINEL_NAMES: &[&str] = &["", "nan", PLAYER_COLUMN];
const MISSING_STAT: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCell {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGameRecord {
    pub player: String,
    pub boxscore: String,
    /// Published columns in page order, `Player` excluded. Labels can repeat (`Yds`).
    pub stats: Vec<StatCell>,
}

impl PlayerGameRecord {
    pub fn stat(&self, label: &str) -> Option<&str> {
        self.stats
            .iter()
            .find(|cell| cell.label == label)
            .map(|cell| cell.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayByPlayRecord {
    pub boxscore: String,
    pub sequence: usize,
    pub cells: Vec<StatCell>,
}

impl PlayByPlayRecord {
    pub fn cell(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.label == label)
            .map(|cell| cell.value.as_str())
    }
}

pub fn is_sentinel_name(name: &str) -> bool {
    SENTINEL_NAMES.contains(&name.trim())
}

pub fn normalize_players(document: &Document) -> Result<Vec<PlayerGameRecord>, ScrapeError> {
    normalize_player_table(document, TableSlot::PlayerStats)
}

/// Any player table with a `Player` column; the boxscore is always the document's own URL.
pub fn normalize_player_table(
    document: &Document,
    slot: TableSlot,
) -> Result<Vec<PlayerGameRecord>, ScrapeError> {
    let table = document.table(slot)?;
    players_from_table(&table, slot.name())
}

pub fn players_from_table(table: &RawTable, table_name: &'static str) -> Result<Vec<PlayerGameRecord>, ScrapeError> {
    let name_col = table
        .column(PLAYER_COLUMN)
        .ok_or_else(|| ScrapeError::missing_label(table_name, PLAYER_COLUMN))?;

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let name = row.get(name_col).map(String::as_str).unwrap_or_default();
        if is_sentinel_name(name) {
            continue;
        }
        let stats = table
            .headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != name_col)
            .map(|(idx, label)| {
                let value = row
                    .get(idx)
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .unwrap_or(MISSING_STAT);
                StatCell {
                    label: label.clone(),
                    value: value.to_string(),
                }
            })
            .collect();
        out.push(PlayerGameRecord {
            player: name.trim().to_string(),
            boxscore: table.url.clone(),
            stats,
        });
    }
    Ok(out)
}

/// Play rows as published. Repeated header rows inside the body are dropped.
pub fn normalize_play_by_play(document: &Document) -> Result<Vec<PlayByPlayRecord>, ScrapeError> {
    let table = document.table(TableSlot::PlayByPlay)?;
    if table.headers.is_empty() {
        return Err(ScrapeError::mismatch("play_by_play", "table has no header row"));
    }
    let plays = table
        .rows
        .iter()
        .filter(|row| **row != table.headers)
        .enumerate()
        .map(|(sequence, row)| PlayByPlayRecord {
            boxscore: table.url.clone(),
            sequence,
            cells: table
                .headers
                .iter()
                .enumerate()
                .map(|(idx, label)| StatCell {
                    label: label.clone(),
                    value: row.get(idx).cloned().unwrap_or_default(),
                })
                .collect(),
        })
        .collect();
    Ok(plays)
}
