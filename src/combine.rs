use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::compound::{parse_height_inches, parse_measurement};
use crate::error::ScrapeError;
use crate::page::Document;
use crate::player_game::{PLAYER_COLUMN, is_sentinel_name};
use crate::table::{RawTable, TableSlot};

const REQUIRED_COLUMNS: &[&str] = &[
    PLAYER_COLUMN,
    "Pos",
    "School",
    "Ht",
    "Wt",
    "40yd",
    "Vertical",
    "Bench",
    "Broad Jump",
    "3Cone",
    "Shuttle",
];
const COLLEGE_COLUMN: &str = "College";
const DRAFTED_COLUMN: &str = "Drafted (tm/rnd/yr)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPick {
    pub team: String,
    pub round: u32,
    pub pick: u32,
    pub year: i32,
}

impl DraftPick {
    /// `"Arizona Cardinals / 1st / 10th pick / 2018"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts = raw.split('/').map(str::trim).collect::<Vec<_>>();
        let [team, round, pick, year] = parts.as_slice() else {
            return None;
        };
        if team.is_empty() {
            return None;
        }
        Some(Self {
            team: team.to_string(),
            round: leading_digits(round)?,
            pick: leading_digits(pick)?,
            year: year.parse().ok()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineRecord {
    pub year: i32,
    pub player: String,
    pub position: String,
    pub school: String,
    pub college: Option<String>,
    pub drafted: Option<String>,
    pub draft: Option<DraftPick>,
    pub height: String,
    pub height_inches: u32,
    pub weight: f64,
    pub forty_yd: f64,
    pub vertical: f64,
    pub bench_reps: f64,
    pub broad_jump: f64,
    pub three_cone: f64,
    pub shuttle: f64,
    /// Published columns with no typed field above.
    pub extra: BTreeMap<String, String>,
}

pub fn normalize_combine(document: &Document, year: i32) -> Result<Vec<CombineRecord>, ScrapeError> {
    let table = document.table(TableSlot::Combine)?;
    combine_from_table(&table, year)
}

pub fn combine_from_table(table: &RawTable, year: i32) -> Result<Vec<CombineRecord>, ScrapeError> {
    for label in REQUIRED_COLUMNS {
        if table.column(label).is_none() {
            return Err(ScrapeError::missing_label("combine", label));
        }
    }

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut cells = table
            .headers
            .iter()
            .cloned()
            .zip(row.iter().cloned().chain(std::iter::repeat(String::new())))
            .collect::<BTreeMap<_, _>>();
        let mut take = |label: &str| cells.remove(label).unwrap_or_default();

        let player = take(PLAYER_COLUMN);
        if is_sentinel_name(&player) {
            continue;
        }
        let height = take("Ht");
        let drafted = Some(take(DRAFTED_COLUMN)).filter(|d| !d.is_empty());
        let college = Some(take(COLLEGE_COLUMN)).filter(|c| !c.is_empty());

        out.push(CombineRecord {
            year,
            player,
            position: take("Pos"),
            school: take("School"),
            college,
            draft: drafted.as_deref().and_then(DraftPick::parse),
            drafted,
            height_inches: parse_height_inches(&height),
            height,
            weight: parse_measurement(&take("Wt")),
            forty_yd: parse_measurement(&take("40yd")),
            vertical: parse_measurement(&take("Vertical")),
            bench_reps: parse_measurement(&take("Bench")),
            broad_jump: parse_measurement(&take("Broad Jump")),
            three_cone: parse_measurement(&take("3Cone")),
            shuttle: parse_measurement(&take("Shuttle")),
            extra: cells,
        });
    }
    Ok(out)
}

fn leading_digits(text: &str) -> Option<u32> {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).collect::<String>();
    digits.parse().ok()
}
