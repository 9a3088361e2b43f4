use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compound::{
    hmm_to_minutes, leading_number, mmss_to_seconds, parse_or_default, parse_thousands,
    split_compound,
};
use crate::error::ScrapeError;
use crate::page::Document;
use crate::table::{RawTable, TableSlot};

/// Temperature and wind when a game has no weather row (indoor games) or the
/// weather text carries no reading.
pub const WEATHER_ABSENT: i32 = -1;

const GAME_INFO_CAPTION: &str = "Game Info";
const META_DATE: usize = 0;
const META_START_TIME: usize = 1;
const META_STADIUM: usize = 2;
const META_ATTENDANCE: usize = 3;
const META_DURATION: usize = 4;
const DATE_FORMAT: &str = "%A %b %d, %Y";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatLine {
    pub first_downs: i32,
    pub rush_atts: i32,
    pub rush_yds: i32,
    pub rush_tds: i32,
    pub completions: i32,
    pub pass_attempts: i32,
    pub pass_yards: i32,
    pub pass_tds: i32,
    pub pass_int: i32,
    pub times_sacked: i32,
    pub sacked_yards: i32,
    pub net_pass_yards: i32,
    pub total_yards: i32,
    pub fumbles: i32,
    pub fumbles_lost: i32,
    pub turnovers: i32,
    pub penalties: i32,
    pub penalty_yards: i32,
    pub third_down_conv: i32,
    pub third_down_atts: i32,
    pub fourth_down_conv: i32,
    pub fourth_down_atts: i32,
    pub time_of_possession_seconds: i32,
}

/// Single-valued rows from the game info table, shared by both teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub won_toss: String,
    pub roof: String,
    pub surface: String,
    pub weather: Option<String>,
    pub vegas_line: String,
    pub over_under_text: String,
    pub over_under: f64,
    pub temperature: i32,
    pub wind_mph: i32,
    /// Rows not mapped above, e.g. `Won OT Toss` or `Duration`.
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMeta {
    pub date_text: String,
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub stadium: String,
    pub attendance: u32,
    pub length_of_game_mins: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameOutcome {
    pub win: bool,
    pub total: i32,
    pub go_over: bool,
}

impl GameOutcome {
    pub fn new(team_points: i32, opponent_points: i32, over_under: f64) -> Self {
        let total = team_points + opponent_points;
        Self {
            win: team_points > opponent_points,
            total,
            go_over: f64::from(total) > over_under,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRecord {
    pub boxscore: String,
    pub team: String,
    pub opponent: String,
    pub team_points: i32,
    pub opponent_points: i32,
    pub stats: TeamStatLine,
    pub opponent_stats: TeamStatLine,
    pub game: GameInfo,
    pub meta: GameMeta,
    pub win: bool,
    pub total: i32,
    pub go_over: bool,
}

/// Builds both team rows for one boxscore page.
pub fn normalize_team_game(document: &Document) -> Result<[TeamGameRecord; 2], ScrapeError> {
    let frame = TeamStatsFrame::from_table(&document.table(TableSlot::TeamStats)?)?;
    let stats = [frame.stat_line(0)?, frame.stat_line(1)?];
    let points = final_score(&document.table(TableSlot::ScoringSummary)?)?;
    let game = GameInfo::from_table(&document.table(TableSlot::GameInfo)?)?;
    let meta = GameMeta::from_fields(&document.meta_fields()?)?;
    Ok(pair_records(&document.url, frame.teams, points, stats, game, meta))
}

/// Pairs two one-sided team frames. Side `i`'s opponent columns are side `1 - i`'s own.
pub fn pair_records(
    boxscore: &str,
    teams: [String; 2],
    points: [i32; 2],
    stats: [TeamStatLine; 2],
    game: GameInfo,
    meta: GameMeta,
) -> [TeamGameRecord; 2] {
    let build = |side: usize| {
        let other = 1 - side;
        let outcome = GameOutcome::new(points[side], points[other], game.over_under);
        TeamGameRecord {
            boxscore: boxscore.to_string(),
            team: teams[side].clone(),
            opponent: teams[other].clone(),
            team_points: points[side],
            opponent_points: points[other],
            stats: stats[side].clone(),
            opponent_stats: stats[other].clone(),
            game: game.clone(),
            meta: meta.clone(),
            win: outcome.win,
            total: outcome.total,
            go_over: outcome.go_over,
        }
    };
    [build(0), build(1)]
}

struct TeamStatsFrame {
    teams: [String; 2],
    by_label: HashMap<String, [String; 2]>,
}

impl TeamStatsFrame {
    fn from_table(table: &RawTable) -> Result<Self, ScrapeError> {
        if table.headers.len() != 3 {
            return Err(ScrapeError::mismatch(
                "team_stats",
                format!("expected a label column and 2 team columns, found {:?}", table.headers),
            ));
        }
        let teams = [table.headers[1].clone(), table.headers[2].clone()];
        let mut by_label = HashMap::new();
        for row in &table.rows {
            let [label, a, b] = row.as_slice() else {
                return Err(ScrapeError::mismatch(
                    "team_stats",
                    format!("row with {} cells: {row:?}", row.len()),
                ));
            };
            by_label.insert(label.clone(), [a.clone(), b.clone()]);
        }
        Ok(Self { teams, by_label })
    }

    fn cell(&self, label: &str, side: usize) -> Result<&str, ScrapeError> {
        self.by_label
            .get(label)
            .map(|pair| pair[side].as_str())
            .ok_or_else(|| ScrapeError::missing_label("team_stats", label))
    }

    fn parts(&self, label: &str, side: usize, count: usize) -> Result<Vec<i32>, ScrapeError> {
        Ok(split_compound::<i32>(self.cell(label, side)?, '-', count))
    }

    fn stat_line(&self, side: usize) -> Result<TeamStatLine, ScrapeError> {
        let rush = self.parts("Rush-Yds-TDs", side, 3)?;
        let pass = self.parts("Cmp-Att-Yd-TD-INT", side, 5)?;
        let sacked = self.parts("Sacked-Yards", side, 2)?;
        let fumbles = self.parts("Fumbles-Lost", side, 2)?;
        let penalties = self.parts("Penalties-Yards", side, 2)?;
        let third = self.parts("Third Down Conv.", side, 2)?;
        let fourth = self.parts("Fourth Down Conv.", side, 2)?;

        Ok(TeamStatLine {
            first_downs: parse_or_default(self.cell("First Downs", side)?),
            rush_atts: rush[0],
            rush_yds: rush[1],
            rush_tds: rush[2],
            completions: pass[0],
            pass_attempts: pass[1],
            pass_yards: pass[2],
            pass_tds: pass[3],
            pass_int: pass[4],
            times_sacked: sacked[0],
            sacked_yards: sacked[1],
            net_pass_yards: parse_or_default(self.cell("Net Pass Yards", side)?),
            total_yards: parse_or_default(self.cell("Total Yards", side)?),
            fumbles: fumbles[0],
            fumbles_lost: fumbles[1],
            turnovers: parse_or_default(self.cell("Turnovers", side)?),
            penalties: penalties[0],
            penalty_yards: penalties[1],
            third_down_conv: third[0],
            third_down_atts: third[1],
            fourth_down_conv: fourth[0],
            fourth_down_atts: fourth[1],
            time_of_possession_seconds: mmss_to_seconds(self.cell("Time of Possession", side)?),
        })
    }
}

/// Final score in team-column order: the last two cells of the scoring summary's last row.
fn final_score(table: &RawTable) -> Result<[i32; 2], ScrapeError> {
    let last = table
        .rows
        .last()
        .ok_or_else(|| ScrapeError::mismatch("scoring_summary", "no scoring rows"))?;
    let [.., a, b] = last.as_slice() else {
        return Err(ScrapeError::mismatch(
            "scoring_summary",
            format!("last row has {} cells", last.len()),
        ));
    };
    let parse = |cell: &str| {
        cell.trim()
            .parse::<i32>()
            .map_err(|_| ScrapeError::mismatch("scoring_summary", format!("score cell `{cell}` is not numeric")))
    };
    Ok([parse(a)?, parse(b)?])
}

impl GameInfo {
    pub fn from_table(table: &RawTable) -> Result<Self, ScrapeError> {
        let mut rows = BTreeMap::new();
        for row in &table.rows {
            let [label, value, ..] = row.as_slice() else {
                continue;
            };
            if label == GAME_INFO_CAPTION {
                continue;
            }
            rows.insert(label.clone(), value.clone());
        }
        let mut take = |label: &str| {
            rows.remove(label)
                .ok_or_else(|| ScrapeError::missing_label("game_info", label))
        };

        let won_toss = take("Won Toss")?;
        let roof = take("Roof")?;
        let surface = take("Surface")?;
        let vegas_line = take("Vegas Line")?;
        let over_under_text = take("Over/Under")?;
        let weather = take("Weather").ok();
        let (temperature, wind_mph) = parse_weather(weather.as_deref());

        Ok(Self {
            won_toss,
            roof,
            surface,
            weather,
            vegas_line,
            over_under: leading_number(&over_under_text).unwrap_or(0.0),
            over_under_text,
            temperature,
            wind_mph,
            extra: rows,
        })
    }
}

/// `"65 degrees, relative humidity 59%, wind 8 mph"` -> `(65, 8)`.
pub fn parse_weather(weather: Option<&str>) -> (i32, i32) {
    let Some(weather) = weather else {
        return (WEATHER_ABSENT, WEATHER_ABSENT);
    };
    let parts = weather.split(',').map(str::trim).collect::<Vec<_>>();
    let temperature = parts
        .first()
        .and_then(|p| leading_number(p))
        .map(|n| n.round() as i32)
        .unwrap_or(WEATHER_ABSENT);
    let wind = parts
        .iter()
        .find_map(|p| {
            if p.eq_ignore_ascii_case("no wind") {
                return Some(0.0);
            }
            p.strip_prefix("wind ").and_then(leading_number)
        })
        .map(|n| n.round() as i32)
        .unwrap_or(WEATHER_ABSENT);
    (temperature, wind)
}

impl GameMeta {
    pub fn from_fields(fields: &[String]) -> Result<Self, ScrapeError> {
        let date_text = fields
            .get(META_DATE)
            .cloned()
            .ok_or_else(|| ScrapeError::mismatch("scorebox_meta", "empty meta block"))?;
        let start_time = labelled(fields, META_START_TIME, "Start Time")?;
        let stadium = labelled(fields, META_STADIUM, "Stadium")?;
        let attendance_text = labelled(fields, META_ATTENDANCE, "Attendance")?;
        let duration_text = labelled(fields, META_DURATION, "Time of Game")?;

        let attendance = parse_thousands(&attendance_text).ok_or_else(|| {
            ScrapeError::mismatch("scorebox_meta", format!("attendance `{attendance_text}` is not numeric"))
        })?;

        Ok(Self {
            date: NaiveDate::parse_from_str(&date_text, DATE_FORMAT).ok(),
            date_text,
            start_time,
            stadium,
            attendance,
            length_of_game_mins: hmm_to_minutes(&duration_text),
        })
    }
}

fn labelled(fields: &[String], position: usize, label: &str) -> Result<String, ScrapeError> {
    let field = fields.get(position).ok_or_else(|| {
        ScrapeError::mismatch("scorebox_meta", format!("no field at position {position} (`{label}`)"))
    })?;
    match field.split_once(':') {
        Some((key, value)) if key.trim() == label => Ok(value.trim().to_string()),
        _ => Err(ScrapeError::mismatch(
            "scorebox_meta",
            format!("expected `{label}` at position {position}, found `{field}`"),
        )),
    }
}
