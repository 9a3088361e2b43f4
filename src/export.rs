use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::batch::{BoxscoreBatch, CombineBatch, FailedUrl};
use crate::player_game::StatCell;
use crate::team_game::TeamStatLine;

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub team_games: usize,
    pub player_rows: usize,
    pub plays: usize,
    pub combine_rows: usize,
    pub failures: usize,
}

const STAT_HEADERS: [&str; 23] = [
    "First Downs",
    "Rush Att",
    "Rush Yds",
    "Rush TD",
    "Cmp",
    "Pass Att",
    "Pass Yds",
    "Pass TD",
    "Int",
    "Sacked",
    "Sacked Yds",
    "Net Pass Yds",
    "Total Yds",
    "Fumbles",
    "Fumbles Lost",
    "Turnovers",
    "Penalties",
    "Penalty Yds",
    "3rd Conv",
    "3rd Att",
    "4th Conv",
    "4th Att",
    "TOP (s)",
];

pub fn export_boxscore_batch(path: &Path, batch: &BoxscoreBatch) -> Result<ExportReport> {
    let mut report = ExportReport::default();

    let mut team_rows = vec![
        [
            "Boxscore", "Team", "Opponent", "Date", "Points", "Opp Points", "Win", "Total",
            "Over/Under", "Over", "Temp", "Wind", "Roof", "Surface", "Stadium", "Attendance",
            "Length (min)",
        ]
        .iter()
        .map(|h| h.to_string())
        .chain(STAT_HEADERS.iter().map(|h| h.to_string()))
        .chain(STAT_HEADERS.iter().map(|h| format!("Opp {h}")))
        .collect::<Vec<_>>(),
    ];
    for r in batch.team_games() {
        let mut row = vec![
            r.boxscore.clone(),
            r.team.clone(),
            r.opponent.clone(),
            r.meta.date.map(|d| d.to_string()).unwrap_or_else(|| r.meta.date_text.clone()),
            r.team_points.to_string(),
            r.opponent_points.to_string(),
            r.win.to_string(),
            r.total.to_string(),
            r.game.over_under.to_string(),
            r.go_over.to_string(),
            r.game.temperature.to_string(),
            r.game.wind_mph.to_string(),
            r.game.roof.clone(),
            r.game.surface.clone(),
            r.meta.stadium.clone(),
            r.meta.attendance.to_string(),
            r.meta.length_of_game_mins.to_string(),
        ];
        row.extend(stat_cells(&r.stats));
        row.extend(stat_cells(&r.opponent_stats));
        team_rows.push(row);
        report.team_games += 1;
    }

    let player_rows = wide_rows(
        &["Boxscore", "Player"],
        batch
            .players()
            .map(|p| (vec![p.boxscore.clone(), p.player.clone()], p.stats.as_slice())),
    );
    report.player_rows = batch.players().count();

    let play_rows = wide_rows(
        &["Boxscore", "Sequence"],
        batch
            .plays()
            .map(|play| (vec![play.boxscore.clone(), play.sequence.to_string()], play.cells.as_slice())),
    );
    report.plays = batch.plays().count();

    let failures_sheet = failure_rows(&batch.failures);
    report.failures = batch.failures.len();

    let mut workbook = Workbook::new();
    add_sheet(&mut workbook, "TeamGames", &team_rows)?;
    add_sheet(&mut workbook, "PlayerGames", &player_rows)?;
    add_sheet(&mut workbook, "PlayByPlay", &play_rows)?;
    add_sheet(&mut workbook, "Failures", &failures_sheet)?;
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(report)
}

pub fn export_combine_batch(path: &Path, batch: &CombineBatch) -> Result<ExportReport> {
    let mut rows = vec![
        [
            "Year", "Player", "Pos", "School", "College", "Ht", "Height (in)", "Wt", "40yd",
            "Vertical", "Bench", "Broad Jump", "3Cone", "Shuttle", "Drafted", "Draft Team",
            "Draft Round", "Draft Pick",
        ]
        .map(String::from)
        .to_vec(),
    ];
    for r in &batch.records {
        rows.push(vec![
            r.year.to_string(),
            r.player.clone(),
            r.position.clone(),
            r.school.clone(),
            r.college.clone().unwrap_or_default(),
            r.height.clone(),
            r.height_inches.to_string(),
            r.weight.to_string(),
            r.forty_yd.to_string(),
            r.vertical.to_string(),
            r.bench_reps.to_string(),
            r.broad_jump.to_string(),
            r.three_cone.to_string(),
            r.shuttle.to_string(),
            r.drafted.clone().unwrap_or_default(),
            r.draft.as_ref().map(|d| d.team.clone()).unwrap_or_default(),
            r.draft.as_ref().map(|d| d.round.to_string()).unwrap_or_default(),
            r.draft.as_ref().map(|d| d.pick.to_string()).unwrap_or_default(),
        ]);
    }

    let mut workbook = Workbook::new();
    add_sheet(&mut workbook, "Combine", &rows)?;
    add_sheet(&mut workbook, "Failures", &failure_rows(&batch.failures))?;
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        combine_rows: batch.records.len(),
        failures: batch.failures.len(),
        ..ExportReport::default()
    })
}

fn stat_cells(s: &TeamStatLine) -> Vec<String> {
    [
        s.first_downs,
        s.rush_atts,
        s.rush_yds,
        s.rush_tds,
        s.completions,
        s.pass_attempts,
        s.pass_yards,
        s.pass_tds,
        s.pass_int,
        s.times_sacked,
        s.sacked_yards,
        s.net_pass_yards,
        s.total_yards,
        s.fumbles,
        s.fumbles_lost,
        s.turnovers,
        s.penalties,
        s.penalty_yards,
        s.third_down_conv,
        s.third_down_atts,
        s.fourth_down_conv,
        s.fourth_down_atts,
        s.time_of_possession_seconds,
    ]
    .iter()
    .map(|v| v.to_string())
    .collect()
}

/// One row per record, published labels as columns. A header row is repeated
/// whenever a record's labels differ from the previous record's.
fn wide_rows<'a>(
    key_headers: &[&str],
    records: impl Iterator<Item = (Vec<String>, &'a [StatCell])>,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for (keys, cells) in records {
        let labels = cells.iter().map(|c| c.label.as_str()).collect::<Vec<_>>();
        if current.as_ref() != Some(&labels) {
            rows.push(
                key_headers
                    .iter()
                    .copied()
                    .chain(labels.iter().copied())
                    .map(String::from)
                    .collect(),
            );
            current = Some(labels);
        }
        let mut row = keys;
        row.extend(cells.iter().map(|c| c.value.clone()));
        rows.push(row);
    }
    if rows.is_empty() {
        rows.push(key_headers.iter().map(|h| h.to_string()).collect());
    }
    rows
}

fn failure_rows(failures: &[FailedUrl]) -> Vec<Vec<String>> {
    let mut rows = vec![["URL", "Kind", "Reason"].map(String::from).to_vec()];
    rows.extend(
        failures
            .iter()
            .map(|f| vec![f.url.clone(), f.kind.as_str().to_string(), f.reason.clone()]),
    );
    rows
}

fn add_sheet(workbook: &mut Workbook, name: &str, rows: &[Vec<String>]) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    write_rows(sheet, rows)
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
