use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Transaction, params};

use crate::batch::{BoxscoreBatch, CombineBatch, FailedUrl};
use crate::combine::CombineRecord;
use crate::http_cache::app_cache_dir;
use crate::team_game::TeamGameRecord;

#[derive(Debug, Clone, Default)]
pub struct PersistSummary {
    pub run_id: i64,
    pub urls_total: usize,
    pub urls_succeeded: usize,
    pub rows_upserted: usize,
    pub errors: Vec<String>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("nflref.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS team_games (
            boxscore TEXT NOT NULL,
            team TEXT NOT NULL,
            opponent TEXT NOT NULL,
            game_date TEXT NULL,
            team_points INTEGER NOT NULL,
            opponent_points INTEGER NOT NULL,
            win INTEGER NOT NULL,
            total INTEGER NOT NULL,
            over_under REAL NOT NULL,
            go_over INTEGER NOT NULL,
            temperature INTEGER NOT NULL,
            wind_mph INTEGER NOT NULL,
            stadium TEXT NOT NULL,
            attendance INTEGER NOT NULL,
            length_of_game_mins INTEGER NOT NULL,
            record_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (boxscore, team)
        );
        CREATE INDEX IF NOT EXISTS idx_team_games_team ON team_games(team);
        CREATE INDEX IF NOT EXISTS idx_team_games_date ON team_games(game_date);

        CREATE TABLE IF NOT EXISTS player_games (
            boxscore TEXT NOT NULL,
            player TEXT NOT NULL,
            stats_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (boxscore, player)
        );
        CREATE INDEX IF NOT EXISTS idx_player_games_player ON player_games(player);

        CREATE TABLE IF NOT EXISTS plays (
            boxscore TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            cells_json TEXT NOT NULL,
            PRIMARY KEY (boxscore, sequence)
        );

        CREATE TABLE IF NOT EXISTS combine (
            year INTEGER NOT NULL,
            player TEXT NOT NULL,
            school TEXT NOT NULL,
            position TEXT NOT NULL,
            height_inches INTEGER NOT NULL,
            weight REAL NOT NULL,
            forty_yd REAL NOT NULL,
            record_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (year, player, school)
        );
        CREATE INDEX IF NOT EXISTS idx_combine_position ON combine(position);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            urls_total INTEGER NOT NULL,
            urls_succeeded INTEGER NOT NULL,
            rows_upserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn persist_boxscore_batch(conn: &mut Connection, batch: &BoxscoreBatch) -> Result<PersistSummary> {
    let urls_total = batch.games.len() + batch.failures.len();
    let run_id = begin_run(conn, "boxscores", urls_total)?;

    let mut rows_upserted = 0usize;
    for (boxscore, data) in &batch.games {
        let tx = conn.transaction().context("begin boxscore transaction")?;
        clear_boxscore(&tx, boxscore)?;
        for record in &data.teams {
            upsert_team_game(&tx, record)?;
            rows_upserted += 1;
        }
        for player in &data.players {
            let stats_json = serde_json::to_string(&player.stats).context("serialize player stats")?;
            tx.execute(
                r#"
                INSERT INTO player_games (boxscore, player, stats_json, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(boxscore, player) DO UPDATE SET
                    stats_json = excluded.stats_json,
                    updated_at = excluded.updated_at
                "#,
                params![player.boxscore, player.player, stats_json, Utc::now().to_rfc3339()],
            )
            .context("upsert player game")?;
            rows_upserted += 1;
        }
        for play in &data.plays {
            let cells_json = serde_json::to_string(&play.cells).context("serialize play cells")?;
            tx.execute(
                r#"
                INSERT INTO plays (boxscore, sequence, cells_json) VALUES (?1, ?2, ?3)
                ON CONFLICT(boxscore, sequence) DO UPDATE SET cells_json = excluded.cells_json
                "#,
                params![play.boxscore, play.sequence as i64, cells_json],
            )
            .context("upsert play")?;
            rows_upserted += 1;
        }
        tx.commit().context("commit boxscore transaction")?;
    }

    finish_run(conn, run_id, batch.games.len(), rows_upserted, &batch.failures)
        .map(|errors| PersistSummary {
            run_id,
            urls_total,
            urls_succeeded: batch.games.len(),
            rows_upserted,
            errors,
        })
}

pub fn persist_combine_batch(conn: &mut Connection, batch: &CombineBatch) -> Result<PersistSummary> {
    let years = batch
        .records
        .chunk_by(|a, b| a.year == b.year)
        .collect::<Vec<_>>();
    let urls_total = years.len() + batch.failures.len();
    let run_id = begin_run(conn, "combine", urls_total)?;

    for records in &years {
        let tx = conn.transaction().context("begin combine transaction")?;
        for record in records.iter() {
            upsert_combine(&tx, record)?;
        }
        tx.commit().context("commit combine transaction")?;
    }

    let rows_upserted = batch.records.len();
    finish_run(conn, run_id, years.len(), rows_upserted, &batch.failures).map(|errors| {
        PersistSummary {
            run_id,
            urls_total,
            urls_succeeded: years.len(),
            rows_upserted,
            errors,
        }
    })
}

/// Both team rows of one game, ordered by team.
pub fn load_team_games(conn: &Connection, boxscore: &str) -> Result<Vec<TeamGameRecord>> {
    load_json_rows(
        conn,
        "SELECT record_json FROM team_games WHERE boxscore = ?1 ORDER BY team ASC",
        boxscore,
    )
}

pub fn load_team_history(conn: &Connection, team: &str) -> Result<Vec<TeamGameRecord>> {
    load_json_rows(
        conn,
        "SELECT record_json FROM team_games WHERE team = ?1 ORDER BY game_date ASC, boxscore ASC",
        team,
    )
}

pub fn load_combine_year(conn: &Connection, year: i32) -> Result<Vec<CombineRecord>> {
    let mut stmt = conn
        .prepare("SELECT record_json FROM combine WHERE year = ?1 ORDER BY player ASC, school ASC")
        .context("prepare load combine query")?;
    let rows = stmt
        .query_map(params![year], |row| row.get::<_, String>(0))
        .context("query load combine")?;
    let mut out = Vec::new();
    for row in rows {
        let json = row.context("decode combine row")?;
        out.push(serde_json::from_str(&json).context("decode combine record json")?);
    }
    Ok(out)
}

fn load_json_rows(conn: &Connection, sql: &str, key: &str) -> Result<Vec<TeamGameRecord>> {
    let mut stmt = conn.prepare(sql).context("prepare load team games query")?;
    let rows = stmt
        .query_map(params![key], |row| row.get::<_, String>(0))
        .context("query load team games")?;
    let mut out = Vec::new();
    for row in rows {
        let json = row.context("decode team game row")?;
        out.push(serde_json::from_str(&json).context("decode team game record json")?);
    }
    Ok(out)
}

/// Drops every row of one game so a re-ingest replaces it instead of merging.
fn clear_boxscore(tx: &Transaction<'_>, boxscore: &str) -> Result<()> {
    for table in ["team_games", "player_games", "plays"] {
        tx.execute(&format!("DELETE FROM {table} WHERE boxscore = ?1"), params![boxscore])
            .with_context(|| format!("clear {table} for {boxscore}"))?;
    }
    Ok(())
}

fn upsert_team_game(tx: &Transaction<'_>, r: &TeamGameRecord) -> Result<()> {
    let record_json = serde_json::to_string(r).context("serialize team game")?;
    tx.execute(
        r#"
        INSERT INTO team_games (
            boxscore, team, opponent, game_date, team_points, opponent_points,
            win, total, over_under, go_over, temperature, wind_mph,
            stadium, attendance, length_of_game_mins, record_json, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17
        )
        ON CONFLICT(boxscore, team) DO UPDATE SET
            opponent = excluded.opponent,
            game_date = excluded.game_date,
            team_points = excluded.team_points,
            opponent_points = excluded.opponent_points,
            win = excluded.win,
            total = excluded.total,
            over_under = excluded.over_under,
            go_over = excluded.go_over,
            temperature = excluded.temperature,
            wind_mph = excluded.wind_mph,
            stadium = excluded.stadium,
            attendance = excluded.attendance,
            length_of_game_mins = excluded.length_of_game_mins,
            record_json = excluded.record_json,
            updated_at = excluded.updated_at
        "#,
        params![
            r.boxscore,
            r.team,
            r.opponent,
            r.meta.date.map(|d| d.to_string()),
            r.team_points,
            r.opponent_points,
            bool_to_i64(r.win),
            r.total,
            r.game.over_under,
            bool_to_i64(r.go_over),
            r.game.temperature,
            r.game.wind_mph,
            r.meta.stadium,
            r.meta.attendance as i64,
            r.meta.length_of_game_mins as i64,
            record_json,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert team game")?;
    Ok(())
}

fn upsert_combine(tx: &Transaction<'_>, r: &CombineRecord) -> Result<()> {
    let record_json = serde_json::to_string(r).context("serialize combine record")?;
    tx.execute(
        r#"
        INSERT INTO combine (
            year, player, school, position, height_inches, weight, forty_yd, record_json, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(year, player, school) DO UPDATE SET
            position = excluded.position,
            height_inches = excluded.height_inches,
            weight = excluded.weight,
            forty_yd = excluded.forty_yd,
            record_json = excluded.record_json,
            updated_at = excluded.updated_at
        "#,
        params![
            r.year,
            r.player,
            r.school,
            r.position,
            r.height_inches as i64,
            r.weight,
            r.forty_yd,
            record_json,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert combine record")?;
    Ok(())
}

fn begin_run(conn: &Connection, kind: &str, urls_total: usize) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs(kind, started_at, finished_at, urls_total, urls_succeeded, rows_upserted, errors_json)
         VALUES (?1, ?2, NULL, ?3, 0, 0, '[]')",
        params![kind, Utc::now().to_rfc3339(), urls_total as i64],
    )
    .context("insert ingest run")?;
    Ok(conn.last_insert_rowid())
}

fn finish_run(
    conn: &Connection,
    run_id: i64,
    urls_succeeded: usize,
    rows_upserted: usize,
    failures: &[FailedUrl],
) -> Result<Vec<String>> {
    let errors = failures
        .iter()
        .map(|f| format!("{}: {}", f.url, f.reason))
        .collect::<Vec<_>>();
    let errors_json = serde_json::to_string(&errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, urls_succeeded = ?2, rows_upserted = ?3, errors_json = ?4
         WHERE run_id = ?5",
        params![
            Utc::now().to_rfc3339(),
            urls_succeeded as i64,
            rows_upserted as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;
    tracing::info!(run_id, urls_succeeded, rows_upserted, failures = failures.len(), "ingest run recorded");
    Ok(errors)
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
