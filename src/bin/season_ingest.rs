use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use nflref_scrape::batch::{BatchOptions, BatchRunner};
use nflref_scrape::config::ScrapeConfig;
use nflref_scrape::page::HttpPageSource;
use nflref_scrape::{export, store};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let years = parse_years_arg().ok_or_else(|| anyhow!("usage: season_ingest --year <yyyy> | --years=<start>..<end>"))?;
    if years.is_empty() {
        return Err(anyhow!("empty season range"));
    }

    let db_path = arg_value("--db")
        .map(PathBuf::from)
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let config = ScrapeConfig::from_env();
    let source = HttpPageSource::new(&config)?;
    let runner = BatchRunner::new(source, config.site.clone(), BatchOptions::from(&config));

    let batch = runner.scrape_seasons(&years);

    let mut conn = store::open_db(&db_path)?;
    let summary = store::persist_boxscore_batch(&mut conn, &batch)?;

    println!("Season ingest complete");
    println!("DB: {}", db_path.display());
    println!("Seasons: {years:?}");
    println!("Boxscores: {}/{}", summary.urls_succeeded, summary.urls_total);
    println!("Rows upserted: {}", summary.rows_upserted);

    if let Some(xlsx) = arg_value("--xlsx") {
        let path = PathBuf::from(xlsx);
        let report = export::export_boxscore_batch(&path, &batch)?;
        println!(
            "Workbook: {} (team rows={} players={} plays={})",
            path.display(),
            report.team_games,
            report.player_rows,
            report.plays
        );
    }

    if !summary.errors.is_empty() {
        println!("errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(10) {
            println!("   - {err}");
        }
        let retryable = batch.retryable_urls();
        if !retryable.is_empty() {
            println!("retryable: {}", retryable.len());
        }
    }

    Ok(())
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

/// `--year 2018` or `--years=2015..2019` (end exclusive).
fn parse_years_arg() -> Option<Vec<i32>> {
    if let Some(raw) = arg_value("--years") {
        let (start, end) = raw.split_once("..")?;
        let start = start.trim().parse::<i32>().ok()?;
        let end = end.trim().parse::<i32>().ok()?;
        return Some((start..end).collect());
    }
    let year = arg_value("--year")?.parse::<i32>().ok()?;
    Some(vec![year])
}
