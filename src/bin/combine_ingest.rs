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

    let start = year_arg("--start").ok_or_else(|| anyhow!("usage: combine_ingest --start <yyyy> --end <yyyy>"))?;
    let end = year_arg("--end").unwrap_or(start + 1);
    if end <= start {
        return Err(anyhow!("--end must be after --start ({start}..{end})"));
    }

    let db_path = arg_value("--db")
        .map(PathBuf::from)
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let config = ScrapeConfig::from_env();
    let source = HttpPageSource::new(&config)?;
    let runner = BatchRunner::new(source, config.site.clone(), BatchOptions::from(&config));
    let batch = runner.scrape_combine(start, end);

    let mut conn = store::open_db(&db_path)?;
    let summary = store::persist_combine_batch(&mut conn, &batch)?;

    println!("Combine ingest complete");
    println!("DB: {}", db_path.display());
    println!("Years: {start}..{end}");
    println!("Pages: {}/{}", summary.urls_succeeded, summary.urls_total);
    println!("Players upserted: {}", summary.rows_upserted);

    if let Some(xlsx) = arg_value("--xlsx") {
        let path = PathBuf::from(xlsx);
        let report = export::export_combine_batch(&path, &batch)?;
        println!("Workbook: {} (rows={})", path.display(), report.combine_rows);
    }

    if !summary.errors.is_empty() {
        println!("errors: {}", summary.errors.len());
        for err in &summary.errors {
            println!("   - {err}");
        }
    }

    Ok(())
}

fn year_arg(flag: &str) -> Option<i32> {
    arg_value(flag).and_then(|raw| raw.parse::<i32>().ok())
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
