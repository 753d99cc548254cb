mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::path::Path;
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use lakesweep_core::{AppConfig, Engine, Error, Granularity, ReaperLimits};
use progress::CliReporter;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match lakesweep_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Run) => {
            if let Err(err) = run_full(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Scan) => {
            if let Err(err) = run_scan(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Forecast) => {
            if let Err(err) = run_forecast(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Status { json }) => {
            if let Err(err) = run_status(&config, json) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Weights) => {
            if let Err(err) = run_weights(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Deletions { limit }) => {
            if let Err(err) = run_deletions(&config, limit) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Watch) => {
            if let Err(err) = run_watch(&config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Generate { size_gb }) => {
            if let Err(err) = run_generate(&config, size_gb) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn build_engine(config: &AppConfig) -> Result<Engine, Error> {
    Ok(Engine::open(&config.db_path)?
        .with_reaper_limits(ReaperLimits {
            min_retention_hours: config.min_retention_hours,
            max_deletions: config.max_deletions,
        })
        .with_ignore_patterns(config.ignore_patterns.clone()))
}

fn scan_root(config: &AppConfig) -> Result<&Path, Error> {
    if config.root_path.is_empty() {
        return Err(Error::InvalidInput(
            "root_path is not configured (set it in Lakesweep.toml)".to_string(),
        ));
    }
    Ok(Path::new(&config.root_path))
}

fn run_full(config: &AppConfig) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let reporter = CliReporter::new();
    let outcome = engine.execute_full(
        scan_root(config)?,
        Granularity::from_level(config.granularity),
        config.limit_mb,
        &reporter,
    )?;

    println!();
    info!(
        "Current: {}, predicted: {}, ceiling: {} ({})",
        format!("{:.1} MB", outcome.current_mb).green(),
        format!("{:.1} MB", outcome.predicted_mb).yellow(),
        format!("{:.1} MB", outcome.limit_mb).cyan(),
        format!("{:.1}%", outcome.usage_pct).cyan(),
    );
    info!(
        "Action: {} — {} files deleted, {} freed ({} days of history)",
        outcome.action.as_str().red(),
        format!("{}", outcome.files_deleted).red(),
        format!("{:.1} MB", outcome.mb_freed).red(),
        outcome.history_days,
    );

    Ok(())
}

fn run_scan(config: &AppConfig) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let reporter = CliReporter::new();
    let summary = engine.scan(
        scan_root(config)?,
        Granularity::from_level(config.granularity),
        &reporter,
    )?;

    info!(
        "Snapshot recorded: {} across {} files, {} entities",
        format!("{:.1} MB", summary.total_mb).green(),
        format!("{}", summary.total_files).green(),
        summary.entities,
    );
    if summary.unreadable_dirs > 0 {
        info!("{} directories were unreadable and skipped", summary.unreadable_dirs);
    }

    Ok(())
}

fn run_forecast(config: &AppConfig) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let reporter = CliReporter::new();
    engine.scan(
        scan_root(config)?,
        Granularity::from_level(config.granularity),
        &reporter,
    )?;
    let data = engine.forecast()?;

    info!(
        "Forecast: {} today, {} tomorrow ({} MB/day over {} days)",
        format!("{:.1} MB", data.current_mb).green(),
        format!("{:.1} MB", data.predicted_mb).yellow(),
        format!("{:+.2}", data.growth_rate),
        data.days_available,
    );

    Ok(())
}

fn run_status(config: &AppConfig, json: bool) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let status = engine.status()?;
    let history_days = engine.history_day_count()?;

    if json {
        let payload = serde_json::json!({
            "scheduled": status.scheduled,
            "current_mb": status.current_mb,
            "predicted_mb": status.predicted_mb,
            "last_run": status.last_run,
            "next_run": status.next_run,
            "history_days": history_days,
        });
        println!("{}", payload);
        return Ok(());
    }

    println!("Scheduler:    {}", if status.scheduled { "running".green() } else { "stopped".red() });
    println!("Current:      {:.1} MB", status.current_mb);
    println!("Predicted:    {:.1} MB", status.predicted_mb);
    println!("Last run:     {}", if status.last_run.is_empty() { "never" } else { status.last_run.as_str() });
    println!("History days: {}", history_days);

    Ok(())
}

fn run_weights(config: &AppConfig) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let weights = engine.get_weights()?;
    if weights.is_empty() {
        println!("No history in the last 14 days.");
        return Ok(());
    }

    println!("{:<20} {:>6} {:>4} {:>12} {:>12} {:>6}", "ASSET", "INDEX", "CAT", "AVG MB", "TOTAL MB", "DAYS");
    for w in &weights {
        let index = w.entity.index.map(|i| i.to_string()).unwrap_or_else(|| "*".to_string());
        println!(
            "{:<20} {:>6} {:>4} {:>12.2} {:>12.2} {:>6}",
            w.entity.asset,
            index,
            w.entity.category.as_db(),
            w.avg_mb,
            w.total_mb,
            w.day_count,
        );
    }

    Ok(())
}

fn run_deletions(config: &AppConfig, limit: usize) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let logs = engine.deletion_logs(limit)?;
    if logs.is_empty() {
        println!("Deletion log is empty.");
        return Ok(());
    }

    for entry in &logs {
        println!(
            "{}  {:>10}  {}",
            entry.deleted_at,
            format!("{:.2} MB", entry.size_mb).red(),
            entry.file_path,
        );
    }

    Ok(())
}

fn run_watch(config: &AppConfig) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let root = scan_root(config)?;
    let granularity = Granularity::from_level(config.granularity);

    if config.interval_minutes > 0 {
        engine.schedule_interval(root, granularity, config.limit_mb, config.interval_minutes)?;
        info!("Scheduler running every {} minutes", config.interval_minutes);
    } else {
        engine.schedule_daily(
            root,
            granularity,
            config.limit_mb,
            config.schedule_hour,
            config.schedule_minute,
        )?;
        info!(
            "Scheduler running daily at {:02}:{:02}",
            config.schedule_hour, config.schedule_minute
        );
    }
    info!("Next run: {}", engine.status()?.next_run);

    print!("Press Enter to stop the scheduler... ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    engine.schedule_stop()?;
    info!("Scheduler stopped");
    Ok(())
}

fn run_generate(config: &AppConfig, size_gb: f64) -> Result<(), Error> {
    let engine = build_engine(config)?;
    let root = scan_root(config)?;
    let reporter = CliReporter::new();
    engine.generate_test_data(root, size_gb, &reporter)?;
    info!(
        "Generated {} of synthetic recordings under {}",
        format!("{:.1} GB", size_gb).green(),
        root.display(),
    );
    Ok(())
}
