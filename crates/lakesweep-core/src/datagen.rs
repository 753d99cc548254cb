use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::storage::models::{AssetRef, Category, StorageRecord};
use crate::storage::Database;
use chrono::{Duration, Local};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

const ASSETS: [&str; 3] = ["ASSET_01", "ASSET_02", "ASSET_03"];
const INDICES: std::ops::RangeInclusive<u32> = 1..=5;
const CATEGORIES: [char; 2] = ['E', 'F'];
const DAYS: i64 = 14;

/// Generate a schema-valid recording tree totalling roughly `size_gb`:
/// 3 assets × 5 indices × {E,F} × 14 days, one file per day folder, with a
/// linear growth ramp (day 1 ≈ 70% of the mean, day 14 ≈ 130%) so that the
/// forecaster has a visible trend to latch onto. Matching per-day snapshots
/// are backfilled into history.
pub fn generate_test_data(
    db: &Database,
    root: &Path,
    size_gb: f64,
    reporter: &dyn ProgressReporter,
) -> Result<(), Error> {
    let total_folders = ASSETS.len() as u64 * 5 * 2 * DAYS as u64;
    let total_bytes = (size_gb * 1024.0 * 1024.0 * 1024.0) as u64;
    let bytes_per_file = (total_bytes / total_folders).max(1024);

    let mut folder_idx: u64 = 0;
    let now = Local::now();

    for asset in ASSETS {
        for index in INDICES {
            for category in CATEGORIES {
                for d in 0..DAYS {
                    // d = 0 is 13 days ago, d = 13 is today.
                    let day = now - Duration::days(DAYS - 1 - d);
                    let growth = growth_factor(d);
                    let file_bytes = (bytes_per_file as f64 * growth) as u64;

                    write_day_file(root, asset, index, category, &day, file_bytes)?;

                    folder_idx += 1;
                    reporter.on_generate_progress(
                        (folder_idx * 100 / total_folders) as u32,
                        &format!(
                            "Generating {}/{}/{} day {}/{}",
                            asset,
                            index,
                            category,
                            d + 1,
                            DAYS
                        ),
                    );
                }

                // Backfill one history row per day for this entity.
                for d in 0..DAYS {
                    let day = now - Duration::days(DAYS - 1 - d);
                    let file_mb =
                        bytes_per_file as f64 * growth_factor(d) / (1024.0 * 1024.0);
                    db.insert_snapshot(&StorageRecord {
                        id: 0,
                        entity: AssetRef::new(asset, Some(index), Category::Specific(category)),
                        date: day.format("%Y-%m-%d").to_string(),
                        size_mb: file_mb,
                        file_count: 1,
                    })?;
                }
            }
        }
    }

    reporter.on_generate_progress(100, "Test data generation complete");
    info!("Generated {} day folders under {}", total_folders, root.display());
    Ok(())
}

/// Generate one day of data across all 30 entities, `day_offset` days from
/// today (negative = past), splitting `day_size_mb` with a deterministic
/// ±20% per-entity variation. Snapshots are inserted alongside.
pub fn generate_one_day(
    db: &Database,
    root: &Path,
    day_size_mb: f64,
    day_offset: i64,
    reporter: &dyn ProgressReporter,
) -> Result<(), Error> {
    let total_entities = ASSETS.len() as u64 * 5 * 2;
    let total_bytes = (day_size_mb * 1024.0 * 1024.0) as u64;
    let bytes_per_file = (total_bytes / total_entities).max(1024);

    let day = Local::now() + Duration::days(day_offset);
    let date = day.format("%Y-%m-%d").to_string();

    let mut entity_idx: u64 = 0;
    for asset in ASSETS {
        for index in INDICES {
            for category in CATEGORIES {
                let variation = 0.8 + (entity_idx * 7 % 40) as f64 / 100.0;
                let file_bytes = (bytes_per_file as f64 * variation) as u64;

                write_day_file(root, asset, index, category, &day, file_bytes)?;

                db.insert_snapshot(&StorageRecord {
                    id: 0,
                    entity: AssetRef::new(asset, Some(index), Category::Specific(category)),
                    date: date.clone(),
                    size_mb: file_bytes as f64 / (1024.0 * 1024.0),
                    file_count: 1,
                })?;

                entity_idx += 1;
                reporter.on_generate_progress(
                    (entity_idx * 100 / total_entities) as u32,
                    &format!("Day {}: {}/{}/{}", date, asset, index, category),
                );
            }
        }
    }

    reporter.on_generate_progress(100, "One day of data generated");
    Ok(())
}

/// Linear ramp from 70% of the mean on day 0 to 130% on the last day.
fn growth_factor(d: i64) -> f64 {
    0.7 + 0.6 * d as f64 / (DAYS - 1) as f64
}

fn write_day_file(
    root: &Path,
    asset: &str,
    index: u32,
    category: char,
    day: &chrono::DateTime<Local>,
    bytes: u64,
) -> Result<(), Error> {
    let dir = root
        .join(asset)
        .join(index.to_string())
        .join(category.to_string())
        .join(day.format("%Y").to_string())
        .join(day.format("%m").to_string())
        .join(day.format("%d").to_string());
    fs::create_dir_all(&dir)?;

    let file_name = format!(
        "{}_{}_{}_{}.dat",
        asset,
        index,
        category,
        day.format("%Y-%m-%d")
    );
    let mut out = fs::File::create(dir.join(file_name))?;

    // Content is never inspected; a rolling byte pattern is enough.
    let mut buf = [0u8; 8192];
    for (i, b) in buf.iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
    let mut written = 0u64;
    while written < bytes {
        let chunk = (bytes - written).min(buf.len() as u64) as usize;
        out.write_all(&buf[..chunk])?;
        written += chunk as u64;
    }
    Ok(())
}
