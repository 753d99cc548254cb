use super::{ScanEntry, ScanResult, ScannedFile};
use crate::progress::ProgressReporter;
use crate::storage::models::{AssetRef, Category, Granularity};
use chrono::Local;
use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Instant, UNIX_EPOCH};
use tracing::{debug, error};

/// Walk the six-level recording tree `ASSET/INDEX/CATEGORY/YYYY/MM/DD/FILE`
/// under `root`. Entries that do not match the schema at their level are
/// skipped silently; enumeration failures are counted and treated as empty
/// directories. Asset subtrees are scanned in parallel.
pub fn scan_tree(
    root: &Path,
    granularity: Granularity,
    ignore_globs: &[String],
    reporter: &dyn ProgressReporter,
) -> ScanResult {
    reporter.on_scan_start();
    let started = Instant::now();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|g| match Pattern::new(g) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", g, e);
                None
            }
        })
        .collect();

    let ctx = WalkContext {
        granularity,
        ignore_patterns,
        agg: DashMap::new(),
        unreadable: AtomicUsize::new(0),
        found: AtomicUsize::new(0),
        reporter,
    };

    let asset_dirs: Vec<(String, PathBuf)> = read_entries(root, &ctx.unreadable)
        .into_iter()
        .filter(|e| e.path().is_dir())
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .collect();

    let all_files: Vec<ScannedFile> = asset_dirs
        .par_iter()
        .map(|(name, path)| scan_asset(name, path, &ctx))
        .reduce(Vec::new, |mut acc, mut part| {
            acc.append(&mut part);
            acc
        });

    let today = Local::now().format("%Y-%m-%d").to_string();
    let mut entries: Vec<ScanEntry> = ctx
        .agg
        .into_iter()
        .map(|(entity, accum)| ScanEntry {
            entity,
            date: today.clone(),
            size_mb: accum.size_mb,
            file_count: accum.file_count,
        })
        .collect();
    entries.sort_by(|a, b| a.entity.cmp(&b.entity));

    let total_mb = all_files.iter().map(|f| f.size_mb).sum();
    let total_files = all_files.len();
    let unreadable_dirs = ctx.unreadable.load(Ordering::Relaxed);
    if unreadable_dirs > 0 {
        debug!("{} directories were unreadable and treated as empty", unreadable_dirs);
    }
    reporter.on_scan_complete(total_files, started.elapsed().as_secs_f64());

    ScanResult {
        total_mb,
        total_files,
        entries,
        all_files,
        unreadable_dirs,
    }
}

#[derive(Default)]
struct Accum {
    size_mb: f64,
    file_count: i64,
}

struct WalkContext<'a> {
    granularity: Granularity,
    ignore_patterns: Vec<Pattern>,
    agg: DashMap<AssetRef, Accum>,
    unreadable: AtomicUsize,
    found: AtomicUsize,
    reporter: &'a dyn ProgressReporter,
}

/// Walk one asset subtree: INDEX / CATEGORY / YEAR / MONTH / DAY / FILE.
fn scan_asset(asset: &str, asset_path: &Path, ctx: &WalkContext<'_>) -> Vec<ScannedFile> {
    let mut files = Vec::new();

    for index_entry in read_entries(asset_path, &ctx.unreadable) {
        let index_name = index_entry.file_name().to_string_lossy().into_owned();
        let index = match parse_index(&index_name) {
            Some(v) if index_entry.path().is_dir() => v,
            _ => continue,
        };

        for cat_entry in read_entries(&index_entry.path(), &ctx.unreadable) {
            let cat_name = cat_entry.file_name().to_string_lossy().into_owned();
            let category = match Category::parse_dir(&cat_name) {
                Some(Category::Specific(c)) if cat_entry.path().is_dir() => c,
                _ => continue,
            };

            for year_entry in read_entries(&cat_entry.path(), &ctx.unreadable) {
                let year = year_entry.file_name().to_string_lossy().into_owned();
                if !year_entry.path().is_dir() || !is_fixed_digits(&year, 4) {
                    continue;
                }

                for month_entry in read_entries(&year_entry.path(), &ctx.unreadable) {
                    let month = month_entry.file_name().to_string_lossy().into_owned();
                    if !month_entry.path().is_dir() || !is_fixed_digits(&month, 2) {
                        continue;
                    }

                    for day_entry in read_entries(&month_entry.path(), &ctx.unreadable) {
                        let day = day_entry.file_name().to_string_lossy().into_owned();
                        if !day_entry.path().is_dir() || !is_fixed_digits(&day, 2) {
                            continue;
                        }
                        let date = format!("{}-{}-{}", year, month, day);
                        let day_path = day_entry.path();

                        scan_day_folder(asset, index, category, &date, &day_path, ctx, &mut files);

                        ctx.reporter.on_scan_progress(
                            ctx.found.load(Ordering::Relaxed),
                            &day_path.to_string_lossy(),
                        );
                    }
                }
            }
        }
    }

    files
}

fn scan_day_folder(
    asset: &str,
    index: u32,
    category: char,
    date: &str,
    day_path: &Path,
    ctx: &WalkContext<'_>,
    files: &mut Vec<ScannedFile>,
) {
    for file_entry in read_entries(day_path, &ctx.unreadable) {
        let path = file_entry.path();
        let metadata = match file_entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }
        if ctx.ignore_patterns.iter().any(|p| p.matches_path(&path)) {
            continue;
        }

        let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
        let created_time = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        ctx.found.fetch_add(1, Ordering::Relaxed);

        let key = AssetRef {
            asset: asset.to_string(),
            index: (ctx.granularity.level() >= 1).then_some(index),
            category: if ctx.granularity.level() >= 2 {
                Category::Specific(category)
            } else {
                Category::Any
            },
        };
        let mut accum = ctx.agg.entry(key).or_default();
        accum.size_mb += size_mb;
        accum.file_count += 1;

        files.push(ScannedFile {
            full_path: path,
            size_mb,
            created_time,
            asset: asset.to_string(),
            index,
            category,
            date: date.to_string(),
        });
    }
}

/// Enumerate a directory; a failure counts as unreadable and yields nothing.
fn read_entries(dir: &Path, unreadable: &AtomicUsize) -> Vec<fs::DirEntry> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).collect(),
        Err(e) => {
            debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            unreadable.fetch_add(1, Ordering::Relaxed);
            Vec::new()
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_fixed_digits(s: &str, len: usize) -> bool {
    s.len() == len && is_digits(s)
}

/// An INDEX directory is a nonempty decimal integer.
fn parse_index(name: &str) -> Option<u32> {
    if is_digits(name) {
        name.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("007"), Some(7));
        assert_eq!(parse_index(""), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1a"), None);
        assert_eq!(parse_index("a1"), None);
    }

    #[test]
    fn test_fixed_digit_levels() {
        assert!(is_fixed_digits("2024", 4));
        assert!(!is_fixed_digits("202", 4));
        assert!(!is_fixed_digits("20245", 4));
        assert!(!is_fixed_digits("2O24", 4));
        assert!(is_fixed_digits("07", 2));
        assert!(!is_fixed_digits("7", 2));
        assert!(!is_fixed_digits("007", 2));
    }
}
