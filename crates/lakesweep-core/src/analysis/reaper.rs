use crate::error::Error;
use crate::scanner::ScannedFile;
use crate::storage::models::DeletionRecord;
use crate::storage::Database;
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use tracing::{debug, info};

/// Minimum number of files that must remain in every entity after a cycle.
const MIN_SURVIVORS: i64 = 5;

/// Audit reason recorded for every reaped file.
pub const CLEANUP_REASON: &str = "PREDICTIVE_CLEANUP";

/// Safety parameters bounding one cleanup cycle.
#[derive(Debug, Clone, Copy)]
pub struct ReaperLimits {
    /// Files modified more recently than this are never deleted.
    pub min_retention_hours: u32,
    /// Unconditional stop after this many successful deletions.
    pub max_deletions: usize,
}

impl Default for ReaperLimits {
    fn default() -> Self {
        Self {
            min_retention_hours: 24,
            max_deletions: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupStats {
    pub files_deleted: usize,
    pub mb_freed: f64,
}

/// Delete candidates oldest-first until `amount_to_delete_mb` is freed, the
/// deletion cap is hit, or the candidates are exhausted.
///
/// Per candidate, in order: the budget and cap stops, the retention floor,
/// then the per-entity survivor floor (a live counter, decremented only on
/// successful deletion). A physical deletion that fails is skipped without
/// counting, and without an audit row; an audit row is written for every
/// deletion that succeeds. Store failures propagate.
pub fn execute_cleanup(
    db: &Database,
    files: &mut [ScannedFile],
    amount_to_delete_mb: f64,
    limits: &ReaperLimits,
) -> Result<CleanupStats, Error> {
    let mut stats = CleanupStats::default();
    if amount_to_delete_mb <= 0.0 || files.is_empty() {
        return Ok(stats);
    }

    let cutoff = Local::now().timestamp() - i64::from(limits.min_retention_hours) * 3600;

    // Oldest-modified first; ties broken by path for a deterministic order.
    files.sort_by(|a, b| {
        a.created_time
            .cmp(&b.created_time)
            .then_with(|| a.full_path.cmp(&b.full_path))
    });

    let mut survivors: HashMap<(&str, u32, char), i64> = HashMap::new();
    for f in files.iter() {
        *survivors.entry((f.asset.as_str(), f.index, f.category)).or_default() += 1;
    }

    for f in files.iter() {
        if stats.mb_freed >= amount_to_delete_mb || stats.files_deleted >= limits.max_deletions {
            break;
        }
        if f.created_time > cutoff {
            continue;
        }

        let key = (f.asset.as_str(), f.index, f.category);
        let remaining = survivors.entry(key).or_default();
        if *remaining <= MIN_SURVIVORS {
            continue;
        }

        match fs::remove_file(&f.full_path) {
            Ok(()) => {
                db.log_deletion(&DeletionRecord {
                    file_path: f.full_path.to_string_lossy().into_owned(),
                    asset: f.asset.clone(),
                    size_mb: f.size_mb,
                    reason: CLEANUP_REASON.to_string(),
                    deleted_at: String::new(),
                })?;
                stats.mb_freed += f.size_mb;
                stats.files_deleted += 1;
                *survivors.entry(key).or_default() -= 1;
                debug!("Reaped {} ({:.2} MB)", f.full_path.display(), f.size_mb);
            }
            Err(e) => {
                // Raced with an external writer, or permissions changed
                // between scan and reap. Not counted, not audited.
                debug!("Could not remove {}: {}", f.full_path.display(), e);
            }
        }
    }

    info!(
        "Cleanup freed {:.1} MB across {} files (budget {:.1} MB)",
        stats.mb_freed, stats.files_deleted, amount_to_delete_mb
    );
    Ok(stats)
}
