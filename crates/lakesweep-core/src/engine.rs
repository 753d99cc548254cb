use crate::analysis::forecast::{self, ForecastData, HISTORY_WINDOW_DAYS};
use crate::analysis::reaper::{self, CleanupStats, ReaperLimits};
use crate::analysis::threshold::{self, Action, Evaluation};
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::scanner::{self, ScanResult};
use crate::scheduler::{ScheduleSpec, Scheduler};
use crate::storage::models::{DeletionRecord, Granularity, StorageRecord, WeightRecord};
use crate::storage::Database;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Inputs for one pipeline cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleParams {
    pub root: PathBuf,
    pub granularity: Granularity,
    pub limit_mb: f64,
    pub ignore_patterns: Vec<String>,
    pub limits: ReaperLimits,
}

/// Mutable engine state: the open store plus the latest scan and forecast.
/// Cached because `evaluate` and `cleanup` may be invoked in isolation
/// between scans. Guarded by one mutex that serializes every public
/// operation, including the scheduler's background cycles.
pub struct EngineCore {
    pub(crate) db: Database,
    pub(crate) last_scan: Option<ScanResult>,
    pub(crate) last_forecast: Option<ForecastData>,
}

/// The storage-management engine: an explicit value owned by the caller.
/// All operations are methods; binding hosts that need a handle-free API
/// wrap one of these in a process-wide singleton.
pub struct Engine {
    shared: Arc<Mutex<EngineCore>>,
    scheduler: Scheduler,
    limits: ReaperLimits,
    ignore_patterns: Vec<String>,
}

/// Condensed result of a scan operation.
#[derive(Debug, Clone, Copy)]
pub struct ScanSummary {
    pub total_mb: f64,
    pub total_files: usize,
    pub entities: usize,
    pub unreadable_dirs: usize,
}

/// Result of an explicit-target cleanup.
#[derive(Debug, Clone, Copy)]
pub struct CleanupOutcome {
    pub files_deleted: usize,
    pub mb_freed: f64,
    pub new_usage_mb: f64,
    pub new_usage_pct: f64,
}

/// Result of one full pipeline cycle.
#[derive(Debug, Clone, Copy)]
pub struct FullOutcome {
    pub current_mb: f64,
    pub predicted_mb: f64,
    pub growth_rate: f64,
    pub limit_mb: f64,
    pub usage_pct: f64,
    pub action: Action,
    pub files_deleted: usize,
    pub mb_freed: f64,
    pub history_days: i64,
}

/// Snapshot of the engine's cached metrics and scheduler state.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub scheduled: bool,
    pub current_mb: f64,
    pub predicted_mb: f64,
    pub last_run: String,
    pub next_run: String,
}

impl Engine {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, Error> {
        let db = Database::open(db_path)?;
        Ok(Self::from_db(db))
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let db = Database::open_in_memory()?;
        Ok(Self::from_db(db))
    }

    fn from_db(db: Database) -> Self {
        Self {
            shared: Arc::new(Mutex::new(EngineCore {
                db,
                last_scan: None,
                last_forecast: None,
            })),
            scheduler: Scheduler::new(),
            limits: ReaperLimits::default(),
            ignore_patterns: Vec::new(),
        }
    }

    pub fn with_reaper_limits(mut self, limits: ReaperLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Stop the scheduler and release the worker. The store closes when the
    /// engine is dropped.
    pub fn shutdown(&self) {
        self.scheduler.stop();
    }

    // ── Pipeline operations ──────────────────────────────────────

    /// Walk the tree, cache the result, and persist today's snapshot rows.
    /// A scan that finds no schema-valid files is cached but not persisted,
    /// and reported as data absence.
    pub fn scan(
        &self,
        root: &Path,
        granularity: Granularity,
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanSummary, Error> {
        let mut core = self.shared.lock().unwrap();
        let result = scanner::scan_tree(root, granularity, &self.ignore_patterns, reporter);
        let summary = ScanSummary {
            total_mb: result.total_mb,
            total_files: result.total_files,
            entities: result.entries.len(),
            unreadable_dirs: result.unreadable_dirs,
        };

        if result.total_files == 0 {
            core.last_scan = Some(result);
            return Err(Error::NoData);
        }

        core.db.insert_snapshots(&snapshot_records(&result))?;
        core.last_scan = Some(result);
        Ok(summary)
    }

    /// Project tomorrow's total from recent history plus the cached scan,
    /// persist the forecast, and cache it.
    pub fn forecast(&self) -> Result<ForecastData, Error> {
        let mut core = self.shared.lock().unwrap();
        let current = core.last_scan.as_ref().map(|s| s.total_mb).unwrap_or(0.0);
        let data = forecast::project(&core.db, current)?;
        forecast::store(&core.db, &data)?;
        core.last_forecast = Some(data);
        Ok(data)
    }

    /// Pure evaluation of the cached forecast against a capacity ceiling.
    pub fn evaluate(&self, limit_mb: f64) -> Evaluation {
        let core = self.shared.lock().unwrap();
        let predicted = core.last_forecast.map(|f| f.predicted_mb).unwrap_or(0.0);
        threshold::evaluate(predicted, limit_mb)
    }

    /// Reclaim space from the cached scan until usage reaches
    /// `target_pct` of the ceiling, or the candidates are exhausted.
    pub fn cleanup(&self, limit_mb: f64, target_pct: f64) -> Result<CleanupOutcome, Error> {
        let mut guard = self.shared.lock().unwrap();
        let core = &mut *guard;

        let current = core.last_scan.as_ref().map(|s| s.total_mb).unwrap_or(0.0);
        let amount = current - limit_mb * target_pct;

        let mut stats = CleanupStats::default();
        if amount > 0.0 {
            if let Some(scan) = core.last_scan.as_mut() {
                stats =
                    reaper::execute_cleanup(&core.db, &mut scan.all_files, amount, &self.limits)?;
            }
        }

        let new_usage_mb = current - stats.mb_freed;
        Ok(CleanupOutcome {
            files_deleted: stats.files_deleted,
            mb_freed: stats.mb_freed,
            new_usage_mb,
            new_usage_pct: if limit_mb > 0.0 {
                new_usage_mb / limit_mb * 100.0
            } else {
                0.0
            },
        })
    }

    /// The blocking, single-cycle form of the pipeline.
    pub fn execute_full(
        &self,
        root: &Path,
        granularity: Granularity,
        limit_mb: f64,
        reporter: &dyn ProgressReporter,
    ) -> Result<FullOutcome, Error> {
        let params = self.cycle_params(root, granularity, limit_mb);
        let mut core = self.shared.lock().unwrap();
        run_cycle(&mut core, &params, reporter)
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn get_weights(&self) -> Result<Vec<WeightRecord>, Error> {
        let core = self.shared.lock().unwrap();
        Ok(core.db.get_average_weights(HISTORY_WINDOW_DAYS)?)
    }

    pub fn history_day_count(&self) -> Result<i64, Error> {
        let core = self.shared.lock().unwrap();
        Ok(core.db.get_history_day_count()?)
    }

    pub fn deletion_logs(&self, limit: usize) -> Result<Vec<DeletionRecord>, Error> {
        let core = self.shared.lock().unwrap();
        Ok(core.db.get_deletion_logs(limit)?)
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<(), Error> {
        let core = self.shared.lock().unwrap();
        Ok(core.db.set_config(key, value)?)
    }

    pub fn get_config(&self, key: &str, default: &str) -> Result<String, Error> {
        let core = self.shared.lock().unwrap();
        Ok(core.db.get_config(key, default)?)
    }

    pub fn scheduler_settings(&self) -> Result<crate::storage::models::SchedulerSettings, Error> {
        let core = self.shared.lock().unwrap();
        Ok(core.db.get_scheduler_settings()?)
    }

    pub fn status(&self) -> Result<EngineStatus, Error> {
        let core = self.shared.lock().unwrap();
        Ok(EngineStatus {
            scheduled: self.scheduler.is_running(),
            current_mb: core.last_scan.as_ref().map(|s| s.total_mb).unwrap_or(0.0),
            predicted_mb: core.last_forecast.map(|f| f.predicted_mb).unwrap_or(0.0),
            last_run: core.db.get_config("last_run", "")?,
            next_run: self.scheduler.next_run(),
        })
    }

    // ── Scheduling ───────────────────────────────────────────────

    /// Start the background worker in daily-at-`(hour, minute)` mode.
    pub fn schedule_daily(
        &self,
        root: &Path,
        granularity: Granularity,
        limit_mb: f64,
        hour: u32,
        minute: u32,
    ) -> Result<(), Error> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidInput(format!(
                "invalid schedule time {:02}:{:02}",
                hour, minute
            )));
        }
        let spec = ScheduleSpec {
            params: self.cycle_params(root, granularity, limit_mb),
            hour,
            minute,
            interval_minutes: 0,
        };
        self.scheduler.start(spec, Arc::clone(&self.shared))?;
        let core = self.shared.lock().unwrap();
        core.db.update_scheduler_settings(hour, minute, true)?;
        Ok(())
    }

    /// Start the background worker in fixed-interval mode.
    pub fn schedule_interval(
        &self,
        root: &Path,
        granularity: Granularity,
        limit_mb: f64,
        interval_minutes: u32,
    ) -> Result<(), Error> {
        if interval_minutes == 0 {
            return Err(Error::InvalidInput(
                "interval must be at least one minute".to_string(),
            ));
        }
        let spec = ScheduleSpec {
            params: self.cycle_params(root, granularity, limit_mb),
            hour: 0,
            minute: 0,
            interval_minutes,
        };
        self.scheduler.start(spec, Arc::clone(&self.shared))?;
        let core = self.shared.lock().unwrap();
        core.db.set_scheduler_enabled(true)?;
        Ok(())
    }

    /// Stop the background worker. Does not take the engine lock before the
    /// worker has exited, so a long cycle cannot deadlock shutdown.
    pub fn schedule_stop(&self) -> Result<(), Error> {
        self.scheduler.stop();
        let core = self.shared.lock().unwrap();
        core.db.set_scheduler_enabled(false)?;
        Ok(())
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduler.is_running()
    }

    // ── Synthetic data ───────────────────────────────────────────

    pub fn generate_test_data(
        &self,
        root: &Path,
        size_gb: f64,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), Error> {
        let core = self.shared.lock().unwrap();
        crate::datagen::generate_test_data(&core.db, root, size_gb, reporter)
    }

    pub fn generate_one_day(
        &self,
        root: &Path,
        day_size_mb: f64,
        day_offset: i64,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), Error> {
        let core = self.shared.lock().unwrap();
        crate::datagen::generate_one_day(&core.db, root, day_size_mb, day_offset, reporter)
    }

    fn cycle_params(&self, root: &Path, granularity: Granularity, limit_mb: f64) -> CycleParams {
        CycleParams {
            root: root.to_path_buf(),
            granularity,
            limit_mb,
            ignore_patterns: self.ignore_patterns.clone(),
            limits: self.limits,
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}

/// One complete pipeline cycle on a locked core:
/// scan → snapshot → forecast → persist → evaluate → reap → record run.
/// Also used by the scheduler worker.
pub(crate) fn run_cycle(
    core: &mut EngineCore,
    params: &CycleParams,
    reporter: &dyn ProgressReporter,
) -> Result<FullOutcome, Error> {
    // Phase 1: scan
    let scan = scanner::scan_tree(
        &params.root,
        params.granularity,
        &params.ignore_patterns,
        reporter,
    );
    if scan.total_files == 0 {
        core.last_scan = Some(scan);
        return Err(Error::NoData);
    }
    let current_mb = scan.total_mb;
    core.db.insert_snapshots(&snapshot_records(&scan))?;
    core.last_scan = Some(scan);

    // Phase 2: forecast
    let data = forecast::project(&core.db, current_mb)?;
    forecast::store(&core.db, &data)?;
    core.last_forecast = Some(data);

    // Phase 3: evaluate
    let eval = threshold::evaluate(data.predicted_mb, params.limit_mb);

    // Phase 4: reap if needed
    let mut stats = CleanupStats::default();
    if eval.action == Action::Cleanup && eval.amount_to_delete_mb > 0.0 {
        if let Some(scan) = core.last_scan.as_mut() {
            stats = reaper::execute_cleanup(
                &core.db,
                &mut scan.all_files,
                eval.amount_to_delete_mb,
                &params.limits,
            )?;
        }
    }

    let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    core.db.set_config("last_run", &now)?;

    info!(
        "Cycle complete: {:.1} MB current, {:.1} MB predicted, action {}",
        current_mb, data.predicted_mb, eval.action
    );

    Ok(FullOutcome {
        current_mb,
        predicted_mb: data.predicted_mb,
        growth_rate: data.growth_rate,
        limit_mb: params.limit_mb,
        usage_pct: if params.limit_mb > 0.0 {
            current_mb / params.limit_mb * 100.0
        } else {
            0.0
        },
        action: eval.action,
        files_deleted: stats.files_deleted,
        mb_freed: stats.mb_freed,
        history_days: data.days_available,
    })
}

fn snapshot_records(scan: &ScanResult) -> Vec<StorageRecord> {
    scan.entries
        .iter()
        .map(|e| StorageRecord {
            id: 0,
            entity: e.entity.clone(),
            date: e.date.clone(),
            size_mb: e.size_mb,
            file_count: e.file_count,
        })
        .collect()
}
