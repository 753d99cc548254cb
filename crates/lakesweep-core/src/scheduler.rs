use crate::engine::{self, CycleParams, EngineCore};
use crate::error::Error;
use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What and when the background worker runs. `interval_minutes > 0` selects
/// interval mode; zero selects daily-at-`(hour, minute)` mode.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub params: CycleParams,
    pub hour: u32,
    pub minute: u32,
    pub interval_minutes: u32,
}

/// Cooperative background driver for the pipeline. One long-lived worker
/// thread; `stop()` only sets the cancellation flag and joins, so shutdown
/// can never deadlock behind a cycle holding the engine lock.
pub struct Scheduler {
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    spec: Mutex<Option<ScheduleSpec>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            spec: Mutex::new(None),
        }
    }

    /// Spawn the worker. Returns `SchedulerBusy` if it is already running.
    pub fn start(&self, spec: ScheduleSpec, shared: Arc<Mutex<EngineCore>>) -> Result<(), Error> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::SchedulerBusy);
        }

        *self.spec.lock().unwrap() = Some(spec.clone());
        let running = Arc::clone(&self.running);
        let handle = thread::spawn(move || run_loop(running, spec, shared));
        *self.worker.lock().unwrap() = Some(handle);
        info!("Scheduler started");
        Ok(())
    }

    /// Request cancellation and join the worker. Synchronous; the worker
    /// observes the flag within one sleep slice.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().unwrap().take() {
            if handle.join().is_err() {
                warn!("Scheduler worker panicked before exit");
            }
            info!("Scheduler stopped");
        }
        *self.spec.lock().unwrap() = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The next fire time as a formatted local timestamp, recomputed on
    /// demand. Empty when the scheduler is not running.
    pub fn next_run(&self) -> String {
        if !self.is_running() {
            return String::new();
        }
        match self.spec.lock().unwrap().as_ref() {
            Some(spec) => next_fire_time(spec, Local::now()).format("%Y-%m-%d %H:%M").to_string(),
            None => String::new(),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    running: Arc<AtomicBool>,
    spec: ScheduleSpec,
    shared: Arc<Mutex<EngineCore>>,
) {
    while running.load(Ordering::Relaxed) {
        let wait_secs = (next_fire_time(&spec, Local::now()) - Local::now())
            .num_seconds()
            .max(0);

        // Sleep in bounded slices so stop() is observed within a second.
        let mut waited = 0;
        while waited < wait_secs && running.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_secs(1));
            waited += 1;
        }
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let mut core = shared.lock().unwrap();
        match engine::run_cycle(&mut core, &spec.params, &crate::progress::SilentReporter) {
            Ok(outcome) => debug!(
                "Scheduled cycle complete: action {}, {} files deleted",
                outcome.action, outcome.files_deleted
            ),
            // A failing cycle does not stop the worker; the next iteration
            // proceeds normally.
            Err(e) => warn!("Scheduled cycle failed: {}", e),
        }
    }
}

/// The next instant the worker should fire, given the mode.
fn next_fire_time(spec: &ScheduleSpec, now: DateTime<Local>) -> DateTime<Local> {
    if spec.interval_minutes > 0 {
        return now + ChronoDuration::minutes(i64::from(spec.interval_minutes));
    }
    next_daily_occurrence(now, spec.hour, spec.minute)
}

/// The next local occurrence of `(hour, minute, 00)`; same time tomorrow if
/// that instant is already past.
fn next_daily_occurrence(now: DateTime<Local>, hour: u32, minute: u32) -> DateTime<Local> {
    let fallback = now + ChronoDuration::days(1);
    let today = match now.date_naive().and_hms_opt(hour, minute, 0) {
        Some(t) => t,
        None => return fallback,
    };
    let target = match Local.from_local_datetime(&today).earliest() {
        Some(t) => t,
        None => return fallback,
    };
    if target <= now {
        target + ChronoDuration::days(1)
    } else {
        target
    }
}
