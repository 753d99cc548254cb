/// Trait for reporting long-running operation progress.
///
/// The CLI implements this with indicatif, the FFI layer with a C function
/// pointer callback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _files_found: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    /// Fired at entity boundaries during synthetic data generation.
    fn on_generate_progress(&self, _percent: u32, _message: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
