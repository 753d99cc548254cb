pub mod analysis;
pub mod config;
pub mod datagen;
pub mod engine;
pub mod error;
pub mod progress;
pub mod scanner;
pub mod scheduler;
pub mod storage;

pub use analysis::forecast::ForecastData;
pub use analysis::reaper::{CleanupStats, ReaperLimits};
pub use analysis::threshold::{Action, Evaluation};
pub use config::AppConfig;
pub use engine::{CleanupOutcome, CycleParams, Engine, EngineStatus, FullOutcome, ScanSummary};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use scanner::{ScanEntry, ScanResult, ScannedFile};
pub use scheduler::ScheduleSpec;
pub use storage::models::{AssetRef, Category, Granularity};
