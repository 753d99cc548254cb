use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;

/// Operator-facing configuration, loaded from an optional `Lakesweep.toml`.
/// Every field has a default so a missing file yields a working setup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub root_path: String,
    /// 0 = by asset, 1 = by asset+index, 2 = full entity.
    #[serde(default = "default_granularity")]
    pub granularity: u32,
    #[serde(default = "default_limit_mb")]
    pub limit_mb: f64,
    /// Cleanup target as a fraction of the ceiling.
    #[serde(default = "default_target_pct")]
    pub target_pct: f64,
    #[serde(default = "default_retention_hours")]
    pub min_retention_hours: u32,
    #[serde(default = "default_max_deletions")]
    pub max_deletions: usize,
    #[serde(default = "default_schedule_hour")]
    pub schedule_hour: u32,
    #[serde(default)]
    pub schedule_minute: u32,
    /// 0 selects daily mode at the configured time.
    #[serde(default)]
    pub interval_minutes: u32,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_db_path() -> String {
    "lakesweep.db".to_string()
}
fn default_granularity() -> u32 {
    2
}
fn default_limit_mb() -> f64 {
    10_240.0
}
fn default_target_pct() -> f64 {
    0.70
}
fn default_retention_hours() -> u32 {
    24
}
fn default_max_deletions() -> usize {
    500
}
fn default_schedule_hour() -> u32 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            root_path: String::new(),
            granularity: default_granularity(),
            limit_mb: default_limit_mb(),
            target_pct: default_target_pct(),
            min_retention_hours: default_retention_hours(),
            max_deletions: default_max_deletions(),
            schedule_hour: default_schedule_hour(),
            schedule_minute: 0,
            interval_minutes: 0,
            ignore_patterns: Vec::new(),
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Lakesweep").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
