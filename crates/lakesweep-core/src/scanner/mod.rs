pub mod walk;

pub use walk::scan_tree;

use crate::storage::models::{AssetRef, Category};
use std::path::PathBuf;

/// A file discovered at the leaf of the schema walk. Transient: produced by
/// one scan cycle and consumed by the reaper in the same cycle.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub full_path: PathBuf,
    pub size_mb: f64,
    /// Last-modification time as Unix seconds. FIFO ordering is
    /// oldest-modified, not oldest-created.
    pub created_time: i64,
    pub asset: String,
    pub index: u32,
    pub category: char,
    pub date: String,
}

impl ScannedFile {
    pub fn entity(&self) -> AssetRef {
        AssetRef::new(
            self.asset.clone(),
            Some(self.index),
            Category::Specific(self.category),
        )
    }
}

/// Per-aggregation-key roll-up of one scan, tagged with today's date.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub entity: AssetRef,
    pub date: String,
    pub size_mb: f64,
    pub file_count: i64,
}

/// Output of one tree scan. `entries` is keyed at the requested granularity;
/// `all_files` is always the full leaf-level list.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub total_mb: f64,
    pub total_files: usize,
    pub entries: Vec<ScanEntry>,
    pub all_files: Vec<ScannedFile>,
    /// Directories whose enumeration failed and were treated as empty.
    pub unreadable_dirs: usize,
}
