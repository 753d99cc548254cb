/// Category axis of the entity taxonomy. On disk a category directory is
/// exactly `E` or `F`; `Any` marks an aggregation over both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Specific(char),
    Any,
}

impl Category {
    /// Accept a directory name as a category level. Only `E` and `F` match.
    pub fn parse_dir(name: &str) -> Option<Category> {
        match name {
            "E" => Some(Category::Specific('E')),
            "F" => Some(Category::Specific('F')),
            _ => None,
        }
    }

    /// Storage encoding: the wildcard is persisted as `*`.
    pub fn as_db(&self) -> String {
        match self {
            Category::Specific(c) => c.to_string(),
            Category::Any => "*".to_string(),
        }
    }

    pub fn from_db(s: &str) -> Category {
        match s.chars().next() {
            Some('*') | None => Category::Any,
            Some(c) => Category::Specific(c),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_db())
    }
}

/// Identifies an entity `(asset, index, category)` or an aggregation over
/// entities; `None` / `Any` mean "any" at that level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetRef {
    pub asset: String,
    pub index: Option<u32>,
    pub category: Category,
}

impl AssetRef {
    pub fn new(asset: impl Into<String>, index: Option<u32>, category: Category) -> Self {
        Self {
            asset: asset.into(),
            index,
            category,
        }
    }

    /// Storage encoding: the index wildcard is persisted as `-1`.
    pub fn index_db(&self) -> i64 {
        self.index.map(i64::from).unwrap_or(-1)
    }

    pub fn index_from_db(v: i64) -> Option<u32> {
        u32::try_from(v).ok()
    }
}

/// Aggregation level for snapshot rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// Roll up by asset only.
    Asset,
    /// Roll up by asset and index.
    AssetIndex,
    /// Full `(asset, index, category)` entity.
    #[default]
    Entity,
}

impl Granularity {
    /// Numeric levels used at the API boundary: 0, 1, and 2-or-greater.
    pub fn from_level(level: u32) -> Granularity {
        match level {
            0 => Granularity::Asset,
            1 => Granularity::AssetIndex,
            _ => Granularity::Entity,
        }
    }

    pub fn level(&self) -> u32 {
        match self {
            Granularity::Asset => 0,
            Granularity::AssetIndex => 1,
            Granularity::Entity => 2,
        }
    }
}

/// One day's aggregated occupancy for one entity (or aggregation).
/// Append-only; a repeated `(entity, date)` insertion adds another row.
#[derive(Debug, Clone)]
pub struct StorageRecord {
    pub id: i64,
    pub entity: AssetRef,
    pub date: String,
    pub size_mb: f64,
    pub file_count: i64,
}

/// A persisted next-day prediction. The latest is the row with the
/// largest id.
#[derive(Debug, Clone)]
pub struct ForecastRow {
    pub id: i64,
    pub forecast_date: String,
    pub predicted_mb: f64,
    pub created_at: String,
}

/// Audit row for one physically deleted file.
#[derive(Debug, Clone)]
pub struct DeletionRecord {
    pub file_path: String,
    pub asset: String,
    pub size_mb: f64,
    pub reason: String,
    pub deleted_at: String,
}

/// Per-entity aggregate over a history window.
#[derive(Debug, Clone)]
pub struct WeightRecord {
    pub entity: AssetRef,
    pub avg_mb: f64,
    pub total_mb: f64,
    pub day_count: i64,
}

/// The singleton scheduler settings row.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub hour: u32,
    pub minute: u32,
    pub last_run: Option<String>,
    pub is_enabled: bool,
}
