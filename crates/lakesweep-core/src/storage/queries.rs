use super::models::*;
use super::sqlite::Database;
use rusqlite::types::ToSql;
use rusqlite::{params, OptionalExtension, Result};
use tracing::debug;

impl Database {
    // ── Snapshots ────────────────────────────────────────────────

    pub fn insert_snapshot(&self, rec: &StorageRecord) -> Result<()> {
        self.connection().execute(
            "INSERT INTO storage_history (asset, index_val, category, measurement_date, size_mb, file_count) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                rec.entity.asset,
                rec.entity.index_db(),
                rec.entity.category.as_db(),
                rec.date,
                rec.size_mb,
                rec.file_count,
            ],
        )?;
        Ok(())
    }

    /// Append one row per record inside a single transaction.
    pub fn insert_snapshots(&self, recs: &[StorageRecord]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO storage_history \
                 (asset, index_val, category, measurement_date, size_mb, file_count) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for rec in recs {
                count += stmt.execute(params![
                    rec.entity.asset,
                    rec.entity.index_db(),
                    rec.entity.category.as_db(),
                    rec.date,
                    rec.size_mb,
                    rec.file_count,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Appended {} snapshot rows", count);
        Ok(count)
    }

    /// All snapshots with `date >= today - days`, oldest first. A filter
    /// constrains by asset, and by index/category where those are specific;
    /// wildcards match every row.
    pub fn get_history(&self, days: i64, filter: Option<&AssetRef>) -> Result<Vec<StorageRecord>> {
        let window = format!("-{} days", days);
        let index_db;
        let category_db;
        let mut sql = String::from(
            "SELECT id, asset, index_val, category, measurement_date, size_mb, file_count \
             FROM storage_history \
             WHERE measurement_date >= date('now','localtime', ?)",
        );
        let mut args: Vec<&dyn ToSql> = vec![&window];

        if let Some(f) = filter {
            sql.push_str(" AND asset = ?");
            args.push(&f.asset);
            if f.index.is_some() {
                index_db = f.index_db();
                sql.push_str(" AND index_val = ?");
                args.push(&index_db);
            }
            if matches!(f.category, Category::Specific(_)) {
                category_db = f.category.as_db();
                sql.push_str(" AND category = ?");
                args.push(&category_db);
            }
        }
        sql.push_str(" ORDER BY measurement_date ASC");

        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt
            .query_map(&args[..], |row| {
                Ok(StorageRecord {
                    id: row.get(0)?,
                    entity: AssetRef {
                        asset: row.get(1)?,
                        index: AssetRef::index_from_db(row.get(2)?),
                        category: Category::from_db(&row.get::<_, String>(3)?),
                    },
                    date: row.get(4)?,
                    size_mb: row.get(5)?,
                    file_count: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Sum of `size_mb` over snapshots recorded for the local calendar day.
    pub fn get_total_current_mb(&self) -> Result<f64> {
        self.connection().query_row(
            "SELECT COALESCE(SUM(size_mb), 0) FROM storage_history \
             WHERE measurement_date = date('now','localtime')",
            [],
            |row| row.get(0),
        )
    }

    // ── Forecasts ────────────────────────────────────────────────

    pub fn insert_forecast(&self, forecast_date: &str, predicted_mb: f64) -> Result<()> {
        self.connection().execute(
            "INSERT INTO storage_forecast (forecast_date, predicted_mb) VALUES (?1, ?2)",
            params![forecast_date, predicted_mb],
        )?;
        Ok(())
    }

    /// The forecast row with the largest id, if any.
    pub fn get_latest_forecast(&self) -> Result<Option<ForecastRow>> {
        self.connection()
            .query_row(
                "SELECT id, forecast_date, predicted_mb, created_at \
                 FROM storage_forecast ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(ForecastRow {
                        id: row.get(0)?,
                        forecast_date: row.get(1)?,
                        predicted_mb: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
    }

    // ── Deletion audit ───────────────────────────────────────────

    pub fn log_deletion(&self, rec: &DeletionRecord) -> Result<()> {
        self.connection().execute(
            "INSERT INTO deletion_log (file_path, asset, size_mb, reason) VALUES (?1, ?2, ?3, ?4)",
            params![rec.file_path, rec.asset, rec.size_mb, rec.reason],
        )?;
        Ok(())
    }

    pub fn get_deletion_logs(&self, limit: usize) -> Result<Vec<DeletionRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT file_path, asset, size_mb, reason, deleted_at \
             FROM deletion_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(DeletionRecord {
                    file_path: row.get(0)?,
                    asset: row.get(1)?,
                    size_mb: row.get(2)?,
                    reason: row.get(3)?,
                    deleted_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── Aggregates ───────────────────────────────────────────────

    /// Mean, sum and distinct-day count per entity over the window.
    pub fn get_average_weights(&self, days: i64) -> Result<Vec<WeightRecord>> {
        let window = format!("-{} days", days);
        let mut stmt = self.connection().prepare(
            "SELECT asset, index_val, category, \
                    AVG(size_mb), SUM(size_mb), COUNT(DISTINCT measurement_date) \
             FROM storage_history \
             WHERE measurement_date >= date('now','localtime', ?1) \
             GROUP BY asset, index_val, category \
             ORDER BY asset, index_val, category",
        )?;
        let rows = stmt
            .query_map(params![window], |row| {
                Ok(WeightRecord {
                    entity: AssetRef {
                        asset: row.get(0)?,
                        index: AssetRef::index_from_db(row.get(1)?),
                        category: Category::from_db(&row.get::<_, String>(2)?),
                    },
                    avg_mb: row.get(3)?,
                    total_mb: row.get(4)?,
                    day_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_history_day_count(&self) -> Result<i64> {
        self.connection().query_row(
            "SELECT COUNT(DISTINCT measurement_date) FROM storage_history",
            [],
            |row| row.get(0),
        )
    }

    // ── Config KV ────────────────────────────────────────────────

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.connection().execute(
            "INSERT OR REPLACE INTO configuration (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str, default: &str) -> Result<String> {
        let value: Option<String> = self
            .connection()
            .query_row(
                "SELECT value FROM configuration WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    // ── Scheduler settings ───────────────────────────────────────

    pub fn get_scheduler_settings(&self) -> Result<SchedulerSettings> {
        self.connection().query_row(
            "SELECT schedule_hour, schedule_minute, last_run, is_enabled \
             FROM scheduler_config WHERE id = 1",
            [],
            |row| {
                Ok(SchedulerSettings {
                    hour: row.get::<_, i64>(0)? as u32,
                    minute: row.get::<_, i64>(1)? as u32,
                    last_run: row.get(2)?,
                    is_enabled: row.get::<_, i64>(3)? != 0,
                })
            },
        )
    }

    pub fn update_scheduler_settings(&self, hour: u32, minute: u32, enabled: bool) -> Result<()> {
        self.connection().execute(
            "UPDATE scheduler_config SET schedule_hour = ?1, schedule_minute = ?2, is_enabled = ?3 \
             WHERE id = 1",
            params![i64::from(hour), i64::from(minute), enabled as i64],
        )?;
        Ok(())
    }

    pub fn set_scheduler_enabled(&self, enabled: bool) -> Result<()> {
        self.connection().execute(
            "UPDATE scheduler_config SET is_enabled = ?1 WHERE id = 1",
            params![enabled as i64],
        )?;
        Ok(())
    }
}
