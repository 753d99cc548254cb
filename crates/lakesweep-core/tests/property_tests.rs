//! Property suite for the policy layer: forecast clamp and trend, the
//! threshold ladder, and the reaper's joint guarantees (budget bound,
//! oldest-first order, retention floor, survivor floor, hard cap, audit
//! fidelity).

use chrono::{Duration, Local};
use lakesweep_core::analysis::reaper::{execute_cleanup, ReaperLimits};
use lakesweep_core::analysis::threshold::{evaluate, Action};
use lakesweep_core::scanner::ScannedFile;
use lakesweep_core::storage::models::{AssetRef, Category, StorageRecord};
use lakesweep_core::storage::Database;
use lakesweep_core::{analysis::forecast, Engine, SilentReporter};
use proptest::prelude::*;
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;

fn local_date(offset_days: i64) -> String {
    (Local::now() + Duration::days(offset_days))
        .format("%Y-%m-%d")
        .to_string()
}

fn seed_history(db: &Database, daily_totals: &[f64]) {
    // Oldest day first, newest is today.
    let n = daily_totals.len() as i64;
    for (i, &total) in daily_totals.iter().enumerate() {
        db.insert_snapshot(&StorageRecord {
            id: 0,
            entity: AssetRef::new("A1", Some(1), Category::Specific('E')),
            date: local_date(i as i64 - (n - 1)),
            size_mb: total,
            file_count: 1,
        })
        .unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// predicted_mb >= 0 for any history and current total.
    #[test]
    fn prop_forecast_never_negative(
        daily in prop::collection::vec(0.0f64..10_000.0, 0..12),
        current in 0.0f64..10_000.0,
    ) {
        let db = Database::open_in_memory().unwrap();
        seed_history(&db, &daily);
        let data = forecast::project(&db, current).unwrap();
        prop_assert!(data.predicted_mb >= 0.0);
    }

    /// With fewer than two days of history the prediction is exactly the
    /// current total; with more, it does not depend on the current total.
    #[test]
    fn prop_forecast_current_dependency(
        daily in prop::collection::vec(0.0f64..10_000.0, 2..12),
        current_a in 0.0f64..10_000.0,
        current_b in 0.0f64..10_000.0,
    ) {
        let empty = Database::open_in_memory().unwrap();
        let data = forecast::project(&empty, current_a).unwrap();
        prop_assert_eq!(data.predicted_mb, current_a);

        let db = Database::open_in_memory().unwrap();
        seed_history(&db, &daily);
        let a = forecast::project(&db, current_a).unwrap();
        let b = forecast::project(&db, current_b).unwrap();
        prop_assert_eq!(a.predicted_mb, b.predicted_mb);
        prop_assert_eq!(a.growth_rate, b.growth_rate);
    }

    /// The action ladder is exactly the piecewise definition of the
    /// capacity ratio, and only CLEANUP carries a deletion budget.
    #[test]
    fn prop_threshold_ladder(
        predicted in 0.0f64..100_000.0,
        limit in 1.0f64..50_000.0,
    ) {
        let eval = evaluate(predicted, limit);
        let pct = predicted / limit * 100.0;

        let expected = if pct < 85.0 {
            Action::Safe
        } else if pct < 90.0 {
            Action::Monitor
        } else if pct < 95.0 {
            Action::Caution
        } else {
            Action::Cleanup
        };
        prop_assert_eq!(eval.action, expected);

        if eval.action == Action::Cleanup {
            let want = (predicted - limit * 0.70).max(0.0);
            prop_assert!((eval.amount_to_delete_mb - want).abs() < 1e-9);
        } else {
            prop_assert_eq!(eval.amount_to_delete_mb, 0.0);
        }
    }

    /// A non-positive ceiling disables the ladder.
    #[test]
    fn prop_threshold_nonpositive_limit(
        predicted in 0.0f64..100_000.0,
        limit in -1_000.0f64..=0.0,
    ) {
        let eval = evaluate(predicted, limit);
        prop_assert_eq!(eval.action, Action::Safe);
        prop_assert_eq!(eval.amount_to_delete_mb, 0.0);
    }

    /// The reaper's guarantees hold jointly for arbitrary candidate sets.
    #[test]
    fn prop_reaper_invariants(
        specs in prop::collection::vec(
            (0u8..3, 0i64..72, 0.1f64..4.0),
            0..25,
        ),
        amount in 0.0f64..20.0,
        max_deletions in 1usize..8,
    ) {
        let tmp = tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let now = Local::now().timestamp();

        let mut files: Vec<ScannedFile> = specs
            .iter()
            .enumerate()
            .map(|(i, &(entity, age_hours, size_mb))| {
                let path = tmp.path().join(format!("f{:03}.dat", i));
                fs::write(&path, b"x").unwrap();
                ScannedFile {
                    full_path: path,
                    size_mb,
                    created_time: now - age_hours * 3600,
                    asset: format!("A{}", entity),
                    index: 1,
                    category: 'E',
                    date: "2026-01-15".to_string(),
                }
            })
            .collect();

        let by_path: HashMap<String, ScannedFile> = files
            .iter()
            .map(|f| (f.full_path.to_string_lossy().into_owned(), f.clone()))
            .collect();
        let mut initial_counts: HashMap<String, i64> = HashMap::new();
        for f in &files {
            *initial_counts.entry(f.asset.clone()).or_default() += 1;
        }

        let limits = ReaperLimits { min_retention_hours: 24, max_deletions };
        let stats = execute_cleanup(&db, &mut files, amount, &limits).unwrap();

        // Hard cap.
        prop_assert!(stats.files_deleted <= max_deletions);

        // Budget bound: one overshoot permitted.
        let max_single = specs.iter().map(|s| s.2).fold(0.0f64, f64::max);
        prop_assert!(stats.mb_freed <= amount + max_single + 1e-9);

        // Audit fidelity and per-candidate floors.
        let mut logs = db.get_deletion_logs(1000).unwrap();
        logs.reverse(); // oldest audit row first
        prop_assert_eq!(logs.len(), stats.files_deleted);

        let mut freed_per_entity: HashMap<String, i64> = HashMap::new();
        let mut previous_time = i64::MIN;
        for log in &logs {
            let candidate = by_path.get(&log.file_path).expect("audit row matches a candidate");
            // Retention floor: nothing younger than 24 h is audited.
            prop_assert!(candidate.created_time <= now - 24 * 3600);
            // Oldest-first: audit order is non-decreasing in mtime.
            prop_assert!(candidate.created_time >= previous_time);
            previous_time = candidate.created_time;
            // The file is really gone.
            prop_assert!(!std::path::Path::new(&log.file_path).exists());
            *freed_per_entity.entry(candidate.asset.clone()).or_default() += 1;
        }

        // Survivor floor, per entity.
        for (asset, initial) in &initial_counts {
            let deleted = freed_per_entity.get(asset).copied().unwrap_or(0);
            if *initial >= 5 {
                prop_assert!(initial - deleted >= 5);
            } else {
                prop_assert_eq!(deleted, 0);
            }
        }
    }
}

// Engine-level property: a full cycle over an always-safe ceiling never
// deletes, regardless of tree shape.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_safe_cycle_preserves_tree(file_count in 1usize..10) {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("lake");
        for i in 0..file_count {
            let dir = root.join("ASSET_01").join("1").join("E").join("2026").join("01").join("15");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("f{}.dat", i)), vec![0u8; 2048]).unwrap();
        }

        let engine = Engine::open(tmp.path().join("test.db")).unwrap();
        let outcome = engine
            .execute_full(
                &root,
                lakesweep_core::Granularity::Entity,
                1_000_000.0,
                &SilentReporter,
            )
            .unwrap();
        prop_assert_eq!(outcome.action, Action::Safe);
        prop_assert_eq!(outcome.files_deleted, 0);
        prop_assert_eq!(engine.deletion_logs(10).unwrap().len(), 0);
    }
}
