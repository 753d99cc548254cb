use crate::callbacks::FfiProgressBridge;
use crate::error::{map_core_error, set_last_error};
use crate::types::*;
use lakesweep_core::{Engine, Granularity, SilentReporter};
use std::ffi::c_char;
use std::path::Path;
use std::sync::Mutex;

// The process-wide engine instance for handle-free binding hosts. The core
// API is the explicit `Engine` value; this wrapper only binds one of them
// to the C ABI.
lazy_static! {
    static ref ENGINE: Mutex<Option<Engine>> = Mutex::new(None);
}

fn with_engine<F>(f: F) -> LwResultCode
where
    F: FnOnce(&Engine) -> LwResultCode,
{
    let guard = ENGINE.lock().unwrap();
    match guard.as_ref() {
        Some(engine) => f(engine),
        None => {
            set_last_error("Engine is not initialized".to_string());
            LwResultCode::ErrDb
        }
    }
}

fn granularity_from(level: i32) -> Granularity {
    Granularity::from_level(level.max(0) as u32)
}

/// Open (or create) the store and initialize the process-wide engine.
/// Replaces any previously initialized engine.
///
/// # Safety
/// `db_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn lw_init(db_path: *const c_char) -> LwResultCode {
    let path = match c_string_to_rust(db_path) {
        Some(s) => s,
        None => "lakesweep.db".to_string(),
    };

    match Engine::open(&path) {
        Ok(engine) => {
            let mut guard = ENGINE.lock().unwrap();
            if let Some(old) = guard.take() {
                old.shutdown();
            }
            *guard = Some(engine);
            LwResultCode::Ok
        }
        Err(e) => map_core_error(e),
    }
}

/// Stop the scheduler and close the store.
#[no_mangle]
pub extern "C" fn lw_shutdown() {
    let mut guard = ENGINE.lock().unwrap();
    if let Some(engine) = guard.take() {
        engine.shutdown();
    }
}

/// Scan the recording tree and record today's snapshot.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn lw_scan(root_path: *const c_char, granularity: i32) -> LwResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return LwResultCode::ErrPath;
        }
    };

    with_engine(|engine| {
        match engine.scan(Path::new(&root), granularity_from(granularity), &SilentReporter) {
            Ok(_) => LwResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    })
}

/// Compute and persist a next-day forecast from recent history plus the
/// cached scan.
///
/// # Safety
/// `out` may be null; when non-null it must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn lw_forecast(out: *mut LwForecastResult) -> LwResultCode {
    with_engine(|engine| match engine.forecast() {
        Ok(data) => {
            if !out.is_null() {
                *out = LwForecastResult {
                    current_mb: data.current_mb,
                    predicted_mb: data.predicted_mb,
                    growth_rate_mb_per_day: data.growth_rate,
                    history_days_available: data.days_available as i32,
                };
            }
            LwResultCode::Ok
        }
        Err(e) => map_core_error(e),
    })
}

/// Evaluate the cached forecast against a capacity ceiling.
///
/// # Safety
/// `out` may be null; when non-null it must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn lw_evaluate(limit_mb: f64, out: *mut LwEvalResult) -> LwResultCode {
    with_engine(|engine| {
        let eval = engine.evaluate(limit_mb);
        if !out.is_null() {
            *out = LwEvalResult {
                action: eval.action.code(),
                projected_pct: eval.projected_pct,
                amount_to_delete_mb: eval.amount_to_delete_mb,
            };
        }
        LwResultCode::Ok
    })
}

/// Reclaim space from the cached scan down to `target_pct` of the ceiling.
///
/// # Safety
/// `out` may be null; when non-null it must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn lw_cleanup(
    limit_mb: f64,
    target_pct: f64,
    out: *mut LwCleanupResult,
) -> LwResultCode {
    with_engine(|engine| match engine.cleanup(limit_mb, target_pct) {
        Ok(outcome) => {
            if !out.is_null() {
                *out = LwCleanupResult {
                    files_deleted: outcome.files_deleted as i32,
                    mb_freed: outcome.mb_freed,
                    new_usage_mb: outcome.new_usage_mb,
                    new_usage_pct: outcome.new_usage_pct,
                };
            }
            LwResultCode::Ok
        }
        Err(e) => map_core_error(e),
    })
}

/// Run the full pipeline once: scan, forecast, evaluate, cleanup, record.
/// `target_pct` is retained for ABI compatibility; the cycle derives its
/// deletion budget from the evaluator.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string; `out` may be null.
#[no_mangle]
pub unsafe extern "C" fn lw_execute_full(
    root_path: *const c_char,
    granularity: i32,
    limit_mb: f64,
    target_pct: f64,
    out: *mut LwFullResult,
) -> LwResultCode {
    let _ = target_pct;
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return LwResultCode::ErrPath;
        }
    };

    with_engine(|engine| {
        match engine.execute_full(
            Path::new(&root),
            granularity_from(granularity),
            limit_mb,
            &SilentReporter,
        ) {
            Ok(outcome) => {
                if !out.is_null() {
                    *out = LwFullResult {
                        current_mb: outcome.current_mb,
                        predicted_mb: outcome.predicted_mb,
                        growth_rate: outcome.growth_rate,
                        limit_mb: outcome.limit_mb,
                        usage_pct: outcome.usage_pct,
                        action: outcome.action.code(),
                        files_deleted: outcome.files_deleted as i32,
                        mb_freed: outcome.mb_freed,
                        history_days: outcome.history_days as i32,
                    };
                }
                LwResultCode::Ok
            }
            Err(e) => map_core_error(e),
        }
    })
}

/// Copy up to `buf_size` 14-day per-entity weights into `buf`.
///
/// # Safety
/// `buf` must point to at least `buf_size` `LwWeightInfo` slots; `out_count`
/// may be null.
#[no_mangle]
pub unsafe extern "C" fn lw_get_weights(
    buf: *mut LwWeightInfo,
    buf_size: i32,
    out_count: *mut i32,
) -> LwResultCode {
    if buf.is_null() || buf_size <= 0 {
        set_last_error("weight buffer is null or empty".to_string());
        return LwResultCode::ErrPath;
    }

    with_engine(|engine| match engine.get_weights() {
        Ok(weights) => {
            let count = weights.len().min(buf_size as usize);
            for (i, w) in weights.iter().take(count).enumerate() {
                let slot = &mut *buf.add(i);
                fill_c_buf(&mut slot.asset, &w.entity.asset);
                slot.index_val = w.entity.index.map(|v| v as i32).unwrap_or(-1);
                slot.category = w.entity.category.as_db().bytes().next().unwrap_or(b'*') as c_char;
                slot.avg_mb = w.avg_mb;
                slot.total_mb = w.total_mb;
                slot.day_count = w.day_count as i32;
            }
            if !out_count.is_null() {
                *out_count = count as i32;
            }
            LwResultCode::Ok
        }
        Err(e) => map_core_error(e),
    })
}

/// Number of distinct days present in history. Returns 0 when the engine is
/// not initialized.
#[no_mangle]
pub extern "C" fn lw_get_history_day_count() -> i32 {
    let guard = ENGINE.lock().unwrap();
    match guard.as_ref() {
        Some(engine) => engine.history_day_count().unwrap_or(0) as i32,
        None => 0,
    }
}

/// Start the scheduler in daily-at-`(hour, minute)` mode.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn lw_schedule_start(
    root_path: *const c_char,
    granularity: i32,
    limit_mb: f64,
    hour: i32,
    minute: i32,
) -> LwResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return LwResultCode::ErrPath;
        }
    };
    if hour < 0 || minute < 0 {
        set_last_error("negative schedule time".to_string());
        return LwResultCode::ErrPath;
    }

    with_engine(|engine| {
        match engine.schedule_daily(
            Path::new(&root),
            granularity_from(granularity),
            limit_mb,
            hour as u32,
            minute as u32,
        ) {
            Ok(()) => LwResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    })
}

/// Start the scheduler in fixed-interval mode.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn lw_schedule_start_interval(
    root_path: *const c_char,
    granularity: i32,
    limit_mb: f64,
    interval_minutes: i32,
) -> LwResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return LwResultCode::ErrPath;
        }
    };
    if interval_minutes <= 0 {
        set_last_error("interval must be positive".to_string());
        return LwResultCode::ErrPath;
    }

    with_engine(|engine| {
        match engine.schedule_interval(
            Path::new(&root),
            granularity_from(granularity),
            limit_mb,
            interval_minutes as u32,
        ) {
            Ok(()) => LwResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    })
}

/// Stop the scheduler. Safe to call when it is not running.
#[no_mangle]
pub extern "C" fn lw_schedule_stop() -> LwResultCode {
    with_engine(|engine| match engine.schedule_stop() {
        Ok(()) => LwResultCode::Ok,
        Err(e) => map_core_error(e),
    })
}

/// Fill `out` with cached metrics and scheduler state.
///
/// # Safety
/// `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn lw_get_status(out: *mut LwStatusInfo) -> LwResultCode {
    if out.is_null() {
        set_last_error("out is null".to_string());
        return LwResultCode::ErrPath;
    }

    with_engine(|engine| {
        let status = match engine.status() {
            Ok(s) => s,
            Err(e) => return map_core_error(e),
        };
        let settings = match engine.scheduler_settings() {
            Ok(s) => s,
            Err(e) => return map_core_error(e),
        };

        let info = &mut *out;
        info.is_scheduled = status.scheduled as i32;
        info.schedule_hour = settings.hour as i32;
        info.schedule_minute = settings.minute as i32;
        fill_c_buf(&mut info.last_run, &status.last_run);
        fill_c_buf(&mut info.next_run, &status.next_run);
        info.current_mb = status.current_mb;
        info.predicted_mb = status.predicted_mb;
        LwResultCode::Ok
    })
}

/// Upsert a configuration key.
///
/// # Safety
/// `key` and `value` must be valid null-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn lw_set_config(key: *const c_char, value: *const c_char) -> LwResultCode {
    let (key, value) = match (c_string_to_rust(key), c_string_to_rust(value)) {
        (Some(k), Some(v)) => (k, v),
        _ => {
            set_last_error("key or value is null".to_string());
            return LwResultCode::ErrPath;
        }
    };

    with_engine(|engine| match engine.set_config(&key, &value) {
        Ok(()) => LwResultCode::Ok,
        Err(e) => map_core_error(e),
    })
}

/// Read a configuration key into `value_buf` (empty string when absent).
///
/// # Safety
/// `key` must be a valid null-terminated C string; `value_buf` must point to
/// at least `buf_size` bytes.
#[no_mangle]
pub unsafe extern "C" fn lw_get_config(
    key: *const c_char,
    value_buf: *mut c_char,
    buf_size: i32,
) -> LwResultCode {
    let key = match c_string_to_rust(key) {
        Some(k) => k,
        None => {
            set_last_error("key is null".to_string());
            return LwResultCode::ErrPath;
        }
    };
    if value_buf.is_null() || buf_size <= 0 {
        set_last_error("value buffer is null or empty".to_string());
        return LwResultCode::ErrPath;
    }

    with_engine(|engine| match engine.get_config(&key, "") {
        Ok(value) => {
            let buf = std::slice::from_raw_parts_mut(value_buf, buf_size as usize);
            fill_c_buf(buf, &value);
            LwResultCode::Ok
        }
        Err(e) => map_core_error(e),
    })
}

/// Generate a 14-day synthetic recording tree totalling roughly `size_gb`.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn lw_generate_test_data(
    root_path: *const c_char,
    size_gb: f64,
    callback: Option<LwProgressCallback>,
) -> LwResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return LwResultCode::ErrPath;
        }
    };

    with_engine(|engine| {
        let result = match callback {
            Some(cb) => {
                let bridge = FfiProgressBridge::new(cb);
                engine.generate_test_data(Path::new(&root), size_gb, &bridge)
            }
            None => engine.generate_test_data(Path::new(&root), size_gb, &SilentReporter),
        };
        match result {
            Ok(()) => LwResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    })
}

/// Generate one day of synthetic data, `day_offset` days from today.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn lw_generate_one_day(
    root_path: *const c_char,
    day_size_mb: f64,
    day_offset: i32,
    callback: Option<LwProgressCallback>,
) -> LwResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return LwResultCode::ErrPath;
        }
    };

    with_engine(|engine| {
        let result = match callback {
            Some(cb) => {
                let bridge = FfiProgressBridge::new(cb);
                engine.generate_one_day(Path::new(&root), day_size_mb, i64::from(day_offset), &bridge)
            }
            None => engine.generate_one_day(
                Path::new(&root),
                day_size_mb,
                i64::from(day_offset),
                &SilentReporter,
            ),
        };
        match result {
            Ok(()) => LwResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    })
}
