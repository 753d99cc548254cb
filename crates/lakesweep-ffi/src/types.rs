use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Result codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LwResultCode {
    Ok = 0,
    ErrDb = -1,
    ErrPath = -2,
    ErrScan = -3,
    ErrForecast = -4,
    ErrCleanup = -5,
    ErrBusy = -6,
    ErrNoData = -7,
}

/// Evaluation actions, matching `Action::code()` in the core.
pub const LW_ACTION_SAFE: i32 = 0;
pub const LW_ACTION_MONITOR: i32 = 1;
pub const LW_ACTION_CAUTION: i32 = 2;
pub const LW_ACTION_CLEANUP: i32 = 3;

/// Granularity levels accepted by scan entry points.
pub const LW_GRAN_ASSET: i32 = 0;
pub const LW_GRAN_ASSET_INDEX: i32 = 1;
pub const LW_GRAN_ENTITY: i32 = 2;

#[repr(C)]
pub struct LwForecastResult {
    pub current_mb: f64,
    pub predicted_mb: f64,
    pub growth_rate_mb_per_day: f64,
    pub history_days_available: i32,
}

#[repr(C)]
pub struct LwEvalResult {
    pub action: i32,
    pub projected_pct: f64,
    pub amount_to_delete_mb: f64,
}

#[repr(C)]
pub struct LwCleanupResult {
    pub files_deleted: i32,
    pub mb_freed: f64,
    pub new_usage_mb: f64,
    pub new_usage_pct: f64,
}

#[repr(C)]
pub struct LwFullResult {
    pub current_mb: f64,
    pub predicted_mb: f64,
    pub growth_rate: f64,
    pub limit_mb: f64,
    pub usage_pct: f64,
    pub action: i32,
    pub files_deleted: i32,
    pub mb_freed: f64,
    pub history_days: i32,
}

#[repr(C)]
pub struct LwStatusInfo {
    pub is_scheduled: i32,
    pub schedule_hour: i32,
    pub schedule_minute: i32,
    pub last_run: [c_char; 32],
    pub next_run: [c_char; 32],
    pub current_mb: f64,
    pub predicted_mb: f64,
}

#[repr(C)]
pub struct LwWeightInfo {
    pub asset: [c_char; 64],
    pub index_val: i32,
    pub category: c_char,
    pub avg_mb: f64,
    pub total_mb: f64,
    pub day_count: i32,
}

/// Progress callback for synthetic data generation: `(percent 0..=100, message)`.
pub type LwProgressCallback = extern "C" fn(percent: i32, message: *const c_char);

/// Helper to convert a Rust string to a C string on the heap.
pub fn rust_string_to_c(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|cs| cs.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Helper to convert a C string to a Rust string.
///
/// # Safety
/// The caller must ensure `ptr` is a valid null-terminated C string.
pub unsafe fn c_string_to_rust(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Copy a string into a fixed-size C buffer, truncating and always
/// nul-terminating.
pub fn fill_c_buf(buf: &mut [c_char], s: &str) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(buf.len().saturating_sub(1));
    for (i, &b) in bytes[..n].iter().enumerate() {
        buf[i] = b as c_char;
    }
    buf[n] = 0;
}
