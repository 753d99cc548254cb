use crate::types::{rust_string_to_c, LwResultCode};
use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = RefCell::new(None);
}

pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(msg);
    });
}

pub fn map_core_error(e: lakesweep_core::Error) -> LwResultCode {
    set_last_error(e.to_string());
    match e {
        lakesweep_core::Error::Database(_) => LwResultCode::ErrDb,
        lakesweep_core::Error::Io(_) => LwResultCode::ErrScan,
        lakesweep_core::Error::Config(_) => LwResultCode::ErrPath,
        lakesweep_core::Error::InvalidInput(_) => LwResultCode::ErrPath,
        lakesweep_core::Error::NoData => LwResultCode::ErrNoData,
        lakesweep_core::Error::SchedulerBusy => LwResultCode::ErrBusy,
    }
}

/// Get the last error message. Returns a C string that must be freed with
/// `lw_free_string`.
///
/// # Safety
/// Caller must free the returned string with `lw_free_string`.
#[no_mangle]
pub extern "C" fn lw_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        let msg = e.borrow();
        match msg.as_ref() {
            Some(s) => rust_string_to_c(s),
            None => rust_string_to_c(""),
        }
    })
}

/// Free a string allocated by the FFI layer.
///
/// # Safety
/// `ptr` must have been allocated by this library (e.g., from
/// `lw_last_error_message`).
#[no_mangle]
pub unsafe extern "C" fn lw_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(std::ffi::CString::from_raw(ptr));
    }
}
