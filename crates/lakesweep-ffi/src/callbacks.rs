use crate::types::LwProgressCallback;
use lakesweep_core::ProgressReporter;
use std::ffi::CString;

/// Bridges the core progress trait to a C function pointer. Only the data
/// generator reports through the C ABI; the other hooks stay no-ops.
pub struct FfiProgressBridge {
    callback: LwProgressCallback,
}

// Safety: the C callback is a static function pointer callable from any thread.
unsafe impl Send for FfiProgressBridge {}
unsafe impl Sync for FfiProgressBridge {}

impl FfiProgressBridge {
    pub fn new(callback: LwProgressCallback) -> Self {
        Self { callback }
    }
}

impl ProgressReporter for FfiProgressBridge {
    fn on_generate_progress(&self, percent: u32, message: &str) {
        let c_msg = CString::new(message).unwrap_or_else(|_| CString::new("").unwrap());
        (self.callback)(percent as i32, c_msg.as_ptr());
    }
}
