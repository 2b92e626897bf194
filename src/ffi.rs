//! C ABI exports used by the native shim that embeds the adapter.
//!
//! Tokens are plain integers on the C side; `0` is never handed out.

use crate::cancel::{CancelRegistry, CancelToken};

/// Register a cancellation channel and return its token.
#[unsafe(no_mangle)]
pub extern "C" fn scopes_cancel_register() -> u64 {
	CancelRegistry::global().register().as_raw()
}

/// Request cancellation. Stale tokens are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn scopes_cancel_signal(token: u64) {
	CancelRegistry::global().signal(CancelToken::from_raw(token));
}

/// Release a cancellation channel. Releasing twice is harmless.
#[unsafe(no_mangle)]
pub extern "C" fn scopes_cancel_release(token: u64) {
	CancelRegistry::global().release(CancelToken::from_raw(token));
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exported_functions_drive_the_global_registry() {
		let raw = scopes_cancel_register();
		assert_ne!(raw, 0);
		let token = CancelToken::from_raw(raw);
		let cancelled = CancelRegistry::global().subscribe(token);

		scopes_cancel_signal(raw);
		assert!(cancelled.is_cancelled());

		scopes_cancel_release(raw);
		assert!(!CancelRegistry::global().contains(token));
		scopes_cancel_signal(raw);
		scopes_cancel_release(raw);
	}
}
