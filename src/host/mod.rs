//! The calls the adapter is allowed to make back into the host runtime.
//!
//! Native objects never cross this boundary as pointers. The host hands out
//! [`NativeRef`] identities and resolves them on its side.

pub mod memory;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::bridge::ScopeAdapter;

/// Opaque identity of a host-owned native object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NativeRef(u64);

impl NativeRef {
	#[must_use]
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	#[must_use]
	pub const fn as_raw(self) -> u64 {
		self.0
	}
}

impl fmt::Debug for NativeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NativeRef({:#x})", self.0)
	}
}

/// Host runtime services.
///
/// Attribute values are exchanged as JSON text. Failures are reported as
/// plain messages; the adapter decides how to classify them.
pub trait Host: Send + Sync + 'static {
	/// Fetch an encoded attribute. `Ok(None)` means the attribute is not set.
	fn get_attribute(&self, object: NativeRef, name: &str) -> Result<Option<String>, String>;

	/// Store an encoded attribute.
	fn set_attribute(&self, object: NativeRef, name: &str, encoded: &str) -> Result<(), String>;

	/// Release the adapter's reference to a native object.
	fn destroy(&self, object: NativeRef);

	/// Register a category on a search reply and return a reference to it.
	fn register_category(
		&self,
		reply: NativeRef,
		id: &str,
		title: &str,
		icon: &str,
		template: &str,
	) -> Result<NativeRef, String>;

	/// Create an empty result linked to a category.
	fn new_categorised_result(&self, category: NativeRef) -> Result<NativeRef, String>;

	/// Ask the host to route activation of this result back to the scope.
	fn set_intercept_activation(&self, result: NativeRef);

	fn push_result(&self, reply: NativeRef, result: NativeRef) -> Result<(), String>;

	fn push_filters(&self, reply: NativeRef, filters: &str, state: &str) -> Result<(), String>;

	fn push_preview(&self, reply: NativeRef, widgets: &str) -> Result<(), String>;

	fn push_preview_attribute(&self, reply: NativeRef, key: &str, encoded: &str)
	-> Result<(), String>;

	fn reply_finished(&self, reply: NativeRef);

	fn reply_error(&self, reply: NativeRef, message: &str);

	/// Hand the adapter to the host runtime and serve requests until shutdown.
	fn run_scope(
		&self,
		scope_id: &str,
		runtime_config: Option<&Path>,
		adapter: Arc<ScopeAdapter>,
	) -> Result<(), String>;
}
