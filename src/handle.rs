use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::host::{Host, NativeRef};

/// Sole owner of the adapter's reference to one native object.
///
/// The handle asks the host to destroy the object when it is dropped. It is
/// deliberately not `Clone`; views that need to share a native object wrap
/// the handle in an [`Arc`] so the destruction obligation stays single.
pub struct Handle {
	host: Arc<dyn Host>,
	native: NativeRef,
}

impl Handle {
	/// Take ownership of `native`.
	#[must_use]
	pub fn wrap(host: Arc<dyn Host>, native: NativeRef) -> Self {
		Self { host, native }
	}

	#[must_use]
	pub fn native(&self) -> NativeRef {
		self.native
	}

	#[must_use]
	pub fn host(&self) -> &dyn Host {
		self.host.as_ref()
	}

	pub(crate) fn host_arc(&self) -> &Arc<dyn Host> {
		&self.host
	}
}

impl Drop for Handle {
	fn drop(&mut self) {
		trace!(native = ?self.native, "releasing native object");
		self.host.destroy(self.native);
	}
}

impl fmt::Debug for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handle").field(&self.native).finish()
	}
}
