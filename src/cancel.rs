//! Process-wide table of cancellation channels.
//!
//! The host registers a token before dispatching a search or preview,
//! signals it from any thread when it loses interest, and the bridge
//! releases it once the operation has reported its outcome. Signals that
//! arrive after release are dropped: completion already won the race.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

static GLOBAL: LazyLock<Arc<CancelRegistry>> = LazyLock::new(|| Arc::new(CancelRegistry::new()));

/// Identity the host uses to refer to a registered cancellation channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CancelToken(u64);

impl CancelToken {
	#[must_use]
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	#[must_use]
	pub const fn as_raw(self) -> u64 {
		self.0
	}
}

impl fmt::Debug for CancelToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "CancelToken({})", self.0)
	}
}

struct Slot {
	tx: SyncSender<()>,
	rx: Option<Receiver<()>>,
}

/// Lock-protected map from [`CancelToken`] to a capacity-1 channel.
pub struct CancelRegistry {
	next: AtomicU64,
	slots: Mutex<HashMap<CancelToken, Slot>>,
}

impl CancelRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self {
			next: AtomicU64::new(1),
			slots: Mutex::new(HashMap::new()),
		}
	}

	/// The registry shared with the native shim.
	#[must_use]
	pub fn global() -> Arc<Self> {
		Arc::clone(&GLOBAL)
	}

	fn slots(&self) -> MutexGuard<'_, HashMap<CancelToken, Slot>> {
		self.slots.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Allocate a channel under a fresh token.
	pub fn register(&self) -> CancelToken {
		let token = CancelToken(self.next.fetch_add(1, Ordering::Relaxed));
		let (tx, rx) = mpsc::sync_channel(1);
		self.slots().insert(token, Slot { tx, rx: Some(rx) });
		trace!(?token, "registered cancellation channel");
		token
	}

	/// Request cancellation without blocking.
	///
	/// Returns `true` when the signal was queued. Unknown or released tokens,
	/// and tokens that were already signalled, are silently ignored.
	pub fn signal(&self, token: CancelToken) -> bool {
		let slots = self.slots();
		let Some(slot) = slots.get(&token) else {
			debug!(?token, "ignoring cancellation of released token");
			return false;
		};
		match slot.tx.try_send(()) {
			Ok(()) => true,
			Err(TrySendError::Full(())) | Err(TrySendError::Disconnected(())) => false,
		}
	}

	/// Remove the entry for `token`. Returns `false` if it was not present.
	pub fn release(&self, token: CancelToken) -> bool {
		let removed = self.slots().remove(&token).is_some();
		trace!(?token, removed, "released cancellation channel");
		removed
	}

	/// Claim the receiving end of a registered channel.
	///
	/// The receiver can be claimed once. Unknown tokens yield a
	/// [`Cancellation`] that never fires.
	pub fn subscribe(&self, token: CancelToken) -> Cancellation {
		match self.slots().get_mut(&token).and_then(|slot| slot.rx.take()) {
			Some(rx) => Cancellation::from_receiver(rx),
			None => {
				debug!(?token, "no cancellation channel available for token");
				Cancellation::never()
			}
		}
	}

	#[must_use]
	pub fn contains(&self, token: CancelToken) -> bool {
		self.slots().contains_key(&token)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.slots().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for CancelRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// The application's view of a cancellation channel.
///
/// Once a signal has been observed the cancellation stays latched.
pub struct Cancellation {
	rx: Option<Receiver<()>>,
	fired: AtomicBool,
}

impl Cancellation {
	fn from_receiver(rx: Receiver<()>) -> Self {
		Self {
			rx: Some(rx),
			fired: AtomicBool::new(false),
		}
	}

	/// A cancellation that is never signalled.
	#[must_use]
	pub fn never() -> Self {
		Self {
			rx: None,
			fired: AtomicBool::new(false),
		}
	}

	fn latch(&self) -> bool {
		self.fired.store(true, Ordering::Release);
		true
	}

	/// Poll without blocking.
	pub fn is_cancelled(&self) -> bool {
		if self.fired.load(Ordering::Acquire) {
			return true;
		}
		match &self.rx {
			Some(rx) => match rx.try_recv() {
				Ok(()) => self.latch(),
				Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
			},
			None => false,
		}
	}

	/// Block for up to `timeout` waiting for a signal.
	///
	/// Returns `true` if cancellation was requested. Handlers can use this
	/// as an interruptible sleep.
	pub fn wait_timeout(&self, timeout: Duration) -> bool {
		if self.fired.load(Ordering::Acquire) {
			return true;
		}
		match &self.rx {
			Some(rx) => match rx.recv_timeout(timeout) {
				Ok(()) => self.latch(),
				Err(RecvTimeoutError::Timeout) => false,
				Err(RecvTimeoutError::Disconnected) => {
					thread::sleep(timeout);
					false
				}
			},
			None => {
				thread::sleep(timeout);
				false
			}
		}
	}
}

impl fmt::Debug for Cancellation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cancellation")
			.field("fired", &self.fired.load(Ordering::Relaxed))
			.field("attached", &self.rx.is_some())
			.finish()
	}
}
