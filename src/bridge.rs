//! Entry points the host calls to drive a scope.
//!
//! The adapter takes ownership of every [`NativeRef`] handed to an entry
//! point and releases it once the application is done with the view built
//! on top of it. Search and preview return as soon as the handler thread is
//! launched; activation and preview actions run on the calling thread.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::activation::{ActivationResponse, EncodedActivation};
use crate::cancel::{CancelRegistry, CancelToken, Cancellation};
use crate::error::Error;
use crate::handle::Handle;
use crate::host::{Host, NativeRef};
use crate::metadata::{ActionMetadata, SearchMetadata};
use crate::query::CannedQuery;
use crate::reply::{PreviewReply, SearchReply, Terminate};
use crate::result::ScopeResult;
use crate::scope::{Scope, ScopeBase};

const FALLBACK_HANDLER_ERROR: &str = "scope handler failed without a message";

/// Binds one [`Scope`] implementation to a host runtime.
pub struct ScopeAdapter {
	scope: Arc<dyn Scope>,
	host: Arc<dyn Host>,
	registry: Arc<CancelRegistry>,
}

impl ScopeAdapter {
	/// Create an adapter using the process-wide cancellation registry.
	pub fn new<S: Scope>(scope: S, host: Arc<dyn Host>) -> Self {
		Self {
			scope: Arc::new(scope),
			host,
			registry: CancelRegistry::global(),
		}
	}

	/// Use a dedicated cancellation registry instead of the global one.
	#[must_use]
	pub fn with_registry(mut self, registry: Arc<CancelRegistry>) -> Self {
		self.registry = registry;
		self
	}

	#[must_use]
	pub fn registry(&self) -> &Arc<CancelRegistry> {
		&self.registry
	}

	fn wrap(&self, native: NativeRef) -> Handle {
		Handle::wrap(Arc::clone(&self.host), native)
	}

	pub fn set_scope_base(&self, base: Option<ScopeBase>) {
		self.scope.set_scope_base(base.map(Arc::new));
	}

	/// Start a search. Returns once the handler thread is running.
	pub fn search(
		&self,
		query: NativeRef,
		metadata: NativeRef,
		reply: NativeRef,
		cancel: CancelToken,
	) -> Dispatch {
		let query = CannedQuery::from_handle(self.wrap(query));
		let metadata = SearchMetadata::from_handle(self.wrap(metadata));
		let reply = Arc::new(SearchReply::from_handle(self.wrap(reply)));
		let scope = Arc::clone(&self.scope);

		self.dispatch("search", reply, cancel, move |reply, cancelled| {
			scope.search(&query, &metadata, reply, cancelled)
		})
	}

	/// Start a preview. Returns once the handler thread is running.
	pub fn preview(
		&self,
		result: NativeRef,
		metadata: NativeRef,
		reply: NativeRef,
		cancel: CancelToken,
	) -> Dispatch {
		let result = ScopeResult::from_handle(self.wrap(result));
		let metadata = ActionMetadata::from_handle(self.wrap(metadata));
		let reply = Arc::new(PreviewReply::from_handle(self.wrap(reply)));
		let scope = Arc::clone(&self.scope);

		self.dispatch("preview", reply, cancel, move |reply, cancelled| {
			scope.preview(&result, &metadata, reply, cancelled)
		})
	}

	fn dispatch<R, F>(&self, kind: &'static str, reply: Arc<R>, cancel: CancelToken, run: F) -> Dispatch
	where
		R: Terminate,
		F: FnOnce(&R, &Cancellation) -> anyhow::Result<()> + Send + 'static,
	{
		let cancelled = self.registry.subscribe(cancel);
		let registry = Arc::clone(&self.registry);
		let task_reply = Arc::clone(&reply);

		let spawned = thread::Builder::new()
			.name(format!("scope-{kind}-{}", cancel.as_raw()))
			.spawn(move || {
				let outcome = guard(kind, || run(&*task_reply, &cancelled));
				deliver(kind, &*task_reply, outcome);
				drop(cancelled);
				registry.release(cancel);
			});

		match spawned {
			Ok(handle) => {
				debug!(kind, ?cancel, "dispatched handler");
				Dispatch {
					handle: Some(handle),
				}
			}
			Err(err) => {
				let err = Error::Spawn(err);
				error!(kind, %err, "unable to dispatch handler");
				deliver(kind, &*reply, Err(err));
				self.registry.release(cancel);
				Dispatch { handle: None }
			}
		}
	}

	/// Handle activation of an intercepted result.
	///
	/// Scopes that do not implement [`Activator`](crate::Activator) get the
	/// neutral "not handled" response.
	pub fn activate(&self, result: NativeRef, metadata: NativeRef) -> Result<EncodedActivation, String> {
		let result = ScopeResult::from_handle(self.wrap(result));
		let metadata = ActionMetadata::from_handle(self.wrap(metadata));
		let Some(activator) = self.scope.as_activator() else {
			debug!("scope does not handle activation");
			return Ok(EncodedActivation::not_handled());
		};
		respond("activate", guard("activate", || activator.activate(&result, &metadata)))
	}

	/// Handle an action triggered from a preview widget.
	pub fn perform_action(
		&self,
		result: NativeRef,
		metadata: NativeRef,
		widget_id: &str,
		action_id: &str,
	) -> Result<EncodedActivation, String> {
		let result = ScopeResult::from_handle(self.wrap(result));
		let metadata = ActionMetadata::from_handle(self.wrap(metadata));
		let Some(performer) = self.scope.as_action_performer() else {
			debug!(widget_id, action_id, "scope does not handle preview actions");
			return Ok(EncodedActivation::not_handled());
		};
		respond(
			"perform_action",
			guard("perform_action", || {
				performer.perform_action(&result, &metadata, widget_id, action_id)
			}),
		)
	}
}

impl fmt::Debug for ScopeAdapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScopeAdapter")
			.field("pending_cancellations", &self.registry.len())
			.finish_non_exhaustive()
	}
}

/// Run a handler, turning errors and panics into [`Error::Handler`].
fn guard<T>(kind: &'static str, run: impl FnOnce() -> anyhow::Result<T>) -> Result<T, Error> {
	match panic::catch_unwind(AssertUnwindSafe(run)) {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) => {
			let message = format!("{err:#}");
			warn!(kind, %message, "scope handler failed");
			if message.trim().is_empty() {
				Err(Error::Handler(FALLBACK_HANDLER_ERROR.to_string()))
			} else {
				Err(Error::Handler(message))
			}
		}
		Err(payload) => {
			let message = format!("scope handler panicked: {}", panic_message(payload.as_ref()));
			error!(kind, %message);
			Err(Error::Handler(message))
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(message) = payload.downcast_ref::<&str>() {
		message
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message
	} else {
		"unknown panic payload"
	}
}

fn deliver<R: Terminate + ?Sized>(kind: &'static str, reply: &R, outcome: Result<(), Error>) {
	let delivered = match outcome {
		Ok(()) => reply.finish(),
		Err(err) => reply.fail(&err.to_string()),
	};
	if let Err(err) = delivered {
		debug!(kind, %err, "handler already delivered a terminal signal");
	}
}

fn respond(kind: &'static str, outcome: Result<ActivationResponse, Error>) -> Result<EncodedActivation, String> {
	let response = outcome.map_err(|err| err.to_string())?;
	response.encode().map_err(|err| {
		warn!(kind, %err, "activation response could not be encoded");
		err.to_string()
	})
}

/// Handle to a launched search or preview task.
///
/// The host never needs it; embedders and tests use it to wait for the
/// task to deliver its terminal signal.
#[derive(Debug)]
#[must_use = "dropping a Dispatch detaches the handler thread"]
pub struct Dispatch {
	handle: Option<JoinHandle<()>>,
}

impl Dispatch {
	/// Wait for the handler task to exit. Returns `false` if it never ran.
	pub fn join(self) -> bool {
		match self.handle {
			Some(handle) => handle.join().is_ok(),
			None => false,
		}
	}
}
