//! Reply sinks: the append-only channels through which an operation streams
//! output back to the host.
//!
//! Each sink delivers exactly one terminal signal. Once `finished` or
//! `error` has gone through, every further call is refused with
//! [`Error::ProtocolViolation`] and never reaches the host.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scopes_filters::{Filter, FilterState};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::category::{Category, CategoryRenderer};
use crate::codec;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::host::NativeRef;
use crate::preview::PreviewWidget;
use crate::result::CategorisedResult;

const FALLBACK_ERROR: &str = "scope reported an error without a message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Open,
	Finished,
	Failed,
}

impl Phase {
	fn describe(self) -> &'static str {
		match self {
			Self::Open => "open",
			Self::Finished => "finished",
			Self::Failed => "failed",
		}
	}
}

/// Terminal-state bookkeeping shared by both reply kinds.
///
/// The phase lock is held across each host call, so pushes are delivered
/// in call order and none can slip in after the terminal signal.
struct ReplyChannel {
	handle: Handle,
	phase: Mutex<Phase>,
}

impl ReplyChannel {
	fn new(handle: Handle) -> Self {
		Self {
			handle,
			phase: Mutex::new(Phase::Open),
		}
	}

	fn phase(&self) -> MutexGuard<'_, Phase> {
		self.phase.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn with_open<T>(&self, operation: &'static str, f: impl FnOnce(&Handle) -> Result<T>) -> Result<T> {
		let phase = self.phase();
		if *phase != Phase::Open {
			return Err(Error::ProtocolViolation {
				operation,
				state: phase.describe(),
			});
		}
		f(&self.handle)
	}

	fn terminate(&self, operation: &'static str, next: Phase, error: Option<&str>) -> Result<()> {
		let mut phase = self.phase();
		if *phase != Phase::Open {
			debug!(
				reply = ?self.handle.native(),
				operation,
				state = phase.describe(),
				"refusing second terminal signal"
			);
			return Err(Error::ProtocolViolation {
				operation,
				state: phase.describe(),
			});
		}
		*phase = next;
		let host = self.handle.host();
		match error {
			Some(message) => host.reply_error(self.handle.native(), message),
			None => host.reply_finished(self.handle.native()),
		}
		Ok(())
	}

	fn finished(&self) -> Result<()> {
		self.terminate("finished", Phase::Finished, None)
	}

	fn error(&self, message: &str) -> Result<()> {
		let message = if message.trim().is_empty() {
			FALLBACK_ERROR
		} else {
			message
		};
		self.terminate("error", Phase::Failed, Some(message))
	}

	fn is_open(&self) -> bool {
		*self.phase() == Phase::Open
	}
}

/// Replies that can deliver a terminal signal; implemented by both sinks so
/// the dispatch bridge can close either.
pub(crate) trait Terminate: Send + Sync + 'static {
	fn finish(&self) -> Result<()>;
	fn fail(&self, message: &str) -> Result<()>;
}

/// Output channel for a search.
pub struct SearchReply {
	channel: ReplyChannel,
}

impl SearchReply {
	pub(crate) fn from_handle(handle: Handle) -> Self {
		Self {
			channel: ReplyChannel::new(handle),
		}
	}

	#[must_use]
	pub fn native(&self) -> NativeRef {
		self.channel.handle.native()
	}

	/// Register a category rendered with the default grid template.
	///
	/// The sink does not deduplicate: registering an id twice is the
	/// caller's mistake.
	pub fn register_category(&self, id: &str, title: &str, icon: &str) -> Result<Category> {
		self.register_category_with_renderer(id, title, icon, &CategoryRenderer::default())
	}

	pub fn register_category_with_renderer(
		&self,
		id: &str,
		title: &str,
		icon: &str,
		renderer: &CategoryRenderer,
	) -> Result<Category> {
		self.channel.with_open("register_category", |handle| {
			let host = Arc::clone(handle.host_arc());
			let native = host
				.register_category(handle.native(), id, title, icon, renderer.template())
				.map_err(|message| Error::rejected("category registration", message))?;
			Ok(Category::new(Handle::wrap(host, native), id, title, icon, renderer))
		})
	}

	/// Append a result to the host's result stream.
	pub fn push(&self, result: &CategorisedResult) -> Result<()> {
		self.channel.with_open("push", |handle| {
			handle
				.host()
				.push_result(handle.native(), result.native())
				.map_err(|message| Error::rejected("result push", message))
		})
	}

	/// Send filter definitions together with their current state.
	pub fn push_filters(&self, filters: &[&dyn Filter], state: &FilterState) -> Result<()> {
		let definitions: Vec<Value> = filters.iter().map(|filter| filter.serialize_filter()).collect();
		let filters = codec::encode("filters", &definitions)?;
		let state = codec::encode("filter_state", state)?;
		self.channel.with_open("push_filters", |handle| {
			handle
				.host()
				.push_filters(handle.native(), &filters, &state)
				.map_err(|message| Error::rejected("filter push", message))
		})
	}

	/// Signal successful completion.
	pub fn finished(&self) -> Result<()> {
		self.channel.finished()
	}

	/// Signal failure. An empty message is replaced with a generic one.
	pub fn error(&self, err: impl fmt::Display) -> Result<()> {
		self.channel.error(&err.to_string())
	}

	/// `false` once a terminal signal has been delivered.
	#[must_use]
	pub fn is_open(&self) -> bool {
		self.channel.is_open()
	}
}

impl Terminate for SearchReply {
	fn finish(&self) -> Result<()> {
		self.finished()
	}

	fn fail(&self, message: &str) -> Result<()> {
		self.channel.error(message)
	}
}

impl fmt::Debug for SearchReply {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SearchReply")
			.field("native", &self.native())
			.field("open", &self.is_open())
			.finish()
	}
}

/// Output channel for a preview.
pub struct PreviewReply {
	channel: ReplyChannel,
}

impl PreviewReply {
	pub(crate) fn from_handle(handle: Handle) -> Self {
		Self {
			channel: ReplyChannel::new(handle),
		}
	}

	#[must_use]
	pub fn native(&self) -> NativeRef {
		self.channel.handle.native()
	}

	/// Append widgets to the preview, in order.
	pub fn push_widgets(&self, widgets: &[PreviewWidget]) -> Result<()> {
		let encoded = codec::encode("widgets", widgets)?;
		self.channel.with_open("push_widgets", |handle| {
			handle
				.host()
				.push_preview(handle.native(), &encoded)
				.map_err(|message| Error::rejected("preview push", message))
		})
	}

	/// Provide a value for a component mapping declared by a widget.
	pub fn push_attr<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
		let encoded = codec::encode(key, value)?;
		self.channel.with_open("push_attr", |handle| {
			handle
				.host()
				.push_preview_attribute(handle.native(), key, &encoded)
				.map_err(|message| Error::rejected("preview attribute push", message))
		})
	}

	pub fn finished(&self) -> Result<()> {
		self.channel.finished()
	}

	pub fn error(&self, err: impl fmt::Display) -> Result<()> {
		self.channel.error(&err.to_string())
	}

	#[must_use]
	pub fn is_open(&self) -> bool {
		self.channel.is_open()
	}
}

impl Terminate for PreviewReply {
	fn finish(&self) -> Result<()> {
		self.finished()
	}

	fn fail(&self, message: &str) -> Result<()> {
		self.channel.error(message)
	}
}

impl fmt::Debug for PreviewReply {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PreviewReply")
			.field("native", &self.native())
			.field("open", &self.is_open())
			.finish()
	}
}
