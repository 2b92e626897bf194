use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::activation::ActivationResponse;
use crate::cancel::Cancellation;
use crate::error::{Error, Result};
use crate::metadata::{ActionMetadata, SearchMetadata};
use crate::query::CannedQuery;
use crate::reply::{PreviewReply, SearchReply};
use crate::result::ScopeResult;

/// Application search logic driven by the host runtime.
///
/// `search` and `preview` run on their own threads. Returning `Ok` finishes
/// the reply and returning `Err` fails it with the error's message, unless
/// the handler already delivered a terminal signal itself. Handlers should
/// poll `cancelled` and return early once it fires.
pub trait Scope: Send + Sync + 'static {
	/// Receive installation details and settings. `None` clears them.
	fn set_scope_base(&self, _base: Option<Arc<ScopeBase>>) {}

	fn search(
		&self,
		query: &CannedQuery,
		metadata: &SearchMetadata,
		reply: &SearchReply,
		cancelled: &Cancellation,
	) -> anyhow::Result<()>;

	fn preview(
		&self,
		result: &ScopeResult,
		metadata: &ActionMetadata,
		reply: &PreviewReply,
		cancelled: &Cancellation,
	) -> anyhow::Result<()>;

	/// Opt into handling result activation.
	fn as_activator(&self) -> Option<&dyn Activator> {
		None
	}

	/// Opt into handling preview actions.
	fn as_action_performer(&self) -> Option<&dyn PerformActioner> {
		None
	}
}

/// Scopes that handle activation of results marked with
/// [`ScopeResult::set_intercept_activation`].
pub trait Activator: Send + Sync {
	fn activate(
		&self,
		result: &ScopeResult,
		metadata: &ActionMetadata,
	) -> anyhow::Result<ActivationResponse>;
}

/// Scopes that handle actions triggered from preview widgets.
pub trait PerformActioner: Send + Sync {
	fn perform_action(
		&self,
		result: &ScopeResult,
		metadata: &ActionMetadata,
		widget_id: &str,
		action_id: &str,
	) -> anyhow::Result<ActivationResponse>;
}

/// Where the scope is installed, where it may write, and its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeBase {
	scope_id: String,
	scope_directory: PathBuf,
	cache_directory: PathBuf,
	tmp_directory: PathBuf,
	settings: Vec<u8>,
}

impl ScopeBase {
	#[must_use]
	pub fn new(
		scope_id: impl Into<String>,
		scope_directory: impl Into<PathBuf>,
		cache_directory: impl Into<PathBuf>,
		tmp_directory: impl Into<PathBuf>,
		settings: Vec<u8>,
	) -> Self {
		Self {
			scope_id: scope_id.into(),
			scope_directory: scope_directory.into(),
			cache_directory: cache_directory.into(),
			tmp_directory: tmp_directory.into(),
			settings,
		}
	}

	#[must_use]
	pub fn scope_id(&self) -> &str {
		&self.scope_id
	}

	/// Directory the scope was installed into.
	#[must_use]
	pub fn scope_directory(&self) -> &Path {
		&self.scope_directory
	}

	/// Directory for persistent cache files.
	#[must_use]
	pub fn cache_directory(&self) -> &Path {
		&self.cache_directory
	}

	/// Directory for temporary files.
	#[must_use]
	pub fn tmp_directory(&self) -> &Path {
		&self.tmp_directory
	}

	/// Decode the resolved settings into `T`.
	pub fn settings<T: DeserializeOwned>(&self) -> Result<T> {
		serde_json::from_slice(&self.settings).map_err(|source| Error::Decode {
			name: "settings".into(),
			source,
		})
	}
}
