//! Process entry point for scope binaries.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::app_dirs;
use crate::bridge::ScopeAdapter;
use crate::error::Error;
use crate::host::Host;
use crate::scope::{Scope, ScopeBase};
use crate::settings;

const SCOPE_SUFFIX: &str = ".ini";

/// Command-line arguments every scope process accepts.
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
	#[arg(
		long,
		value_name = "FILE",
		env = "SCOPES_RUNTIME",
		help = "Runtime configuration file for the scopes host (default: host default)"
	)]
	pub runtime: Option<PathBuf>,
	#[arg(
		long,
		value_name = "FILE",
		env = "SCOPES_SCOPE",
		help = "Scope configuration file; its name without '.ini' is the scope id"
	)]
	pub scope: Option<PathBuf>,
}

impl RunArgs {
	/// The scope configuration file, which is mandatory.
	pub fn scope_file(&self) -> Result<&Path, Error> {
		self.scope
			.as_deref()
			.ok_or_else(|| Error::Config("Scope configuration file not set on command line".into()))
	}

	/// Derive the scope id from the configuration file name.
	pub fn scope_id(&self) -> Result<String, Error> {
		let file_name = self
			.scope_file()?
			.file_name()
			.and_then(OsStr::to_str)
			.unwrap_or_default();
		file_name
			.strip_suffix(SCOPE_SUFFIX)
			.filter(|id| !id.is_empty())
			.map(str::to_string)
			.ok_or_else(|| Error::Config("Scope configuration file does not end in '.ini'".into()))
	}
}

/// Parse the process arguments and serve `scope` through `host`.
///
/// Intended to be called from a scope binary's `main`; returns when the host
/// stops serving the scope.
pub fn run<S: Scope>(scope: S, host: Arc<dyn Host>) -> Result<()> {
	run_with(scope, host, &RunArgs::parse())
}

/// Like [`run`], with explicit arguments.
pub fn run_with<S: Scope>(scope: S, host: Arc<dyn Host>, args: &RunArgs) -> Result<()> {
	let scope_id = args.scope_id()?;
	let scope_file = args.scope_file()?;
	let settings = settings::load(scope_file)?;
	info!(
		scope_id,
		display_name = settings.scope.display_name.as_deref().unwrap_or(""),
		"starting scope"
	);

	let scope_directory = scope_file
		.parent()
		.map(Path::to_path_buf)
		.unwrap_or_else(|| PathBuf::from("."));
	let base = ScopeBase::new(
		scope_id.as_str(),
		scope_directory,
		app_dirs::get_cache_dir(&scope_id),
		app_dirs::get_tmp_dir(&scope_id),
		settings.values_blob()?,
	);

	let adapter = Arc::new(ScopeAdapter::new(scope, Arc::clone(&host)));
	adapter.set_scope_base(Some(base));

	host.run_scope(&scope_id, args.runtime.as_deref(), adapter)
		.map_err(|message| Error::NativeRejected {
			operation: "run_scope",
			message,
		})
		.with_context(|| format!("scope '{scope_id}' stopped with an error"))
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::sync::Mutex;

	use serde::Deserialize;

	use super::*;
	use crate::cancel::Cancellation;
	use crate::host::memory::MemoryHost;
	use crate::metadata::{ActionMetadata, SearchMetadata};
	use crate::query::CannedQuery;
	use crate::reply::{PreviewReply, SearchReply};
	use crate::result::ScopeResult;

	#[derive(Default)]
	struct RecordingScope {
		base: Arc<Mutex<Option<Arc<ScopeBase>>>>,
	}

	impl Scope for RecordingScope {
		fn set_scope_base(&self, base: Option<Arc<ScopeBase>>) {
			*self.base.lock().unwrap() = base;
		}

		fn search(
			&self,
			_query: &CannedQuery,
			_metadata: &SearchMetadata,
			_reply: &SearchReply,
			_cancelled: &Cancellation,
		) -> anyhow::Result<()> {
			Ok(())
		}

		fn preview(
			&self,
			_result: &ScopeResult,
			_metadata: &ActionMetadata,
			_reply: &PreviewReply,
			_cancelled: &Cancellation,
		) -> anyhow::Result<()> {
			Ok(())
		}
	}

	#[derive(Debug, Deserialize, PartialEq)]
	struct Settings {
		limit: String,
	}

	fn args(scope: Option<&str>) -> RunArgs {
		RunArgs {
			runtime: None,
			scope: scope.map(PathBuf::from),
		}
	}

	#[test]
	fn scope_id_is_the_file_stem() {
		assert_eq!(args(Some("/opt/scopes/books.ini")).scope_id().unwrap(), "books");
	}

	#[test]
	fn scope_file_is_required() {
		let err = args(None).scope_id().unwrap_err();
		assert_eq!(err.to_string(), "Scope configuration file not set on command line");
	}

	#[test]
	fn scope_file_must_be_ini() {
		for path in ["/opt/scopes/books.conf", "/opt/scopes/.ini"] {
			let err = args(Some(path)).scope_id().unwrap_err();
			assert_eq!(err.to_string(), "Scope configuration file does not end in '.ini'");
		}
	}

	#[test]
	fn arguments_parse_from_flags() {
		let parsed = RunArgs::try_parse_from([
			"scope",
			"--runtime",
			"/etc/scopes/Runtime.ini",
			"--scope",
			"/opt/scopes/books.ini",
		])
		.unwrap();
		assert_eq!(parsed.runtime, Some(PathBuf::from("/etc/scopes/Runtime.ini")));
		assert_eq!(parsed.scope_id().unwrap(), "books");
	}

	#[test]
	fn run_hands_the_adapter_to_the_host() {
		let dir = tempfile::tempdir().unwrap();
		let scope_file = dir.path().join("books.ini");
		fs::write(&scope_file, "[ScopeConfig]\nDisplayName = Books\n[Settings]\nlimit = 5\n").unwrap();

		let host = MemoryHost::new();
		let scope = RecordingScope::default();
		let base = Arc::clone(&scope.base);
		run_with(scope, host.clone(), &args(scope_file.to_str())).unwrap();

		assert_eq!(host.served_scopes(), vec!["books".to_string()]);
		let base = base.lock().unwrap().clone().expect("scope base delivered");
		assert_eq!(base.scope_id(), "books");
		assert_eq!(base.scope_directory(), dir.path());
		assert_eq!(
			base.settings::<Settings>().unwrap(),
			Settings { limit: "5".into() }
		);
	}

	#[test]
	fn host_failures_are_reported() {
		let dir = tempfile::tempdir().unwrap();
		let scope_file = dir.path().join("books.ini");
		fs::write(&scope_file, "[ScopeConfig]\n").unwrap();

		let host = MemoryHost::new();
		run_with(RecordingScope::default(), host.clone(), &args(scope_file.to_str())).unwrap();
		let err = run_with(RecordingScope::default(), host, &args(scope_file.to_str())).unwrap_err();
		assert!(format!("{err:#}").contains("already being served"));
	}
}
