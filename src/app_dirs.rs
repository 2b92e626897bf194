//! Resolve per-scope cache and temporary directories.
//!
//! Environment overrides win; otherwise the platform locations from the
//! `directories` crate are used, namespaced by scope id. Hosts without a
//! home directory fall back to the system temporary directory.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "scopes";
const APPLICATION: &str = "scopes-bridge";

const CACHE_DIR_ENV: &str = "SCOPES_CACHE_DIR";
const TMP_DIR_ENV: &str = "SCOPES_TMP_DIR";

fn project_dirs() -> Option<ProjectDirs> {
	ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Resolve an override directory from an environment variable.
///
/// An empty string is treated the same as an unset value so that callers can
/// use shell defaults without worrying about trailing whitespace.
fn dir_from_env(name: &str) -> Option<PathBuf> {
	let value = env::var_os(name)?;
	if value.is_empty() {
		None
	} else {
		Some(PathBuf::from(value))
	}
}

fn fallback_dir(kind: &str) -> PathBuf {
	env::temp_dir().join(APPLICATION).join(kind)
}

/// Directory for the scope's persistent cache files.
#[must_use]
pub fn get_cache_dir(scope_id: &str) -> PathBuf {
	let base = dir_from_env(CACHE_DIR_ENV)
		.or_else(|| project_dirs().map(|dirs| dirs.cache_dir().to_path_buf()))
		.unwrap_or_else(|| fallback_dir("cache"));
	base.join(scope_id)
}

/// Directory for the scope's temporary files.
#[must_use]
pub fn get_tmp_dir(scope_id: &str) -> PathBuf {
	let base = dir_from_env(TMP_DIR_ENV)
		.or_else(|| project_dirs().and_then(|dirs| dirs.runtime_dir().map(PathBuf::from)))
		.unwrap_or_else(|| fallback_dir("tmp"));
	base.join(scope_id)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn directories_are_namespaced_by_scope() {
		assert!(get_cache_dir("books").ends_with("books"));
		assert!(get_tmp_dir("books").ends_with("books"));
		assert_ne!(get_cache_dir("books"), get_tmp_dir("books"));
	}
}
