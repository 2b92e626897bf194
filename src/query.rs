use std::fmt;

use scopes_filters::FilterState;
use serde_json::Value;

use crate::codec;
use crate::error::Result;
use crate::handle::Handle;
use crate::host::NativeRef;

/// The query a search was started with.
///
/// Valid only for the duration of the call that received it.
pub struct CannedQuery {
	handle: Handle,
}

impl CannedQuery {
	pub(crate) fn from_handle(handle: Handle) -> Self {
		Self { handle }
	}

	#[must_use]
	pub fn native(&self) -> NativeRef {
		self.handle.native()
	}

	fn string(&self, attr: &str) -> String {
		codec::get_optional::<String>(&self.handle, attr)
			.ok()
			.flatten()
			.unwrap_or_default()
	}

	/// Identifier of the scope the query targets, or "" if unset.
	#[must_use]
	pub fn scope_id(&self) -> String {
		self.string("scope_id")
	}

	/// The text the user typed, or "" if unset.
	#[must_use]
	pub fn query_string(&self) -> String {
		self.string("query_string")
	}

	/// The selected department, or "" for the root department.
	#[must_use]
	pub fn department_id(&self) -> String {
		self.string("department_id")
	}

	/// Persisted filter selections. An unset state reads as empty.
	pub fn filter_state(&self) -> Result<FilterState> {
		Ok(codec::get_optional(&self.handle, "filter_state")?.unwrap_or_default())
	}

	pub fn set_query_string(&mut self, query: &str) -> Result<()> {
		codec::set(&self.handle, "query_string", query)
	}

	pub fn set_department_id(&mut self, department: &str) -> Result<()> {
		codec::set(&self.handle, "department_id", department)
	}

	pub fn set_filter_state(&mut self, state: &FilterState) -> Result<()> {
		codec::set(&self.handle, "filter_state", state)
	}

	/// Any attribute of the query as a dynamic value.
	pub fn get_value(&self, attr: &str) -> Result<Value> {
		codec::get(&self.handle, attr)
	}
}

impl fmt::Debug for CannedQuery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("CannedQuery").field(&self.native()).finish()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::host::memory::MemoryHost;

	#[test]
	fn accessors_read_host_attributes() {
		let host = MemoryHost::new();
		let native = host.canned_query("books", "dune");
		let query = CannedQuery::from_handle(Handle::wrap(host.clone(), native));

		assert_eq!(query.scope_id(), "books");
		assert_eq!(query.query_string(), "dune");
		assert_eq!(query.department_id(), "");
		assert!(query.filter_state().unwrap().is_empty());
	}

	#[test]
	fn filter_state_is_passed_through_opaquely() {
		let host = MemoryHost::new();
		let native = host.canned_query("books", "");
		let mut query = CannedQuery::from_handle(Handle::wrap(host.clone(), native));

		let mut state = FilterState::new();
		state.insert("rating", json!("3"));
		state.insert("genres", json!({"scifi": true}));
		query.set_filter_state(&state).unwrap();

		assert_eq!(query.filter_state().unwrap(), state);
	}
}
