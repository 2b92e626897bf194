use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted selection state for every filter of a query.
///
/// The map is keyed by filter identifier. Values are whatever the filter
/// stored there and are not validated outside of the filter itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState(Map<String, Value>);

impl FilterState {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get(&self, filter_id: &str) -> Option<&Value> {
		self.0.get(filter_id)
	}

	pub fn insert(&mut self, filter_id: impl Into<String>, value: Value) -> Option<Value> {
		self.0.insert(filter_id.into(), value)
	}

	pub fn remove(&mut self, filter_id: &str) -> Option<Value> {
		self.0.remove(filter_id)
	}

	#[must_use]
	pub fn contains(&self, filter_id: &str) -> bool {
		self.0.contains_key(filter_id)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Borrow the raw map.
	#[must_use]
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}
}

impl From<Map<String, Value>> for FilterState {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

impl From<FilterState> for Value {
	fn from(state: FilterState) -> Self {
		Value::Object(state.0)
	}
}
