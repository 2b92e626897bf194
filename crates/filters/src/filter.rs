use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// How the host should lay a filter out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDisplayHints {
	#[default]
	Default,
	Primary,
}

impl FilterDisplayHints {
	fn code(self) -> u32 {
		match self {
			Self::Default => 0,
			Self::Primary => 1,
		}
	}
}

/// A selectable option exposed by a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
	pub id: String,
	pub label: String,
}

/// Fields shared by every filter kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBase {
	pub id: String,
	pub display_hints: FilterDisplayHints,
	pub filter_type: &'static str,
	pub title: String,
}

impl FilterBase {
	#[must_use]
	pub fn new(id: impl Into<String>, filter_type: &'static str) -> Self {
		Self {
			id: id.into(),
			display_hints: FilterDisplayHints::Default,
			filter_type,
			title: String::new(),
		}
	}

	/// Serialise the shared fields into the object every filter starts from.
	#[must_use]
	pub fn serialize_base(&self) -> Map<String, Value> {
		let value = json!({
			"id": self.id,
			"display_hints": self.display_hints.code(),
			"filter_type": self.filter_type,
			"title": self.title,
		});
		match value {
			Value::Object(map) => map,
			_ => Map::new(),
		}
	}
}

/// A filter that can be sent to the host alongside its state.
pub trait Filter: Send + Sync {
	/// Identifier keying this filter inside a [`FilterState`](crate::FilterState).
	fn id(&self) -> &str;

	/// Encode the filter definition for the host.
	fn serialize_filter(&self) -> Value;
}
