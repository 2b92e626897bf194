use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec;
use crate::error::Result;

/// One widget of a preview, e.g. a header, an image or an action row.
///
/// Attributes carry literal values; components map a widget field to a
/// result attribute the host fills in itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewWidget {
	id: String,
	#[serde(rename = "type")]
	widget_type: String,
	#[serde(flatten)]
	attributes: Map<String, Value>,
	#[serde(skip_serializing_if = "Map::is_empty")]
	components: Map<String, Value>,
}

impl PreviewWidget {
	#[must_use]
	pub fn new(id: impl Into<String>, widget_type: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			widget_type: widget_type.into(),
			attributes: Map::new(),
			components: Map::new(),
		}
	}

	#[must_use]
	pub fn id(&self) -> &str {
		&self.id
	}

	#[must_use]
	pub fn widget_type(&self) -> &str {
		&self.widget_type
	}

	/// Set a literal attribute value.
	pub fn add_attribute_value<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
		let value = codec::to_value(key, value)?;
		self.attributes.insert(key.to_string(), value);
		Ok(())
	}

	/// Bind a widget attribute to a field of the previewed result.
	pub fn add_attribute_mapping(&mut self, key: &str, field_name: &str) {
		self.components
			.insert(key.to_string(), Value::String(field_name.to_string()));
	}

	#[must_use]
	pub fn attribute(&self, key: &str) -> Option<&Value> {
		self.attributes.get(key)
	}
}
