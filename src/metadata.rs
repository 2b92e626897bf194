//! Metadata views describing the client that issued a request.

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::host::NativeRef;

const HINTS: &str = "hints";

/// Geographic location of the client device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
	pub latitude: f64,
	pub longitude: f64,
	pub altitude: f64,
	pub area_code: String,
	pub city: String,
	pub country_code: String,
	pub country_name: String,
	pub horizontal_accuracy: f64,
	pub vertical_accuracy: f64,
	pub region_code: String,
	pub region_name: String,
	pub zip_postal_code: String,
}

/// Accessors shared by [`SearchMetadata`] and [`ActionMetadata`].
pub struct QueryMetadata {
	handle: Handle,
}

impl QueryMetadata {
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

	/// The client's locale, or "" if the host did not provide one.
	#[must_use]
	pub fn locale(&self) -> String {
		self.string("locale")
	}

	/// The client's form factor ("phone", "desktop", ...), or "".
	#[must_use]
	pub fn form_factor(&self) -> String {
		self.string("form_factor")
	}

	/// All hints as a map. Absent hints read as an empty map.
	pub fn hints(&self) -> Result<Map<String, Value>> {
		Ok(codec::get_optional(&self.handle, HINTS)?.unwrap_or_default())
	}

	/// Decode a single hint.
	pub fn hint<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
		let mut hints = self.hints()?;
		let value = hints.remove(key).ok_or_else(|| Error::AttributeNotFound {
			name: format!("{HINTS}.{key}"),
		})?;
		codec::from_value(key, value)
	}

	/// Add or replace a hint. Unencodable values are rejected before the
	/// host's hint map is touched.
	pub fn set_hint<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
		let value = codec::to_value(key, value)?;
		let mut hints = self.hints()?;
		hints.insert(key.to_string(), value);
		codec::set(&self.handle, HINTS, &hints)
	}
}

impl fmt::Debug for QueryMetadata {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("QueryMetadata").field(&self.native()).finish()
	}
}

/// Metadata accompanying a search request.
#[derive(Debug)]
pub struct SearchMetadata {
	base: QueryMetadata,
}

impl SearchMetadata {
	pub(crate) fn from_handle(handle: Handle) -> Self {
		Self {
			base: QueryMetadata { handle },
		}
	}

	/// Number of results the client asked for; 0 means no limit.
	#[must_use]
	pub fn cardinality(&self) -> u32 {
		codec::get_optional(&self.base.handle, "cardinality")
			.ok()
			.flatten()
			.unwrap_or(0)
	}

	/// The client location, if the host provided a readable one.
	#[must_use]
	pub fn location(&self) -> Option<Location> {
		codec::get_optional(&self.base.handle, "location")
			.ok()
			.flatten()
	}

	pub fn set_location(&mut self, location: &Location) -> Result<()> {
		codec::set(&self.base.handle, "location", location)
	}
}

impl Deref for SearchMetadata {
	type Target = QueryMetadata;

	fn deref(&self) -> &QueryMetadata {
		&self.base
	}
}

impl DerefMut for SearchMetadata {
	fn deref_mut(&mut self) -> &mut QueryMetadata {
		&mut self.base
	}
}

/// Metadata accompanying a preview, activation or preview action.
#[derive(Debug)]
pub struct ActionMetadata {
	base: QueryMetadata,
}

impl ActionMetadata {
	pub(crate) fn from_handle(handle: Handle) -> Self {
		Self {
			base: QueryMetadata { handle },
		}
	}

	/// Decode scope-specific data attached by the client.
	///
	/// Unset data decodes as JSON `null`, so `Option<T>` and
	/// [`serde_json::Value`] targets always succeed.
	pub fn scope_data<T: DeserializeOwned>(&self) -> Result<T> {
		match codec::get_raw(&self.base.handle, "scope_data")? {
			Some(text) => codec::decode("scope_data", &text),
			None => codec::from_value("scope_data", Value::Null),
		}
	}

	pub fn set_scope_data<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<()> {
		codec::set(&self.base.handle, "scope_data", data)
	}
}

impl Deref for ActionMetadata {
	type Target = QueryMetadata;

	fn deref(&self) -> &QueryMetadata {
		&self.base
	}
}

impl DerefMut for ActionMetadata {
	fn deref_mut(&mut self) -> &mut QueryMetadata {
		&mut self.base
	}
}
