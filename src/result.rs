use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::category::Category;
use crate::codec;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::host::NativeRef;

/// A result backed by a host-owned native object.
///
/// Attributes are a map from name to dynamic value.
pub struct ScopeResult {
	handle: Handle,
}

impl ScopeResult {
	pub(crate) fn from_handle(handle: Handle) -> Self {
		Self { handle }
	}

	#[must_use]
	pub fn native(&self) -> NativeRef {
		self.handle.native()
	}

	/// Decode the named attribute into `T`.
	pub fn get<T: DeserializeOwned>(&self, attr: &str) -> Result<T> {
		codec::get(&self.handle, attr)
	}

	/// The named attribute as a dynamic value.
	pub fn get_value(&self, attr: &str) -> Result<Value> {
		self.get(attr)
	}

	/// Store the named attribute. Unencodable values leave the result untouched.
	pub fn set<T: Serialize + ?Sized>(&mut self, attr: &str, value: &T) -> Result<()> {
		codec::set(&self.handle, attr, value)
	}

	/// Route activation of this result to the scope instead of the client.
	pub fn set_intercept_activation(&mut self) {
		self.handle
			.host()
			.set_intercept_activation(self.handle.native());
	}

	pub fn set_uri(&mut self, uri: &str) -> Result<()> {
		self.set("uri", uri)
	}

	pub fn set_title(&mut self, title: &str) -> Result<()> {
		self.set("title", title)
	}

	pub fn set_art(&mut self, art: &str) -> Result<()> {
		self.set("art", art)
	}

	pub fn set_dnd_uri(&mut self, uri: &str) -> Result<()> {
		self.set("dnd_uri", uri)
	}

	// Missing attributes and non-string values both read as "".
	fn get_string(&self, attr: &str) -> String {
		match self.get_value(attr) {
			Ok(Value::String(text)) => text,
			_ => String::new(),
		}
	}

	/// The "uri" attribute, or an empty string.
	#[must_use]
	pub fn uri(&self) -> String {
		self.get_string("uri")
	}

	/// The "title" attribute, or an empty string.
	#[must_use]
	pub fn title(&self) -> String {
		self.get_string("title")
	}

	/// The "art" attribute, or an empty string.
	#[must_use]
	pub fn art(&self) -> String {
		self.get_string("art")
	}

	/// The "dnd_uri" attribute, or an empty string.
	#[must_use]
	pub fn dnd_uri(&self) -> String {
		self.get_string("dnd_uri")
	}
}

impl fmt::Debug for ScopeResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ScopeResult").field(&self.native()).finish()
	}
}

/// A result linked to a [`Category`], ready to be pushed to a search reply.
///
/// Dereferences to [`ScopeResult`] for attribute access.
pub struct CategorisedResult {
	result: ScopeResult,
	category: Category,
}

impl CategorisedResult {
	/// Create an empty result in `category`.
	pub fn new(category: &Category) -> Result<Self> {
		let host = Arc::clone(category.handle().host_arc());
		let native = host
			.new_categorised_result(category.native())
			.map_err(|message| Error::rejected("result creation", message))?;
		Ok(Self {
			result: ScopeResult::from_handle(Handle::wrap(host, native)),
			category: category.clone(),
		})
	}

	#[must_use]
	pub fn category(&self) -> &Category {
		&self.category
	}
}

impl Deref for CategorisedResult {
	type Target = ScopeResult;

	fn deref(&self) -> &ScopeResult {
		&self.result
	}
}

impl DerefMut for CategorisedResult {
	fn deref_mut(&mut self) -> &mut ScopeResult {
		&mut self.result
	}
}

impl fmt::Debug for CategorisedResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CategorisedResult")
			.field("native", &self.native())
			.field("category", &self.category.id())
			.finish()
	}
}
