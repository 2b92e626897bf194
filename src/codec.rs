//! Attribute codec: dynamic values cross the host boundary as JSON text.
//!
//! Every value is encoded before the host is contacted, so a value that
//! cannot be represented never mutates native state.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::handle::Handle;

mod finite;

/// Encode `value` into the attribute text form.
///
/// Non-finite floats are rejected rather than written as `null`.
pub fn encode<T>(name: &str, value: &T) -> Result<String>
where
	T: Serialize + ?Sized,
{
	finite::check(value)
		.and_then(|()| serde_json::to_string(value))
		.map_err(|source| Error::Encode {
			name: name.to_string(),
			source,
		})
}

/// Convert `value` into a dynamic value under the same rules as [`encode`].
pub fn to_value<T>(name: &str, value: &T) -> Result<Value>
where
	T: Serialize + ?Sized,
{
	finite::check(value)
		.and_then(|()| serde_json::to_value(value))
		.map_err(|source| Error::Encode {
			name: name.to_string(),
			source,
		})
}

/// Decode attribute text into `T`.
pub fn decode<T>(name: &str, text: &str) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_json::from_str(text).map_err(|source| Error::Decode {
		name: name.to_string(),
		source,
	})
}

/// Reinterpret an already-decoded dynamic value as `T`.
pub fn from_value<T>(name: &str, value: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_json::from_value(value).map_err(|source| Error::Decode {
		name: name.to_string(),
		source,
	})
}

pub(crate) fn get_raw(handle: &Handle, name: &str) -> Result<Option<String>> {
	handle
		.host()
		.get_attribute(handle.native(), name)
		.map_err(|message| Error::rejected("attribute read", message))
}

/// Fetch and decode the named attribute of a native object.
pub(crate) fn get<T>(handle: &Handle, name: &str) -> Result<T>
where
	T: DeserializeOwned,
{
	match get_raw(handle, name)? {
		Some(text) => decode(name, &text),
		None => Err(Error::AttributeNotFound {
			name: name.to_string(),
		}),
	}
}

/// Like [`get`], but an unset attribute decodes to `None`.
pub(crate) fn get_optional<T>(handle: &Handle, name: &str) -> Result<Option<T>>
where
	T: DeserializeOwned,
{
	match get_raw(handle, name)? {
		Some(text) => decode::<Option<T>>(name, &text),
		None => Ok(None),
	}
}

/// Encode and store the named attribute of a native object.
pub(crate) fn set<T>(handle: &Handle, name: &str, value: &T) -> Result<()>
where
	T: Serialize + ?Sized,
{
	let encoded = encode(name, value)?;
	handle
		.host()
		.set_attribute(handle.native(), name, &encoded)
		.map_err(|message| Error::rejected("attribute write", message))
}
