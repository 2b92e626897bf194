use serde::Serialize;
use serde_json::Value;

use crate::codec;
use crate::error::Result;

/// What the host should do after an activation or preview action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ActivationStatus {
	#[default]
	NotHandled = 0,
	ShowDash = 1,
	HideDash = 2,
	ShowPreview = 3,
	PerformQuery = 4,
	UpdateResult = 5,
	UpdatePreview = 6,
}

impl ActivationStatus {
	#[must_use]
	pub fn code(self) -> i32 {
		self as i32
	}
}

/// Outcome returned by [`Activator`](crate::Activator) and
/// [`PerformActioner`](crate::PerformActioner) implementations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationResponse {
	status: ActivationStatus,
	scope_data: Option<Value>,
	query_uri: Option<String>,
}

impl ActivationResponse {
	#[must_use]
	pub fn new(status: ActivationStatus) -> Self {
		Self {
			status,
			..Self::default()
		}
	}

	/// Ask the host to run another query, identified by its canned-query URI.
	#[must_use]
	pub fn perform_query(uri: impl Into<String>) -> Self {
		Self {
			status: ActivationStatus::PerformQuery,
			query_uri: Some(uri.into()),
			scope_data: None,
		}
	}

	#[must_use]
	pub fn status(&self) -> ActivationStatus {
		self.status
	}

	#[must_use]
	pub fn scope_data(&self) -> Option<&Value> {
		self.scope_data.as_ref()
	}

	#[must_use]
	pub fn query_uri(&self) -> Option<&str> {
		self.query_uri.as_deref()
	}

	/// Attach scope-specific data handed back with the response.
	pub fn set_scope_data<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<()> {
		let value = codec::to_value("scope_data", data)?;
		self.scope_data = Some(value);
		Ok(())
	}

	pub(crate) fn encode(&self) -> Result<EncodedActivation> {
		let scope_data = match &self.scope_data {
			Some(value) => Some(codec::encode("scope_data", value)?),
			None => None,
		};
		Ok(EncodedActivation {
			status: self.status,
			scope_data,
			query_uri: self.query_uri.clone(),
		})
	}
}

/// Activation response in the form the host consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedActivation {
	pub status: ActivationStatus,
	/// JSON text of the scope data, if any.
	pub scope_data: Option<String>,
	pub query_uri: Option<String>,
}

impl EncodedActivation {
	/// The neutral response for scopes that do not handle a request.
	#[must_use]
	pub fn not_handled() -> Self {
		Self::default()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::error::Error;

	#[test]
	fn encoding_serialises_scope_data() {
		let mut response = ActivationResponse::new(ActivationStatus::ShowPreview);
		response.set_scope_data(&json!({"page": 2})).unwrap();

		let encoded = response.encode().unwrap();
		assert_eq!(encoded.status, ActivationStatus::ShowPreview);
		assert_eq!(encoded.scope_data.as_deref(), Some(r#"{"page":2}"#));
		assert_eq!(encoded.query_uri, None);
	}

	#[test]
	fn perform_query_carries_the_uri() {
		let encoded = ActivationResponse::perform_query("scope://books?q=dune")
			.encode()
			.unwrap();
		assert_eq!(encoded.status.code(), 4);
		assert_eq!(encoded.query_uri.as_deref(), Some("scope://books?q=dune"));
	}

	#[test]
	fn default_is_not_handled() {
		assert_eq!(EncodedActivation::not_handled().status, ActivationStatus::NotHandled);
		assert_eq!(ActivationResponse::default().status(), ActivationStatus::NotHandled);
	}

	#[test]
	fn non_finite_scope_data_is_rejected() {
		let mut response = ActivationResponse::new(ActivationStatus::UpdateResult);
		response.set_scope_data(&json!({"page": 2})).unwrap();
		let err = response.set_scope_data(&[f32::INFINITY]).unwrap_err();
		assert!(matches!(err, Error::Encode { .. }));
		assert_eq!(response.scope_data(), Some(&json!({"page": 2})));
	}
}
