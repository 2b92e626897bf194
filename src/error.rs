use thiserror::Error;

/// Errors surfaced by the adapter.
///
/// Every variant renders to a complete, human-readable message because that
/// text is what crosses the boundary to the host.
#[derive(Debug, Error)]
pub enum Error {
	/// The native object has no attribute with this name.
	#[error("attribute '{name}' not found")]
	AttributeNotFound { name: String },

	/// The value cannot be represented in the attribute encoding.
	#[error("cannot encode '{name}': {source}")]
	Encode {
		name: String,
		#[source]
		source: serde_json::Error,
	},

	/// The stored encoding is malformed or does not match the requested shape.
	#[error("cannot decode '{name}': {source}")]
	Decode {
		name: String,
		#[source]
		source: serde_json::Error,
	},

	/// The host refused the operation.
	#[error("host rejected {operation}: {message}")]
	NativeRejected {
		operation: &'static str,
		message: String,
	},

	/// Application logic reported a failure.
	#[error("{0}")]
	Handler(String),

	/// A reply was used after its terminal signal.
	#[error("{operation} rejected: reply already {state}")]
	ProtocolViolation {
		operation: &'static str,
		state: &'static str,
	},

	/// A handler task could not be launched.
	#[error("failed to spawn handler task: {0}")]
	Spawn(#[source] std::io::Error),

	/// Run arguments or scope settings are invalid.
	#[error("{0}")]
	Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
	pub(crate) fn rejected(operation: &'static str, message: impl Into<String>) -> Self {
		Self::NativeRejected {
			operation,
			message: message.into(),
		}
	}
}
