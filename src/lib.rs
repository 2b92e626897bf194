//! Run Rust search scopes inside a native scopes runtime.
//!
//! The host runtime calls into a [`ScopeAdapter`] from its own worker
//! threads. The adapter wraps the host's native objects in views
//! ([`CannedQuery`], [`SearchMetadata`], [`ScopeResult`], ...), runs the
//! application's [`Scope`] handlers, and streams their output back through
//! [`SearchReply`] and [`PreviewReply`]. In-flight searches and previews
//! are cancelled cooperatively through the [`CancelRegistry`].

pub mod activation;
pub mod app_dirs;
pub mod bridge;
pub mod cancel;
pub mod category;
pub mod codec;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod host;
pub mod logging;
pub mod metadata;
pub mod preview;
pub mod query;
pub mod reply;
pub mod result;
pub mod runtime;
pub mod scope;
pub mod settings;

pub use activation::{ActivationResponse, ActivationStatus, EncodedActivation};
pub use bridge::{Dispatch, ScopeAdapter};
pub use cancel::{CancelRegistry, CancelToken, Cancellation};
pub use category::{Category, CategoryRenderer};
pub use error::{Error, Result};
pub use handle::Handle;
pub use host::{Host, NativeRef};
pub use metadata::{ActionMetadata, Location, QueryMetadata, SearchMetadata};
pub use preview::PreviewWidget;
pub use query::CannedQuery;
pub use reply::{PreviewReply, SearchReply};
pub use result::{CategorisedResult, ScopeResult};
pub use runtime::{RunArgs, run, run_with};
pub use scope::{Activator, PerformActioner, Scope, ScopeBase};
pub use scopes_filters as filters;
