use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use scopes_bridge::{
	ActionMetadata, ActivationResponse, ActivationStatus, Activator, CannedQuery,
	CategorisedResult, Cancellation, PreviewReply, PreviewWidget, Scope, ScopeBase, ScopeResult,
	SearchMetadata, SearchReply,
};

#[derive(Debug, Default, Deserialize)]
struct EchoSettings {
	#[serde(default)]
	limit: Option<String>,
}

/// Scope that answers each word of the query with one result.
pub(crate) struct EchoScope {
	delay: Duration,
	base: Mutex<Option<Arc<ScopeBase>>>,
}

impl EchoScope {
	pub(crate) fn new(delay: Duration) -> Self {
		Self {
			delay,
			base: Mutex::new(None),
		}
	}

	fn limit(&self) -> Option<usize> {
		let base = self.base.lock().unwrap_or_else(PoisonError::into_inner);
		let settings: EchoSettings = base.as_ref()?.settings().ok()?;
		settings.limit?.trim().parse().ok()
	}
}

impl Scope for EchoScope {
	fn set_scope_base(&self, base: Option<Arc<ScopeBase>>) {
		*self.base.lock().unwrap_or_else(PoisonError::into_inner) = base;
	}

	fn search(
		&self,
		query: &CannedQuery,
		_metadata: &SearchMetadata,
		reply: &SearchReply,
		cancelled: &Cancellation,
	) -> Result<()> {
		let text = query.query_string();
		let category = reply.register_category("echo", "Echo", "")?;
		let limit = self.limit().unwrap_or(usize::MAX);

		for word in text.split_whitespace().take(limit) {
			if cancelled.wait_timeout(self.delay) {
				debug!("echo search cancelled");
				return Ok(());
			}
			let mut result = CategorisedResult::new(&category)?;
			result.set_uri(&format!("echo:{word}"))?;
			result.set_title(word)?;
			result.set_intercept_activation();
			reply.push(&result)?;
		}
		Ok(())
	}

	fn preview(
		&self,
		result: &ScopeResult,
		_metadata: &ActionMetadata,
		reply: &PreviewReply,
		_cancelled: &Cancellation,
	) -> Result<()> {
		let mut header = PreviewWidget::new("header", "header");
		header.add_attribute_mapping("title", "title");
		reply.push_widgets(&[header])?;
		reply.push_attr("title", &result.title())?;
		Ok(())
	}

	fn as_activator(&self) -> Option<&dyn Activator> {
		Some(self)
	}
}

impl Activator for EchoScope {
	fn activate(&self, _result: &ScopeResult, _metadata: &ActionMetadata) -> Result<ActivationResponse> {
		Ok(ActivationResponse::new(ActivationStatus::ShowPreview))
	}
}
