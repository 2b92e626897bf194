use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::codec;
use crate::error::Result;
use crate::handle::Handle;
use crate::host::NativeRef;

const DEFAULT_RENDERER: &str = r#"{"schema-version":1,"template":{"category-layout":"grid"},"components":{"title":"title","art":"art"}}"#;

/// JSON template telling the host how to lay out a category's results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRenderer {
	template: String,
}

impl CategoryRenderer {
	/// Build a renderer from a JSON template, validating that it parses.
	pub fn from_json(template: &str) -> Result<Self> {
		let value: Value = codec::decode("renderer", template)?;
		Self::from_value(&value)
	}

	pub fn from_value(template: &Value) -> Result<Self> {
		Ok(Self {
			template: codec::encode("renderer", template)?,
		})
	}

	#[must_use]
	pub fn template(&self) -> &str {
		&self.template
	}
}

impl Default for CategoryRenderer {
	fn default() -> Self {
		Self {
			template: DEFAULT_RENDERER.to_string(),
		}
	}
}

struct CategoryInner {
	handle: Handle,
	id: String,
	title: String,
	icon: String,
	renderer: CategoryRenderer,
}

/// A result category registered on a search reply.
///
/// Clones share one native reference; the host object is released when the
/// last clone (including those held by results) goes away.
#[derive(Clone)]
pub struct Category {
	inner: Arc<CategoryInner>,
}

impl Category {
	pub(crate) fn new(
		handle: Handle,
		id: &str,
		title: &str,
		icon: &str,
		renderer: &CategoryRenderer,
	) -> Self {
		Self {
			inner: Arc::new(CategoryInner {
				handle,
				id: id.to_string(),
				title: title.to_string(),
				icon: icon.to_string(),
				renderer: renderer.clone(),
			}),
		}
	}

	#[must_use]
	pub fn id(&self) -> &str {
		&self.inner.id
	}

	#[must_use]
	pub fn title(&self) -> &str {
		&self.inner.title
	}

	#[must_use]
	pub fn icon(&self) -> &str {
		&self.inner.icon
	}

	#[must_use]
	pub fn renderer(&self) -> &CategoryRenderer {
		&self.inner.renderer
	}

	pub(crate) fn handle(&self) -> &Handle {
		&self.inner.handle
	}

	#[must_use]
	pub fn native(&self) -> NativeRef {
		self.inner.handle.native()
	}
}

impl fmt::Debug for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Category")
			.field("id", &self.inner.id)
			.field("native", &self.native())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;

	#[test]
	fn default_renderer_is_valid_json() {
		let renderer = CategoryRenderer::default();
		let reparsed = CategoryRenderer::from_json(renderer.template()).unwrap();
		assert_eq!(reparsed, renderer);
	}

	#[test]
	fn malformed_templates_are_rejected() {
		let err = CategoryRenderer::from_json("{\"template\":").unwrap_err();
		assert!(matches!(err, Error::Decode { .. }));
	}
}
