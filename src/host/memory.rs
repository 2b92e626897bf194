//! An in-process [`Host`] for tests and local experimentation.
//!
//! Objects are attribute maps, replies record every event they receive, and
//! destroy calls are counted per object so ownership bugs show up as counts
//! other than one.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{Host, NativeRef};
use crate::bridge::ScopeAdapter;

/// Something a reply sink received from the adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplyEvent {
	CategoryRegistered {
		id: String,
		title: String,
		icon: String,
		template: Value,
	},
	Pushed {
		category: String,
		attributes: BTreeMap<String, Value>,
	},
	Filters {
		filters: Value,
		state: Value,
	},
	PreviewWidgets {
		widgets: Value,
	},
	PreviewAttribute {
		key: String,
		value: Value,
	},
	Finished,
	Error {
		message: String,
	},
}

impl ReplyEvent {
	#[must_use]
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Finished | Self::Error { .. })
	}
}

#[derive(Default)]
struct Object {
	attributes: BTreeMap<String, String>,
	category: Option<NativeRef>,
	intercept_activation: bool,
}

#[derive(Default)]
struct State {
	objects: HashMap<NativeRef, Object>,
	destroyed: HashMap<NativeRef, usize>,
	events: HashMap<NativeRef, Vec<ReplyEvent>>,
	rejected: HashSet<String>,
	served: Vec<(String, Arc<ScopeAdapter>)>,
}

/// Host runtime living entirely in memory.
pub struct MemoryHost {
	next: AtomicU64,
	state: Mutex<State>,
	terminal: Condvar,
}

impl MemoryHost {
	#[must_use]
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			next: AtomicU64::new(1),
			state: Mutex::new(State::default()),
			terminal: Condvar::new(),
		})
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn insert(&self, object: Object) -> NativeRef {
		let native = NativeRef::from_raw(self.next.fetch_add(1, Ordering::Relaxed));
		self.state().objects.insert(native, object);
		native
	}

	/// Create an object with no attributes.
	pub fn create_object(&self) -> NativeRef {
		self.insert(Object::default())
	}

	/// Create an object pre-populated with attributes.
	pub fn create_object_with<'a>(
		&self,
		attributes: impl IntoIterator<Item = (&'a str, Value)>,
	) -> NativeRef {
		let attributes = attributes
			.into_iter()
			.map(|(name, value)| (name.to_string(), value.to_string()))
			.collect();
		self.insert(Object {
			attributes,
			..Object::default()
		})
	}

	/// Create a reply sink with an empty event log.
	pub fn create_reply(&self) -> NativeRef {
		let native = self.create_object();
		self.state().events.insert(native, Vec::new());
		native
	}

	pub fn canned_query(&self, scope_id: &str, query_string: &str) -> NativeRef {
		self.create_object_with([
			("scope_id", json!(scope_id)),
			("query_string", json!(query_string)),
		])
	}

	pub fn search_metadata(&self, cardinality: u32, locale: &str, form_factor: &str) -> NativeRef {
		self.create_object_with([
			("cardinality", json!(cardinality)),
			("locale", json!(locale)),
			("form_factor", json!(form_factor)),
		])
	}

	pub fn action_metadata(&self, locale: &str, form_factor: &str) -> NativeRef {
		self.create_object_with([("locale", json!(locale)), ("form_factor", json!(form_factor))])
	}

	/// Store raw attribute text, bypassing encoding.
	pub fn set_raw_attribute(&self, object: NativeRef, name: &str, text: &str) {
		self.state()
			.objects
			.entry(object)
			.or_default()
			.attributes
			.insert(name.to_string(), text.to_string());
	}

	/// Decoded attribute of a live object.
	#[must_use]
	pub fn attribute(&self, object: NativeRef, name: &str) -> Option<Value> {
		let state = self.state();
		let text = state.objects.get(&object)?.attributes.get(name)?;
		serde_json::from_str(text).ok()
	}

	/// Refuse every future write to attributes with this name.
	pub fn reject_attribute(&self, name: &str) {
		self.state().rejected.insert(name.to_string());
	}

	#[must_use]
	pub fn destroy_count(&self, object: NativeRef) -> usize {
		self.state().destroyed.get(&object).copied().unwrap_or(0)
	}

	#[must_use]
	pub fn is_live(&self, object: NativeRef) -> bool {
		self.state().objects.contains_key(&object)
	}

	#[must_use]
	pub fn intercepts_activation(&self, object: NativeRef) -> bool {
		self.state()
			.objects
			.get(&object)
			.is_some_and(|object| object.intercept_activation)
	}

	/// Events recorded on a reply so far.
	#[must_use]
	pub fn events(&self, reply: NativeRef) -> Vec<ReplyEvent> {
		self.state().events.get(&reply).cloned().unwrap_or_default()
	}

	/// Block until the reply has received a terminal event or `timeout` passes.
	pub fn wait_for_terminal(&self, reply: NativeRef, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let mut state = self.state();
		loop {
			let done = state
				.events
				.get(&reply)
				.is_some_and(|events| events.iter().any(ReplyEvent::is_terminal));
			if done {
				return true;
			}
			let now = Instant::now();
			if now >= deadline {
				return false;
			}
			state = self
				.terminal
				.wait_timeout(state, deadline - now)
				.unwrap_or_else(PoisonError::into_inner)
				.0;
		}
	}

	/// Scope ids handed over through [`Host::run_scope`].
	#[must_use]
	pub fn served_scopes(&self) -> Vec<String> {
		self.state().served.iter().map(|(id, _)| id.clone()).collect()
	}

	/// The adapter registered for `scope_id`, if it was served.
	#[must_use]
	pub fn adapter(&self, scope_id: &str) -> Option<Arc<ScopeAdapter>> {
		self.state()
			.served
			.iter()
			.find(|(id, _)| id == scope_id)
			.map(|(_, adapter)| Arc::clone(adapter))
	}

	fn record(&self, reply: NativeRef, event: ReplyEvent) -> Result<(), String> {
		let terminal = event.is_terminal();
		let mut state = self.state();
		let events = state
			.events
			.get_mut(&reply)
			.ok_or_else(|| format!("unknown reply {reply:?}"))?;
		events.push(event);
		drop(state);
		if terminal {
			self.terminal.notify_all();
		}
		Ok(())
	}
}

fn parse(text: &str) -> Value {
	serde_json::from_str(text).unwrap_or(Value::Null)
}

impl Host for MemoryHost {
	fn get_attribute(&self, object: NativeRef, name: &str) -> Result<Option<String>, String> {
		let state = self.state();
		let object = state
			.objects
			.get(&object)
			.ok_or_else(|| format!("unknown object {object:?}"))?;
		Ok(object.attributes.get(name).cloned())
	}

	fn set_attribute(&self, object: NativeRef, name: &str, encoded: &str) -> Result<(), String> {
		let mut state = self.state();
		if state.rejected.contains(name) {
			return Err(format!("attribute '{name}' is read-only"));
		}
		let object = state
			.objects
			.get_mut(&object)
			.ok_or_else(|| format!("unknown object {object:?}"))?;
		object.attributes.insert(name.to_string(), encoded.to_string());
		Ok(())
	}

	fn destroy(&self, object: NativeRef) {
		let mut state = self.state();
		state.objects.remove(&object);
		*state.destroyed.entry(object).or_default() += 1;
	}

	fn register_category(
		&self,
		reply: NativeRef,
		id: &str,
		title: &str,
		icon: &str,
		template: &str,
	) -> Result<NativeRef, String> {
		self.record(
			reply,
			ReplyEvent::CategoryRegistered {
				id: id.to_string(),
				title: title.to_string(),
				icon: icon.to_string(),
				template: parse(template),
			},
		)?;
		Ok(self.create_object_with([("id", json!(id)), ("title", json!(title))]))
	}

	fn new_categorised_result(&self, category: NativeRef) -> Result<NativeRef, String> {
		if !self.is_live(category) {
			return Err(format!("unknown category {category:?}"));
		}
		Ok(self.insert(Object {
			category: Some(category),
			..Object::default()
		}))
	}

	fn set_intercept_activation(&self, result: NativeRef) {
		if let Some(object) = self.state().objects.get_mut(&result) {
			object.intercept_activation = true;
		}
	}

	fn push_result(&self, reply: NativeRef, result: NativeRef) -> Result<(), String> {
		let event = {
			let state = self.state();
			let object = state
				.objects
				.get(&result)
				.ok_or_else(|| format!("unknown result {result:?}"))?;
			let category = object
				.category
				.and_then(|category| state.objects.get(&category))
				.and_then(|category| category.attributes.get("id"))
				.map(|id| parse(id).as_str().unwrap_or_default().to_string())
				.unwrap_or_default();
			let attributes = object
				.attributes
				.iter()
				.map(|(name, text)| (name.clone(), parse(text)))
				.collect();
			ReplyEvent::Pushed {
				category,
				attributes,
			}
		};
		self.record(reply, event)
	}

	fn push_filters(&self, reply: NativeRef, filters: &str, state: &str) -> Result<(), String> {
		self.record(
			reply,
			ReplyEvent::Filters {
				filters: parse(filters),
				state: parse(state),
			},
		)
	}

	fn push_preview(&self, reply: NativeRef, widgets: &str) -> Result<(), String> {
		self.record(
			reply,
			ReplyEvent::PreviewWidgets {
				widgets: parse(widgets),
			},
		)
	}

	fn push_preview_attribute(
		&self,
		reply: NativeRef,
		key: &str,
		encoded: &str,
	) -> Result<(), String> {
		self.record(
			reply,
			ReplyEvent::PreviewAttribute {
				key: key.to_string(),
				value: parse(encoded),
			},
		)
	}

	fn reply_finished(&self, reply: NativeRef) {
		if let Err(err) = self.record(reply, ReplyEvent::Finished) {
			debug!(%err, "finished on unknown reply");
		}
	}

	fn reply_error(&self, reply: NativeRef, message: &str) {
		let event = ReplyEvent::Error {
			message: message.to_string(),
		};
		if let Err(err) = self.record(reply, event) {
			debug!(%err, "error on unknown reply");
		}
	}

	fn run_scope(
		&self,
		scope_id: &str,
		runtime_config: Option<&Path>,
		adapter: Arc<ScopeAdapter>,
	) -> Result<(), String> {
		if self.adapter(scope_id).is_some() {
			return Err(format!("scope '{scope_id}' is already being served"));
		}
		debug!(scope_id, ?runtime_config, "serving scope in memory");
		self.state().served.push((scope_id.to_string(), adapter));
		Ok(())
	}
}
