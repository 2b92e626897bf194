//! Drives a scope through the adapter the way a host runtime would.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use scopes_bridge::host::memory::{MemoryHost, ReplyEvent};
use scopes_bridge::{
	ActionMetadata, ActivationResponse, ActivationStatus, Activator, CancelRegistry, CannedQuery,
	CategorisedResult, Cancellation, PerformActioner, PreviewReply, PreviewWidget, Scope,
	ScopeAdapter, ScopeResult, SearchMetadata, SearchReply,
};
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Behaviour {
	Books,
	PollUntilCancelled,
	Fail,
	Panic,
	FinishThenFail,
	UnencodableAttribute,
}

struct TestScope {
	behaviour: Behaviour,
	observed_cancel: Arc<AtomicBool>,
}

impl TestScope {
	fn new(behaviour: Behaviour) -> Self {
		Self {
			behaviour,
			observed_cancel: Arc::new(AtomicBool::new(false)),
		}
	}
}

impl Scope for TestScope {
	fn search(
		&self,
		query: &CannedQuery,
		_metadata: &SearchMetadata,
		reply: &SearchReply,
		cancelled: &Cancellation,
	) -> Result<()> {
		match self.behaviour {
			Behaviour::Books => {
				let books = reply.register_category("books", "Books", "icon.svg")?;
				for title in ["Dune", "Emma"] {
					let mut result = CategorisedResult::new(&books)?;
					result.set_uri(&format!("file:///{}", title.to_lowercase()))?;
					result.set_title(title)?;
					result.set("query", &query.query_string())?;
					reply.push(&result)?;
				}
				Ok(())
			}
			Behaviour::PollUntilCancelled => {
				while !cancelled.wait_timeout(Duration::from_millis(1)) {}
				self.observed_cancel.store(true, Ordering::SeqCst);
				Ok(())
			}
			Behaviour::Fail => Err(anyhow!("index unavailable")),
			Behaviour::Panic => panic!("corrupt index"),
			Behaviour::FinishThenFail => {
				reply.finished()?;
				bail!("too late")
			}
			Behaviour::UnencodableAttribute => {
				let books = reply.register_category("books", "Books", "")?;
				let mut result = CategorisedResult::new(&books)?;
				result.set_title("before")?;
				let tuple_keys = HashMap::from([((1u8, 2u8), "x")]);
				assert!(result.set("title", &tuple_keys).is_err());
				assert_eq!(result.title(), "before");
				reply.push(&result)?;
				Ok(())
			}
		}
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
}

struct ActionScope;

impl Scope for ActionScope {
	fn search(
		&self,
		_query: &CannedQuery,
		_metadata: &SearchMetadata,
		_reply: &SearchReply,
		_cancelled: &Cancellation,
	) -> Result<()> {
		Ok(())
	}

	fn preview(
		&self,
		_result: &ScopeResult,
		_metadata: &ActionMetadata,
		_reply: &PreviewReply,
		_cancelled: &Cancellation,
	) -> Result<()> {
		Ok(())
	}

	fn as_action_performer(&self) -> Option<&dyn PerformActioner> {
		Some(self)
	}
}

impl PerformActioner for ActionScope {
	fn perform_action(
		&self,
		result: &ScopeResult,
		_metadata: &ActionMetadata,
		widget_id: &str,
		action_id: &str,
	) -> Result<ActivationResponse> {
		let mut response = ActivationResponse::new(ActivationStatus::UpdatePreview);
		response.set_scope_data(&json!({
			"uri": result.uri(),
			"widget": widget_id,
			"action": action_id,
		}))?;
		Ok(response)
	}
}

#[derive(Clone, Copy)]
enum Failure {
	Error,
	Panic,
}

struct FailingScope(Failure);

impl FailingScope {
	fn respond(&self) -> Result<ActivationResponse> {
		match self.0 {
			Failure::Error => Err(anyhow!("result vanished").context("activating dune")),
			Failure::Panic => panic!("result table poisoned"),
		}
	}
}

impl Scope for FailingScope {
	fn search(
		&self,
		_query: &CannedQuery,
		_metadata: &SearchMetadata,
		_reply: &SearchReply,
		_cancelled: &Cancellation,
	) -> Result<()> {
		Ok(())
	}

	fn preview(
		&self,
		_result: &ScopeResult,
		_metadata: &ActionMetadata,
		_reply: &PreviewReply,
		_cancelled: &Cancellation,
	) -> Result<()> {
		Ok(())
	}

	fn as_activator(&self) -> Option<&dyn Activator> {
		Some(self)
	}

	fn as_action_performer(&self) -> Option<&dyn PerformActioner> {
		Some(self)
	}
}

impl Activator for FailingScope {
	fn activate(&self, _result: &ScopeResult, _metadata: &ActionMetadata) -> Result<ActivationResponse> {
		self.respond()
	}
}

impl PerformActioner for FailingScope {
	fn perform_action(
		&self,
		_result: &ScopeResult,
		_metadata: &ActionMetadata,
		_widget_id: &str,
		_action_id: &str,
	) -> Result<ActivationResponse> {
		self.respond()
	}
}

fn adapter(host: &Arc<MemoryHost>, scope: impl Scope) -> ScopeAdapter {
	ScopeAdapter::new(scope, host.clone()).with_registry(Arc::new(CancelRegistry::new()))
}

fn run_search(host: &Arc<MemoryHost>, adapter: &ScopeAdapter, query: &str) -> Vec<ReplyEvent> {
	let reply = host.create_reply();
	let token = adapter.registry().register();
	let dispatch = adapter.search(
		host.canned_query("books", query),
		host.search_metadata(10, "en_US", "phone"),
		reply,
		token,
	);
	assert!(dispatch.join());
	assert!(host.wait_for_terminal(reply, TIMEOUT));
	host.events(reply)
}

fn terminals(events: &[ReplyEvent]) -> usize {
	events.iter().filter(|event| event.is_terminal()).count()
}

#[test]
fn search_streams_category_results_then_finishes() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::Books));

	let events = run_search(&host, &adapter, "classics");

	assert_eq!(events.len(), 4);
	assert!(matches!(
		&events[0],
		ReplyEvent::CategoryRegistered { id, title, icon, .. }
			if id == "books" && title == "Books" && icon == "icon.svg"
	));
	for (event, title) in events[1..3].iter().zip(["Dune", "Emma"]) {
		let ReplyEvent::Pushed {
			category,
			attributes,
		} = event
		else {
			panic!("expected a pushed result, got {event:?}");
		};
		assert_eq!(category, "books");
		assert_eq!(attributes["title"], json!(title));
		assert_eq!(attributes["query"], json!("classics"));
	}
	assert_eq!(events[3], ReplyEvent::Finished);
}

#[test]
fn cancellation_reaches_a_polling_handler() {
	let host = MemoryHost::new();
	let scope = TestScope::new(Behaviour::PollUntilCancelled);
	let observed = Arc::clone(&scope.observed_cancel);
	let adapter = adapter(&host, scope);

	let reply = host.create_reply();
	let token = adapter.registry().register();
	let dispatch = adapter.search(
		host.canned_query("books", "slow"),
		host.search_metadata(0, "en", "desktop"),
		reply,
		token,
	);

	thread::sleep(Duration::from_millis(5));
	let signalled_at = Instant::now();
	assert!(adapter.registry().signal(token));

	assert!(host.wait_for_terminal(reply, TIMEOUT));
	assert!(signalled_at.elapsed() < TIMEOUT);
	assert!(dispatch.join());
	assert!(observed.load(Ordering::SeqCst));
	assert_eq!(host.events(reply), vec![ReplyEvent::Finished]);
	assert!(!adapter.registry().contains(token));
}

#[test]
fn handler_errors_become_reply_errors() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::Fail));

	let events = run_search(&host, &adapter, "");

	assert_eq!(
		events,
		vec![ReplyEvent::Error {
			message: "index unavailable".into()
		}]
	);
}

#[test]
fn handler_panics_become_reply_errors() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::Panic));

	let events = run_search(&host, &adapter, "");

	assert_eq!(events.len(), 1);
	let ReplyEvent::Error { message } = &events[0] else {
		panic!("expected an error, got {:?}", events[0]);
	};
	assert!(message.contains("corrupt index"), "{message}");
}

#[test]
fn only_the_first_terminal_signal_reaches_the_host() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::FinishThenFail));

	let events = run_search(&host, &adapter, "");

	assert_eq!(events, vec![ReplyEvent::Finished]);
	assert_eq!(terminals(&events), 1);
}

#[test]
fn unencodable_values_leave_results_untouched() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::UnencodableAttribute));

	let events = run_search(&host, &adapter, "");

	let pushed = events
		.iter()
		.find_map(|event| match event {
			ReplyEvent::Pushed { attributes, .. } => Some(attributes),
			_ => None,
		})
		.expect("a result was pushed");
	assert_eq!(pushed["title"], json!("before"));
	assert_eq!(events.last(), Some(&ReplyEvent::Finished));
}

#[test]
fn native_objects_are_destroyed_exactly_once() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::Books));

	let query = host.canned_query("books", "dune");
	let metadata = host.search_metadata(1, "en", "desktop");
	let reply = host.create_reply();
	let token = adapter.registry().register();
	assert!(adapter.search(query, metadata, reply, token).join());

	for object in [query, metadata, reply] {
		assert_eq!(host.destroy_count(object), 1, "{object:?}");
		assert!(!host.is_live(object));
	}
	assert!(adapter.registry().is_empty());
}

#[test]
fn preview_sends_widgets_and_attributes() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::Books));

	let result = host.create_object_with([("title", json!("Dune"))]);
	let reply = host.create_reply();
	let token = adapter.registry().register();
	let dispatch = adapter.preview(result, host.action_metadata("en", "phone"), reply, token);
	assert!(dispatch.join());
	assert!(host.wait_for_terminal(reply, TIMEOUT));

	let events = host.events(reply);
	assert_eq!(events.len(), 3);
	assert!(
		matches!(&events[0], ReplyEvent::PreviewWidgets { widgets } if widgets[0]["id"] == "header")
	);
	assert_eq!(
		events[1],
		ReplyEvent::PreviewAttribute {
			key: "title".into(),
			value: json!("Dune"),
		}
	);
	assert_eq!(events[2], ReplyEvent::Finished);
	assert_eq!(host.destroy_count(result), 1);
}

#[test]
fn activation_without_an_activator_is_not_handled() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::Books));

	let result = host.create_object();
	let metadata = host.action_metadata("en", "phone");
	let response = adapter.activate(result, metadata).expect("activation");

	assert_eq!(response.status, ActivationStatus::NotHandled);
	assert_eq!(response.scope_data, None);
	assert_eq!(host.destroy_count(result), 1);
	assert_eq!(host.destroy_count(metadata), 1);
}

#[test]
fn preview_actions_reach_the_action_performer() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, ActionScope);

	let result = host.create_object_with([("uri", json!("file:///dune"))]);
	let response = adapter
		.perform_action(result, host.action_metadata("en", "phone"), "buttons", "open")
		.expect("action");

	assert_eq!(response.status, ActivationStatus::UpdatePreview);
	let data: serde_json::Value =
		serde_json::from_str(response.scope_data.as_deref().expect("scope data")).expect("json");
	assert_eq!(
		data,
		json!({ "uri": "file:///dune", "widget": "buttons", "action": "open" })
	);
}

#[test]
fn failing_activation_reports_a_message() {
	let cases = [
		(Failure::Error, "activating dune: result vanished"),
		(Failure::Panic, "scope handler panicked: result table poisoned"),
	];
	for (failure, expected) in cases {
		let host = MemoryHost::new();
		let adapter = adapter(&host, FailingScope(failure));

		let result = host.create_object_with([("uri", json!("file:///dune"))]);
		let metadata = host.action_metadata("en", "phone");
		let message = adapter.activate(result, metadata).unwrap_err();
		assert_eq!(message, expected);
		assert_eq!(host.destroy_count(result), 1);
		assert_eq!(host.destroy_count(metadata), 1);

		let result = host.create_object();
		let metadata = host.action_metadata("en", "phone");
		let message = adapter
			.perform_action(result, metadata, "buttons", "open")
			.unwrap_err();
		assert_eq!(message, expected);
		assert_eq!(host.destroy_count(result), 1);
		assert_eq!(host.destroy_count(metadata), 1);
	}
}

#[test]
fn concurrent_searches_are_cancelled_independently() {
	let host = MemoryHost::new();
	let adapter = adapter(&host, TestScope::new(Behaviour::PollUntilCancelled));

	let start = |query: &str| {
		let reply = host.create_reply();
		let token = adapter.registry().register();
		let dispatch = adapter.search(
			host.canned_query("books", query),
			host.search_metadata(0, "en", "desktop"),
			reply,
			token,
		);
		(reply, token, dispatch)
	};
	let (first_reply, first_token, first) = start("first");
	let (second_reply, second_token, second) = start("second");

	assert!(adapter.registry().signal(first_token));
	assert!(host.wait_for_terminal(first_reply, TIMEOUT));
	assert!(first.join());
	assert!(!host.wait_for_terminal(second_reply, Duration::from_millis(20)));
	assert!(host.events(second_reply).is_empty());
	assert!(adapter.registry().contains(second_token));

	assert!(adapter.registry().signal(second_token));
	assert!(host.wait_for_terminal(second_reply, TIMEOUT));
	assert!(second.join());

	for reply in [first_reply, second_reply] {
		let events = host.events(reply);
		assert_eq!(events, vec![ReplyEvent::Finished]);
		assert_eq!(terminals(&events), 1);
	}
	assert!(adapter.registry().is_empty());
}
