use anyhow::Result;
use scopes_bridge::host::memory::ReplyEvent;
use serde_json::Value;

fn describe(event: &ReplyEvent) -> String {
	match event {
		ReplyEvent::CategoryRegistered { id, title, .. } => format!("category {id} ({title})"),
		ReplyEvent::Pushed {
			category,
			attributes,
		} => {
			let title = attributes.get("title").and_then(Value::as_str).unwrap_or("");
			let uri = attributes.get("uri").and_then(Value::as_str).unwrap_or("");
			format!("result [{category}] {title} <{uri}>")
		}
		ReplyEvent::Filters { filters, .. } => format!("filters {filters}"),
		ReplyEvent::PreviewWidgets { widgets } => format!("widgets {widgets}"),
		ReplyEvent::PreviewAttribute { key, value } => format!("attribute {key} = {value}"),
		ReplyEvent::Finished => "finished".to_string(),
		ReplyEvent::Error { message } => format!("error: {message}"),
	}
}

/// Print one line per recorded reply event.
pub(crate) fn print_plain(events: &[ReplyEvent]) {
	for event in events {
		println!("{}", describe(event));
	}
}

pub(crate) fn format_events_json(events: &[ReplyEvent]) -> Result<String> {
	Ok(serde_json::to_string_pretty(events)?)
}

pub(crate) fn print_json(events: &[ReplyEvent]) -> Result<()> {
	println!("{}", format_events_json(events)?);
	Ok(())
}
