mod echo;
mod output;

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use scopes_bridge::host::memory::MemoryHost;
use scopes_bridge::{RunArgs, logging, runtime};

use echo::EchoScope;
use output::{print_json, print_plain};

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
	Plain,
	Json,
}

/// Run the built-in echo scope through an in-memory host and print what
/// the host received.
#[derive(Parser, Debug)]
#[command(name = "scopes-bridge", version, about)]
struct Cli {
	#[command(flatten)]
	run: RunArgs,
	#[arg(short, long, value_enum, default_value = "plain", help = "Output format")]
	output: OutputFormat,
	#[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity")]
	verbose: u8,
	#[arg(long, value_name = "MS", default_value_t = 0, help = "Delay before each result")]
	delay: u64,
	#[arg(long, value_name = "MS", help = "Cancel the search after this many milliseconds")]
	cancel_after: Option<u64>,
	/// The search query.
	query: String,
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	logging::initialize(cli.verbose)?;

	let host = MemoryHost::new();
	let scope = EchoScope::new(Duration::from_millis(cli.delay));
	runtime::run_with(scope, host.clone(), &cli.run)?;

	let scope_id = cli.run.scope_id()?;
	let adapter = host
		.adapter(&scope_id)
		.context("host did not register the scope")?;

	let token = adapter.registry().register();
	let reply = host.create_reply();
	let dispatch = adapter.search(
		host.canned_query(&scope_id, &cli.query),
		host.search_metadata(0, "en", "desktop"),
		reply,
		token,
	);

	if let Some(ms) = cli.cancel_after {
		thread::sleep(Duration::from_millis(ms));
		adapter.registry().signal(token);
	}

	if !dispatch.join() {
		bail!("search task did not run to completion");
	}
	if !host.wait_for_terminal(reply, COMPLETION_TIMEOUT) {
		bail!("scope did not deliver a terminal signal");
	}

	let events = host.events(reply);
	match cli.output {
		OutputFormat::Plain => print_plain(&events),
		OutputFormat::Json => print_json(&events)?,
	}

	Ok(())
}
