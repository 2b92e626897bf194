//! Scope configuration loading.
//!
//! A scope is described by an `.ini` file. Its `[ScopeConfig]` section holds
//! presentation metadata and its `[Settings]` section holds values handed to
//! the scope through [`ScopeBase::settings`](crate::ScopeBase::settings).
//! Environment variables prefixed with `SCOPES__` override file values,
//! e.g. `SCOPES__SETTINGS__LIMIT=5`. Keys are case-insensitive.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const SCOPE_SECTION: &str = "scopeconfig";
const SETTINGS_SECTION: &str = "settings";

/// Presentation metadata from the `[ScopeConfig]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
	#[serde(rename = "displayname")]
	pub display_name: Option<String>,
	pub description: Option<String>,
	pub author: Option<String>,
	pub icon: Option<String>,
	#[serde(rename = "searchhint")]
	pub search_hint: Option<String>,
	pub art: Option<String>,
}

/// Everything read from a scope configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeSettings {
	pub scope: ScopeConfig,
	/// The `[Settings]` section with lower-cased keys.
	pub values: Map<String, Value>,
}

impl ScopeSettings {
	/// Encode the settings values as the blob handed to the scope.
	pub fn values_blob(&self) -> Result<Vec<u8>> {
		serde_json::to_vec(&self.values).context("failed to encode scope settings")
	}
}

/// Load a scope configuration file layered with environment overrides.
pub fn load(path: &Path) -> Result<ScopeSettings> {
	let config = Config::builder()
		.add_source(File::from(path).format(FileFormat::Ini).required(true))
		.add_source(Environment::with_prefix("scopes").separator("__"))
		.build()
		.with_context(|| format!("failed to read scope configuration {}", path.display()))?;

	let raw: Map<String, Value> = config
		.try_deserialize()
		.map_err(|err| anyhow!("failed to deserialize scope configuration: {err}"))?;
	let mut sections = fold_case(raw);

	let scope = match sections.remove(SCOPE_SECTION) {
		Some(section) => serde_json::from_value(section)
			.with_context(|| format!("invalid [ScopeConfig] section in {}", path.display()))?,
		None => ScopeConfig::default(),
	};
	let values = match sections.remove(SETTINGS_SECTION) {
		Some(Value::Object(values)) => values,
		Some(other) => {
			return Err(anyhow!(
				"invalid [Settings] section in {}: expected a table, found {other}",
				path.display()
			));
		}
		None => Map::new(),
	};

	Ok(ScopeSettings { scope, values })
}

/// Lower-case every key, merging tables whose names differ only by case.
fn fold_case(map: Map<String, Value>) -> Map<String, Value> {
	let mut folded = Map::new();
	for (key, value) in map {
		let value = match value {
			Value::Object(inner) => Value::Object(fold_case(inner)),
			other => other,
		};
		let key = key.to_ascii_lowercase();
		match (folded.get_mut(&key), value) {
			(Some(Value::Object(existing)), Value::Object(incoming)) => existing.extend(incoming),
			(_, value) => {
				folded.insert(key, value);
			}
		}
	}
	folded
}
