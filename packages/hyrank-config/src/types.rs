use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub fusion: Fusion,
	#[serde(default)]
	pub temporal: Temporal,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub vector_dim: u32,
	/// Path of the trap corpus fixture. Relative paths resolve against the working directory.
	pub fixture: PathBuf,
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Memory,
	Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub candidate_k: u32,
	pub timeout_ms: u64,
	pub lexical_match: LexicalMatch,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { candidate_k: 20, timeout_ms: 3_000, lexical_match: LexicalMatch::Any }
	}
}

/// How query lexemes combine when deciding whether a document matches at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexicalMatch {
	/// At least one query lexeme must occur in the document.
	#[default]
	Any,
	/// Every query lexeme must occur, as web-search query syntax does.
	All,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fusion {
	pub rrf_k: f64,
	pub result_size: i64,
	pub vector_weight: f64,
	pub lexical_weight: f64,
}
impl Default for Fusion {
	fn default() -> Self {
		Self { rrf_k: 60.0, result_size: 5, vector_weight: 1.0, lexical_weight: 1.0 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Temporal {
	pub default_window: Option<String>,
	pub category: Option<String>,
}

fn default_log_level() -> String {
	"info".to_string()
}
