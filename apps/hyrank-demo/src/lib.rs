use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre;
use serde::Serialize;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use hyrank_config::{Config, StorageBackend};
use hyrank_domain::{Document, TimeWindow, TrapVerdict, time_serde};
use hyrank_service::{
	Backend, Catalog, HybridService, SearchMethods, SearchRequest, SearchResponse, open_backend,
	seed_postgres,
};

#[derive(Debug, Parser)]
#[command(
	version = hyrank_cli::VERSION,
	rename_all = "kebab",
	styles = hyrank_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE", default_value = hyrank_cli::DEFAULT_CONFIG)]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Write the fixture corpus to Postgres, rebased to the current time.
	Seed,
	/// Rank documents for one query and print the fused result.
	Search(SearchArgs),
	/// Print document, trap-set, and version counts.
	Stats,
	/// Print the four documents of a trap set.
	Quartet {
		#[arg(value_name = "TRAP_SET")]
		trap_set: String,
	},
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
	#[arg(long, short = 'q', value_name = "TEXT")]
	pub query: String,
	/// Comma-separated query embedding. Defaults to the demo query's stored embedding.
	#[arg(long, value_name = "F32,...", value_delimiter = ',')]
	pub embedding: Option<Vec<f32>>,
	/// Creation window such as "12 months". Defaults to temporal.default_window.
	#[arg(long, value_name = "WINDOW", conflicts_with = "no_window")]
	pub window: Option<TimeWindow>,
	#[arg(long)]
	pub no_window: bool,
	#[arg(long, value_name = "CATEGORY")]
	pub category: Option<String>,
	#[arg(long, value_name = "N")]
	pub result_size: Option<i64>,
	#[arg(long, value_enum, default_value_t = MethodsArg::Hybrid)]
	pub methods: MethodsArg,
	/// RFC 3339 instant the window ends at.
	#[arg(long, value_name = "RFC3339", value_parser = parse_instant)]
	pub as_of: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodsArg {
	Vector,
	Lexical,
	Hybrid,
}
impl From<MethodsArg> for SearchMethods {
	fn from(arg: MethodsArg) -> Self {
		match arg {
			MethodsArg::Vector => Self::VectorOnly,
			MethodsArg::Lexical => Self::LexicalOnly,
			MethodsArg::Hybrid => Self::Hybrid,
		}
	}
}

#[derive(Debug, Serialize)]
struct SearchOutput {
	query: String,
	#[serde(flatten)]
	response: SearchResponse,
	/// Present when the query text is one of the demo queries.
	#[serde(skip_serializing_if = "Option::is_none")]
	verdict: Option<TrapVerdict>,
}

#[derive(Debug, Serialize)]
struct QuartetOutput {
	trap_set: String,
	documents: Vec<QuartetDocument>,
}

#[derive(Debug, Serialize)]
struct QuartetDocument {
	id: String,
	trap_type: Option<String>,
	title: String,
	category: Option<String>,
	created_at: String,
	is_deprecated: bool,
}
impl From<&Document> for QuartetDocument {
	fn from(doc: &Document) -> Self {
		Self {
			id: doc.id.clone(),
			trap_type: doc.trap_type.map(|trap_type| trap_type.as_str().to_string()),
			title: doc.title.clone(),
			category: doc.category.clone(),
			created_at: time_serde::display(&doc.created_at),
			is_deprecated: doc.is_deprecated,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = hyrank_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

	let now = OffsetDateTime::now_utc();
	let json = match args.command {
		Command::Seed => seed(&config, now).await?,
		Command::Search(search) => {
			let backend = open_backend(&config, now).await?;

			run_search(config, backend, search, now).await?
		},
		Command::Stats => {
			let backend = open_backend(&config, now).await?;

			serde_json::to_value(backend.catalog.stats().await?)?
		},
		Command::Quartet { trap_set } => {
			let backend = open_backend(&config, now).await?;
			let documents = backend.catalog.trap_quartet(&trap_set).await?;

			if documents.is_empty() {
				return Err(eyre::eyre!("Unknown trap set {trap_set:?}."));
			}

			serde_json::to_value(QuartetOutput {
				trap_set,
				documents: documents.iter().map(QuartetDocument::from).collect(),
			})?
		},
	};

	println!("{}", serde_json::to_string_pretty(&json)?);

	Ok(())
}

async fn seed(config: &Config, now: OffsetDateTime) -> color_eyre::Result<serde_json::Value> {
	if config.storage.backend != StorageBackend::Postgres {
		return Err(eyre::eyre!("Seeding requires storage.backend = \"postgres\"."));
	}

	let report = seed_postgres(config, now).await?;

	Ok(report.to_json())
}

async fn run_search(
	config: Config,
	backend: Backend,
	args: SearchArgs,
	now: OffsetDateTime,
) -> color_eyre::Result<serde_json::Value> {
	let demo = backend
		.catalog
		.demo_queries()
		.await?
		.into_iter()
		.find(|query| query.query_text == args.query);
	let embedding = match (args.embedding, demo.as_ref()) {
		(Some(embedding), _) => embedding,
		(None, Some(demo)) => demo.embedding.clone(),
		(None, None) => {
			return Err(eyre::eyre!("No stored embedding for this query text. Pass --embedding."));
		},
	};
	let service = HybridService::new(config, backend.store)?;
	let window = if args.no_window { None } else { args.window.or(service.default_window()) };
	let mut request = SearchRequest::new(args.query.clone(), embedding)
		.with_window(window)
		.with_methods(args.methods.into())
		.as_of(args.as_of.unwrap_or(now));

	if let Some(category) = args.category {
		request = request.with_category(category);
	}
	if let Some(result_size) = args.result_size {
		request = request.with_result_size(result_size);
	}

	let response = service.search(&request).await?;
	let verdict = demo.map(|demo| service.evaluate(&response.result, &demo.expected));

	if let Some(verdict) = verdict.as_ref() {
		tracing::info!(outcome = %verdict.summary(), "Demo query evaluated.");
	}

	Ok(serde_json::to_value(SearchOutput { query: args.query, response, verdict })?)
}

fn parse_instant(raw: &str) -> Result<OffsetDateTime, String> {
	time_serde::parse(raw).map_err(|err| err.to_string())
}
