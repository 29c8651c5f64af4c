use clap::Parser;

use hyrank_demo::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	hyrank_demo::run(args).await
}
