use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = rally_api::Args::parse();

	rally_api::run(args).await
}
