use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = huddle_api::Args::parse();

	huddle_api::run(args).await
}
