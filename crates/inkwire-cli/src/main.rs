use anyhow::Result;
use clap::Parser;
use inkwire_cli::{build_app, init_tracing, load_field_map, serve, validate_cli, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    validate_cli(&cli)?;
    let field_map = load_field_map(&cli.field_map)?;
    let app = build_app(&cli, field_map)?;
    serve(&cli, app).await
}
