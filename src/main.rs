use clap::Parser;
use eidos::adapters::component_registry::InMemoryComponentRegistry;
use eidos::adapters::fixture_store::FileFixtureStore;
use eidos::adapters::sandbox::SandboxSession;
use eidos::cli::Cli;
use eidos::config::Settings;
use eidos::prop_types::{self, ValidatorLibrary};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output can be piped
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;

    let library = ValidatorLibrary::shared();
    prop_types::instrument(&library);

    let registry = InMemoryComponentRegistry::new(Arc::clone(&library));
    let components_dir = settings.components_path();
    let loaded = registry.load_from_dir(&components_dir).await?;
    info!("Loaded {} component declarations from {}", loaded, components_dir.display());

    let store = FileFixtureStore::new(settings.fixtures_path());
    let session = SandboxSession::new(library, Arc::new(registry), Arc::new(store));

    let output = eidos::execute(&cli.command, &session, &settings).await?;
    print!("{}", output);

    Ok(())
}
