//! ebdeploy - package, upload and roll out application bundles to managed environments

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ebdeploy_cli::cli::Cli;
use ebdeploy_cli::domain::DeployError;
use ebdeploy_cli::output::json::format_error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    if let Err(e) = cli.run().await {
        if json {
            let code = e.downcast_ref::<DeployError>().map_or("error", DeployError::code);
            match format_error(&format!("{e:#}"), code) {
                Ok(body) => println!("{body}"),
                Err(_) => eprintln!("Error: {e:#}"),
            }
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}
