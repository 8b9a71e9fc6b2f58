mod cache;
mod cli;
mod config;
mod download;
mod error;
mod github;
mod install;
mod platform;
mod search_path;
mod types;


use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Settings;
use error::SetupError;
use github::{GitHubClient, ReleaseLookup};
use install::{
    DartSassInstallCommand, DartSassInstaller, HugoInstallCommand, HugoInstaller, ToolHost,
};
use platform::Platform;
use search_path::search_path_var;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    let has_token = cli.token().is_some();
    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        if let Some(setup_err) = e.downcast_ref::<SetupError>() {
            if setup_err.is_not_found() {
                tracing::error!("Check that the requested version is a published release tag");
            } else if setup_err.is_transport() && !has_token {
                tracing::error!("Unauthenticated API requests are rate limited; set GITHUB_TOKEN");
            }
        }
        if std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true") {
            println!("::error::Action failed with error {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env().context("Failed to load settings")?;
    let client = GitHubClient::with_base_url(&settings.api_url, cli.token());
    let lookup = ReleaseLookup::new(Arc::new(client));
    let platform = Platform::current();
    let host = ToolHost::from_settings(&settings, !cli.quiet);

    let hugo = HugoInstaller::new(lookup.clone(), platform.clone(), host.clone());
    let hugo_dir = hugo
        .install(&HugoInstallCommand {
            version: cli.hugo_version.clone(),
            extended: cli.extended,
            with_deploy: cli.with_deploy,
        })
        .await
        .context("Failed to install Hugo")?;
    tracing::info!("Hugo is available from {}", hugo_dir.display());

    if cli.dart_sass {
        let dart_sass = DartSassInstaller::new(lookup, platform, host.clone());
        let sass_dir = dart_sass
            .install(&DartSassInstallCommand {
                version: cli.dart_sass_version.clone(),
            })
            .await
            .context("Failed to install Dart Sass")?;
        tracing::info!("Dart Sass is available from {}", sass_dir.display());
    }

    let path_var = search_path_var(&host.search_path.added(), std::env::var_os("PATH"))?;
    tracing::debug!("PATH for later steps: {}", path_var.to_string_lossy());

    Ok(())
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Step debug logging on a GitHub Actions re-run
    let runner_debug = std::env::var("RUNNER_DEBUG").as_deref() == Ok("1");

    let level = if cli.quiet {
        "error"
    } else if cli.verbose >= 2 || runner_debug {
        "debug"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}
