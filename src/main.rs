use std::path::PathBuf;
#[cfg(feature = "gateway")]
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_core::bootstrap::{AppBuilder, resolve_config_path};
use folio_core::sync::{RepoSelection, SyncRequest};

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    version,
    about = "Personal knowledge base over your repositories with grounded message drafting"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway until ctrl-c.
    Serve,
    /// Rebuild the knowledge base from the code host.
    Sync {
        /// Free-form biography stored alongside the repositories.
        #[arg(long)]
        bio: Option<String>,
        /// Repository to ingest, optionally tagged: `name` or `name:tag,tag`.
        /// Repeatable; without it every owned repository is ingested.
        #[arg(long = "repo", value_parser = parse_repo)]
        repos: Vec<RepoSelection>,
    },
    /// Answer one message against the knowledge base.
    Chat { message: String },
    /// List the account's repositories.
    Repos,
}

fn parse_repo(raw: &str) -> Result<RepoSelection, String> {
    let (name, tags) = raw.split_once(':').unwrap_or((raw, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err("repository name must not be empty".into());
    }
    Ok(RepoSelection {
        name: name.to_owned(),
        tags: tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);
    let app = AppBuilder::from_path(config_path.clone())
        .await
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    match cli.command {
        Command::Serve => serve(&app, app.build_assistant()?).await,
        Command::Sync { bio, repos } => {
            let request = SyncRequest {
                bio,
                repos: (!repos.is_empty()).then_some(repos),
            };
            let outcome = app
                .build_assistant()?
                .sync(request)
                .await
                .context("sync failed")?;
            tracing::info!(
                documents = outcome.documents,
                upserted = outcome.report.upserted,
                dropped = outcome.report.dropped,
                skipped_repos = outcome.skipped_repos,
                "sync complete"
            );
            println!("synced {} documents", outcome.documents);
            Ok(())
        }
        Command::Chat { message } => {
            let reply = app
                .build_assistant()?
                .chat(&message)
                .await
                .context("chat failed")?;
            println!("{reply}");
            Ok(())
        }
        Command::Repos => {
            for repo in app.list_repos().await.context("listing repositories failed")? {
                let description = repo.description.unwrap_or_default();
                println!("{}\t{}\t{description}", repo.name, repo.html_url);
            }
            Ok(())
        }
    }
}

#[cfg(feature = "gateway")]
async fn serve(
    app: &AppBuilder,
    assistant: folio_core::Assistant<folio_llm::AnyProvider>,
) -> anyhow::Result<()> {
    let gateway = &app.config().gateway;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let backend = Arc::new(assistant);
    folio_gateway::GatewayServer::new(&gateway.bind, gateway.port, backend, shutdown_rx)
        .with_auth(gateway.auth_token.clone())
        .with_rate_limit(gateway.rate_limit)
        .with_max_body_size(gateway.max_body_size)
        .serve()
        .await?;
    Ok(())
}

#[cfg(not(feature = "gateway"))]
#[allow(clippy::unused_async)]
async fn serve(
    _app: &AppBuilder,
    _assistant: folio_core::Assistant<folio_llm::AnyProvider>,
) -> anyhow::Result<()> {
    anyhow::bail!("folio was built without the `gateway` feature")
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_flag_without_tags() {
        let repo = parse_repo("api").unwrap();
        assert_eq!(repo.name, "api");
        assert!(repo.tags.is_empty());
    }

    #[test]
    fn repo_flag_with_tags() {
        let repo = parse_repo("api:backend, flagship,").unwrap();
        assert_eq!(repo.name, "api");
        assert_eq!(repo.tags, vec!["backend", "flagship"]);
    }

    #[test]
    fn repo_flag_rejects_empty_name() {
        assert!(parse_repo(":tag").is_err());
    }

    #[test]
    fn cli_parses_sync_arguments() {
        let cli = Cli::try_parse_from([
            "folio",
            "--config",
            "folio.toml",
            "sync",
            "--bio",
            "backend engineer",
            "--repo",
            "api:backend",
            "--repo",
            "cli",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("folio.toml")));
        let Command::Sync { bio, repos } = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(bio.as_deref(), Some("backend engineer"));
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[1].name, "cli");
    }
}
