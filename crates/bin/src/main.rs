use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use byline::{
    ApiClient, ClientConfig, FileTokenStore, SessionManager, TokenStore,
    session::{Destination, Navigator},
};

mod cli;
mod commands;

use cli::{ArticleCommands, Cli, Commands};

/// Navigation signals have no screen to drive here; they are logged so
/// `RUST_LOG=byline=debug` shows the session's intent.
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, destination: Destination) {
        tracing::debug!(?destination, "navigation signal");
    }
}

fn default_token_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".byline-tokens.json")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("byline=info".parse().unwrap()),
        )
        .init();

    let args = Cli::parse();

    let config = ClientConfig::new(Url::parse(&args.api_url)?);
    let token_path = args.token_file.unwrap_or_else(default_token_path);
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::open(&token_path)?);
    let client = ApiClient::new(&config, store)?;
    let session = SessionManager::new(client, Arc::new(LogNavigator));

    match args.command {
        Commands::Login(login_args) => commands::auth::login(&session, login_args).await,
        Commands::Logout => commands::auth::logout(&session).await,
        Commands::Whoami => commands::auth::whoami(&session).await,
        Commands::Register(register_args) => {
            commands::auth::register(&session, register_args).await
        }
        Commands::Article(article_args) => match article_args.command {
            ArticleCommands::Get { id } => commands::articles::get(&session, id).await,
            ArticleCommands::List => commands::articles::list(&session).await,
        },
        Commands::Search(search_args) => commands::articles::search(&session, search_args).await,
    }
}
