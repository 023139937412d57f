//! CLI argument definitions for the Byline binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Byline blog platform client
#[derive(Parser, Debug)]
#[command(name = "byline")]
#[command(about = "Byline: command-line client for the Byline blog platform")]
#[command(version)]
pub struct Cli {
    /// Backend API base URL
    #[arg(
        long,
        default_value = "http://localhost:8000/api/",
        env = "BYLINE_API_URL"
    )]
    pub api_url: String,

    /// File the session tokens are persisted in.
    /// Defaults to .byline-tokens.json in the home directory.
    #[arg(long, env = "BYLINE_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and persist the session
    Login(LoginArgs),
    /// Clear the persisted session
    Logout,
    /// Show the currently authenticated user
    Whoami,
    /// Create an account
    Register(RegisterArgs),
    /// Article operations
    Article(ArticleArgs),
    /// Search published articles
    Search(SearchArgs),
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Account email address
    pub email: String,

    /// Account password
    #[arg(long, env = "BYLINE_PASSWORD")]
    pub password: String,
}

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    pub username: String,
    pub email: String,

    #[arg(long, env = "BYLINE_PASSWORD")]
    pub password: String,
}

#[derive(clap::Args, Debug)]
pub struct ArticleArgs {
    #[command(subcommand)]
    pub command: ArticleCommands,
}

#[derive(Subcommand, Debug)]
pub enum ArticleCommands {
    /// Fetch one article and print it
    Get {
        /// Article id
        id: u64,
    },
    /// List visible articles
    List,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Search keywords
    pub query: String,

    /// Result page to fetch
    #[arg(long)]
    pub page: Option<u32>,
}
