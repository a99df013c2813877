//! CLI entry point for todo-oidc.

pub mod auth;
pub mod errors;
pub mod todos;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::{AuthFlow, HostedUi, Session};
use crate::config::{ConfigLayer, TodoConfig};
use crate::error::Result;
use crate::view::{Strikethrough, TodoView};

/// Environment variable that suppresses opening a browser.
pub const NO_BROWSER_ENV: &str = "TODO_OIDC_NO_BROWSER";

/// Todo client with hosted-UI login
#[derive(Parser, Debug)]
#[command(name = "todo-oidc", version, about = "Todo client with hosted-UI login")]
pub struct Cli {
    /// Config file (default: config.toml in the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the todo API endpoint
    #[arg(long, global = true)]
    pub api_endpoint: Option<String>,

    /// Override the data directory holding tokens and config
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Disable colours and ANSI strikethrough
    #[arg(long, global = true)]
    pub plain: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in through the hosted UI
    Login(LoginArgs),
    /// Forget the cached token and log out of the hosted UI
    Logout,
    /// Show whether a token is cached
    Status,
    /// List todos
    List,
    /// Add a todo
    Add(AddArgs),
    /// Toggle completion of a todo (by id or list position)
    Toggle(SelectArgs),
    /// Delete a todo (by id or list position)
    Delete(SelectArgs),
    /// Interactive session
    Shell,
}

/// Arguments for `todo-oidc login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Authorization code or full redirect URL, skipping the browser
    #[arg(long)]
    pub code: Option<String>,
}

/// Arguments for `todo-oidc add`.
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Title words, joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
}

/// Arguments for commands addressing one todo.
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Todo id, or its 1-based position in `list`
    pub todo: String,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Command-line layer of the configuration.
    pub fn config_overrides(&self) -> ConfigLayer {
        ConfigLayer {
            api_endpoint: self.api_endpoint.clone(),
            data_dir: self.data_dir.clone(),
            ..ConfigLayer::default()
        }
    }

    /// Default filter directive for the verbosity count.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info,todo_oidc=info",
            2 => "info,todo_oidc=debug",
            _ => "trace",
        }
    }
}

/// Install the stderr tracing subscriber. `RUST_LOG` overrides the default.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Everything a command handler needs, built once per invocation.
pub struct Context {
    pub config: TodoConfig,
    pub session: Arc<Session>,
    pub flow: AuthFlow,
    pub http: reqwest::Client,
    pub plain: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = TodoConfig::load(cli.config.as_deref(), cli.config_overrides())?;
        let http = config.http_client()?;
        let session = Arc::new(Session::new(Arc::new(config.token_store())));
        let flow = AuthFlow::new(
            HostedUi::new(config.hosted_ui()).with_client(http.clone()),
            session.clone(),
        )
        .with_silent_refresh(config.silent_refresh);
        let plain = cli.plain || std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal();
        Ok(Self {
            config,
            session,
            flow,
            http,
            plain,
        })
    }

    pub fn view(&self) -> TodoView {
        TodoView::new(if self.plain {
            Strikethrough::Plain
        } else {
            Strikethrough::Ansi
        })
    }
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli)?;
    match cli.command {
        Commands::Login(args) => auth::handle_login(&ctx, args.code.as_deref()).await,
        Commands::Logout => auth::handle_logout(&ctx),
        Commands::Status => auth::handle_status(&ctx),
        Commands::List => todos::handle_list(&ctx).await,
        Commands::Add(args) => todos::handle_add(&ctx, &args.title.join(" ")).await,
        Commands::Toggle(args) => todos::handle_toggle(&ctx, &args.todo).await,
        Commands::Delete(args) => todos::handle_delete(&ctx, &args.todo).await,
        Commands::Shell => todos::handle_shell(&ctx).await,
    }
}
