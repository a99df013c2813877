//! todo-oidc CLI binary entry point.

use todo_oidc::cli::{self, errors::format_error_help, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    cli::init_tracing(cli.log_directive());

    if let Err(e) = cli::run(cli).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {}", format_error_help(&e));
        std::process::exit(1);
    }
}
