//! CLI todo command handlers and the interactive shell.

use tokio::io::{AsyncBufReadExt, BufReader};

use super::auth::authenticate;
use super::errors::format_error_help;
use super::Context;
use crate::app::TodoApp;
use crate::error::{Result, TodoError};

/// A user action against the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Add(String),
    Toggle(String),
    Delete(String),
}

/// A line typed into the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Action(Action),
    Help,
    Quit,
    Unknown(String),
}

const SHELL_HELP: &str = "\
Commands:
  list | ls              reload and show the list
  add <title>            add a todo
  toggle | done <n|id>   toggle completion
  delete | rm <n|id>     delete a todo
  help                   show this help
  quit | exit            leave the shell";

/// Parse one shell line. Blank lines yield `None`.
pub fn parse_shell_line(line: &str) -> Option<ShellCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match (word.to_ascii_lowercase().as_str(), rest.is_empty()) {
        ("list" | "ls", _) => ShellCommand::Action(Action::List),
        ("add", false) => ShellCommand::Action(Action::Add(rest.to_string())),
        ("toggle" | "done", false) => ShellCommand::Action(Action::Toggle(rest.to_string())),
        ("delete" | "rm", false) => ShellCommand::Action(Action::Delete(rest.to_string())),
        ("help" | "?", _) => ShellCommand::Help,
        ("quit" | "exit" | "q", _) => ShellCommand::Quit,
        _ => ShellCommand::Unknown(line.to_string()),
    };
    Some(command)
}

async fn open_app(ctx: &Context) -> Result<TodoApp> {
    authenticate(ctx).await?;
    Ok(TodoApp::new(
        ctx.session.clone(),
        ctx.config.todo_client(ctx.http.clone()),
        ctx.view(),
    ))
}

/// Apply an action and return a status line for it.
pub async fn perform(app: &mut TodoApp, action: &Action) -> Result<Option<String>> {
    match action {
        Action::List => {
            app.refresh().await?;
            Ok(None)
        }
        Action::Add(title) => {
            let created = app.add(title).await?;
            Ok(Some(format!("Added \"{}\"", created.title)))
        }
        Action::Toggle(selector) => {
            let updated = app.toggle(selector).await?;
            let state = if updated.is_completed() { "done" } else { "pending" };
            Ok(Some(format!("\"{}\" is now {state}", updated.title)))
        }
        Action::Delete(selector) => {
            let removed = app.delete(selector).await?;
            Ok(Some(format!("Deleted \"{}\"", removed.title)))
        }
    }
}

/// Send the user through login again. The failed action is not retried.
async fn relogin(ctx: &Context) {
    eprintln!("Your session has expired. Please log in again.");
    if let Err(err) = authenticate(ctx).await {
        tracing::error!(error = %err, "re-login failed");
    }
}

/// Log an action failure; after a 401 send the user through login again.
async fn report(ctx: &Context, err: &TodoError) {
    tracing::error!(error = %err, "action failed");
    eprintln!("{}", format_error_help(err));
    if err.requires_login() {
        relogin(ctx).await;
    }
}

async fn run_once(ctx: &Context, action: Action) -> Result<()> {
    let mut app = open_app(ctx).await?;
    let result = async {
        app.refresh().await?;
        if action != Action::List {
            if let Some(message) = perform(&mut app, &action).await? {
                println!("{message}");
            }
        }
        Ok::<(), TodoError>(())
    }
    .await;
    match result {
        Ok(()) => {
            print!("{}", app.view().render());
            Ok(())
        }
        Err(err) => {
            if err.requires_login() {
                relogin(ctx).await;
            }
            Err(err)
        }
    }
}

/// Handle `todo-oidc list`.
pub async fn handle_list(ctx: &Context) -> Result<()> {
    run_once(ctx, Action::List).await
}

/// Handle `todo-oidc add`.
pub async fn handle_add(ctx: &Context, title: &str) -> Result<()> {
    run_once(ctx, Action::Add(title.to_string())).await
}

/// Handle `todo-oidc toggle`.
pub async fn handle_toggle(ctx: &Context, selector: &str) -> Result<()> {
    run_once(ctx, Action::Toggle(selector.to_string())).await
}

/// Handle `todo-oidc delete`.
pub async fn handle_delete(ctx: &Context, selector: &str) -> Result<()> {
    run_once(ctx, Action::Delete(selector.to_string())).await
}

/// Handle `todo-oidc shell`.
pub async fn handle_shell(ctx: &Context) -> Result<()> {
    let mut app = open_app(ctx).await?;
    match app.refresh().await {
        Ok(view) => print!("{}", view.render()),
        Err(err) => report(ctx, &err).await,
    }
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = parse_shell_line(&line) else {
            continue;
        };
        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => println!("{SHELL_HELP}"),
            ShellCommand::Unknown(input) => println!("Unknown command: {input} (try `help`)"),
            ShellCommand::Action(action) => match perform(&mut app, &action).await {
                Ok(message) => {
                    if let Some(message) = message {
                        println!("{message}");
                    }
                    print!("{}", app.view().render());
                }
                Err(err) => report(ctx, &err).await,
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions_with_arguments() {
        assert_eq!(
            parse_shell_line("add   Buy milk  "),
            Some(ShellCommand::Action(Action::Add("Buy milk".to_string())))
        );
        assert_eq!(
            parse_shell_line("done 2"),
            Some(ShellCommand::Action(Action::Toggle("2".to_string())))
        );
        assert_eq!(
            parse_shell_line("RM abc"),
            Some(ShellCommand::Action(Action::Delete("abc".to_string())))
        );
        assert_eq!(parse_shell_line("ls"), Some(ShellCommand::Action(Action::List)));
    }

    #[test]
    fn actions_without_required_argument_are_unknown() {
        assert_eq!(
            parse_shell_line("add"),
            Some(ShellCommand::Unknown("add".to_string()))
        );
    }

    #[test]
    fn blank_and_control_lines() {
        assert_eq!(parse_shell_line("   "), None);
        assert_eq!(parse_shell_line("quit"), Some(ShellCommand::Quit));
        assert_eq!(parse_shell_line("?"), Some(ShellCommand::Help));
    }
}
