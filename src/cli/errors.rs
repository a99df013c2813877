//! CLI-specific error formatting for user-facing messages.

use crate::error::{RecoverySuggestion, TodoError};

/// Map a [`TodoError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &TodoError) -> String {
    match err {
        TodoError::MissingConfiguration { key } => format!(
            "Missing configuration '{key}'. Set it in config.toml or TODO_OIDC_{}",
            key.to_ascii_uppercase()
        ),
        other => match other.recovery_suggestion() {
            RecoverySuggestion::LogIn => format!("{other}. Run: todo-oidc login"),
            RecoverySuggestion::CheckConfiguration => {
                format!("{other}. Check config.toml or your TODO_OIDC_* variables")
            }
            _ => format!("{other}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;

    #[test]
    fn format_missing_configuration_names_env_var() {
        let err = TodoError::MissingConfiguration {
            key: "client_id".to_string(),
        };
        assert!(format_error_help(&err).contains("TODO_OIDC_CLIENT_ID"));
    }

    #[test]
    fn format_session_expired_includes_login_hint() {
        let help = format_error_help(&TodoError::SessionExpired);
        assert!(help.contains("todo-oidc login"));
    }

    #[test]
    fn format_not_logged_in_includes_login_hint() {
        let help = format_error_help(&TodoError::from(AuthError::NotLoggedIn));
        assert!(help.contains("todo-oidc login"));
    }

    #[test]
    fn format_other_error_falls_through_to_display() {
        let help = format_error_help(&TodoError::api(500, "boom"));
        assert_eq!(help, "API error (status 500): boom");
    }
}
