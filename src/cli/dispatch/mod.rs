//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{self, auth, providers};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let dsn = matches.get_one::<String>(commands::ARG_DSN).cloned();

    // Validate the environment and its storage requirements
    commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;
    let environment = commands::environment(matches).map_err(|e| anyhow::anyhow!(e))?;

    let auth_opts = auth::Options::parse(matches)?;
    let provider_opts = providers::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        environment,
        session_secret: auth_opts.session_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        code_ttl_seconds: auth_opts.code_ttl_seconds,
        frontend_base_url: auth_opts.frontend_base_url,
        pro_email: auth_opts.pro_email,
        pro_password_hash: auth_opts.pro_password_hash,
        dashboard_password: auth_opts.dashboard_password,
        team_member_emails: auth_opts.team_member_emails,
        leader_emails: auth_opts.leader_emails,
        resend_api_key: provider_opts.resend_api_key,
        email_from: provider_opts.email_from,
        meta_access_token: provider_opts.meta_access_token,
        meta_page_id: provider_opts.meta_page_id,
        instagram_user_id: provider_opts.instagram_user_id,
        gemini_api_key: provider_opts.gemini_api_key,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn production_without_dsn_is_rejected() {
        temp_env::with_vars(
            [
                ("FIELDPOST_DSN", None::<&str>),
                ("FIELDPOST_ENVIRONMENT", Some("production")),
                ("FIELDPOST_SESSION_SECRET", Some("sekret")),
                ("FIELDPOST_PRO_EMAIL", Some("pro@example.com")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["fieldpost"]);
                let result = handler(&matches);
                assert!(result.is_err());
                if let Err(err) = result {
                    assert!(err.to_string().contains("--dsn"));
                }
            },
        );
    }

    #[test]
    fn development_defaults_build_a_server_action() {
        temp_env::with_vars(
            [
                ("FIELDPOST_DSN", None::<&str>),
                ("FIELDPOST_ENVIRONMENT", None::<&str>),
                ("FIELDPOST_SESSION_SECRET", Some("sekret")),
                ("FIELDPOST_PRO_EMAIL", Some("pro@example.com")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["fieldpost"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.environment, Environment::Development);
                    assert_eq!(args.pro_email, "pro@example.com");
                    assert!(args.dsn.is_none());
                    assert_eq!(args.session_ttl_seconds, 28_800);
                    assert_eq!(args.code_ttl_seconds, 14_400);
                    assert_eq!(args.frontend_base_url, "http://localhost:3000");
                }
            },
        );
    }
}
