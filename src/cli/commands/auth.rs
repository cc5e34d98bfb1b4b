use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_CODE_TTL_SECONDS: &str = "code-ttl-seconds";
pub const ARG_PRO_EMAIL: &str = "pro-email";
pub const ARG_PRO_PASSWORD_HASH: &str = "pro-password-hash";
pub const ARG_DASHBOARD_PASSWORD: &str = "dashboard-password";
pub const ARG_TEAM_MEMBER_EMAILS: &str = "team-member-emails";
pub const ARG_LEADER_EMAILS: &str = "leader-emails";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_role_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("HMAC key for signing session tokens")
                .env("FIELDPOST_SESSION_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("FIELDPOST_SESSION_TTL_SECONDS")
                .default_value("28800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_CODE_TTL_SECONDS)
                .long(ARG_CODE_TTL_SECONDS)
                .help("One-time login code TTL in seconds")
                .env("FIELDPOST_CODE_TTL_SECONDS")
                .default_value("14400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for magic links and CORS")
                .env("FIELDPOST_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
}

fn with_role_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PRO_EMAIL)
                .long(ARG_PRO_EMAIL)
                .help("Email address of the PRO reviewer")
                .env("FIELDPOST_PRO_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PRO_PASSWORD_HASH)
                .long(ARG_PRO_PASSWORD_HASH)
                .help("Bcrypt hash for the PRO password login")
                .env("FIELDPOST_PRO_PASSWORD_HASH"),
        )
        .arg(
            Arg::new(ARG_DASHBOARD_PASSWORD)
                .long(ARG_DASHBOARD_PASSWORD)
                .help("Shared secret for the review dashboard")
                .env("FIELDPOST_DASHBOARD_PASSWORD"),
        )
        .arg(
            Arg::new(ARG_TEAM_MEMBER_EMAILS)
                .long(ARG_TEAM_MEMBER_EMAILS)
                .help("Comma-separated list of team member email addresses")
                .env("FIELDPOST_TEAM_MEMBER_EMAILS")
                .default_value(""),
        )
        .arg(
            Arg::new(ARG_LEADER_EMAILS)
                .long(ARG_LEADER_EMAILS)
                .help("Comma-separated list of leader email addresses")
                .env("FIELDPOST_LEADER_EMAILS")
                .default_value(""),
        )
}

#[derive(Debug)]
pub struct Options {
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub code_ttl_seconds: i64,
    pub frontend_base_url: String,
    pub pro_email: String,
    pub pro_password_hash: Option<SecretString>,
    pub dashboard_password: Option<SecretString>,
    pub team_member_emails: String,
    pub leader_emails: String,
}

impl Options {
    /// Collect the auth arguments from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let session_secret = matches
            .get_one::<String>(ARG_SESSION_SECRET)
            .cloned()
            .context("missing required argument: --session-secret")?;
        let pro_email = matches
            .get_one::<String>(ARG_PRO_EMAIL)
            .cloned()
            .context("missing required argument: --pro-email")?;

        Ok(Self {
            session_secret: SecretString::from(session_secret),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(28_800),
            code_ttl_seconds: matches
                .get_one::<i64>(ARG_CODE_TTL_SECONDS)
                .copied()
                .unwrap_or(14_400),
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            pro_email,
            pro_password_hash: matches
                .get_one::<String>(ARG_PRO_PASSWORD_HASH)
                .cloned()
                .map(SecretString::from),
            dashboard_password: matches
                .get_one::<String>(ARG_DASHBOARD_PASSWORD)
                .cloned()
                .map(SecretString::from),
            team_member_emails: matches
                .get_one::<String>(ARG_TEAM_MEMBER_EMAILS)
                .cloned()
                .unwrap_or_default(),
            leader_emails: matches
                .get_one::<String>(ARG_LEADER_EMAILS)
                .cloned()
                .unwrap_or_default(),
        })
    }
}
