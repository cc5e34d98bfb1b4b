//! Runtime configuration, parsed once at startup.

use crate::domain::Role;
use secrecy::SecretString;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Service configuration. Built once by the server action and shared through
/// the application state; handlers never read environment variables.
#[derive(Debug)]
pub struct AppConfig {
    environment: Environment,
    frontend_base_url: String,
    session_secret: SecretString,
    session_ttl_seconds: i64,
    code_ttl_seconds: i64,
    pro_email: String,
    pro_password_hash: Option<SecretString>,
    dashboard_password: Option<SecretString>,
    session_cookie_secure: bool,
}

impl AppConfig {
    #[must_use]
    pub fn new(
        environment: Environment,
        frontend_base_url: String,
        session_secret: SecretString,
        pro_email: String,
    ) -> Self {
        Self {
            environment,
            frontend_base_url,
            session_secret,
            session_ttl_seconds: 60 * 60 * 8,
            code_ttl_seconds: 60 * 60 * 4,
            pro_email,
            pro_password_hash: None,
            dashboard_password: None,
            session_cookie_secure: environment.is_production(),
        }
    }

    #[must_use]
    pub const fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_pro_password_hash(mut self, hash: Option<SecretString>) -> Self {
        self.pro_password_hash = hash;
        self
    }

    #[must_use]
    pub fn with_dashboard_password(mut self, password: Option<SecretString>) -> Self {
        self.dashboard_password = password;
        self
    }

    #[must_use]
    pub const fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }

    #[must_use]
    pub const fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub const fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    #[must_use]
    pub fn pro_email(&self) -> &str {
        &self.pro_email
    }

    #[must_use]
    pub const fn pro_password_hash(&self) -> Option<&SecretString> {
        self.pro_password_hash.as_ref()
    }

    #[must_use]
    pub const fn dashboard_password(&self) -> Option<&SecretString> {
        self.dashboard_password.as_ref()
    }

    #[must_use]
    pub const fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }
}

/// Role membership, loaded from the comma-separated allow-lists at startup.
///
/// List entries are trimmed when the directory is built. The candidate email
/// checked at request time is compared exactly as received; an address with
/// stray whitespace does not match.
#[derive(Debug)]
pub struct RoleDirectory {
    team_member_emails: Vec<String>,
    leader_emails: Vec<String>,
    pro_email: String,
}

impl RoleDirectory {
    #[must_use]
    pub fn new(team_members: &str, leaders: &str, pro_email: String) -> Self {
        Self {
            team_member_emails: split_list(team_members),
            leader_emails: split_list(leaders),
            pro_email,
        }
    }

    #[must_use]
    pub fn allowed(&self, email: &str, role: Role) -> bool {
        match role {
            Role::TeamMember => self.team_member_emails.iter().any(|entry| entry == email),
            Role::Leader => self.leader_emails.iter().any(|entry| entry == email),
            Role::Pro => self.pro_email == email,
        }
    }

    /// All leader addresses, for approval notifications.
    #[must_use]
    pub fn leader_emails(&self) -> &[String] {
        &self.leader_emails
    }

    /// The leader address that receives the one-time code: the first entry.
    #[must_use]
    pub fn primary_leader_email(&self) -> Option<&str> {
        self.leader_emails.first().map(String::as_str)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn directory() -> RoleDirectory {
        RoleDirectory::new(
            "alice@example.com, bob@example.com",
            "lead@example.com,second@example.com",
            "pro@example.com".to_string(),
        )
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(Environment::from_str("dev"), Ok(Environment::Development));
        assert_eq!(Environment::from_str("prod"), Ok(Environment::Production));
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn list_entries_are_trimmed_at_load() {
        let dir = directory();
        assert!(dir.allowed("bob@example.com", Role::TeamMember));
        assert!(dir.allowed("second@example.com", Role::Leader));
    }

    #[test]
    fn candidate_email_is_not_trimmed() {
        let dir = directory();
        assert!(dir.allowed("alice@example.com", Role::TeamMember));
        assert!(!dir.allowed(" alice@example.com", Role::TeamMember));
        assert!(!dir.allowed("alice@example.com ", Role::TeamMember));
        assert!(!dir.allowed("alice@example.com\n", Role::TeamMember));
    }

    #[test]
    fn roles_do_not_bleed_into_each_other() {
        let dir = directory();
        assert!(!dir.allowed("alice@example.com", Role::Leader));
        assert!(!dir.allowed("lead@example.com", Role::TeamMember));
        assert!(dir.allowed("pro@example.com", Role::Pro));
        assert!(!dir.allowed("pro@example.com", Role::Leader));
    }

    #[test]
    fn primary_leader_is_first_entry() {
        assert_eq!(directory().primary_leader_email(), Some("lead@example.com"));
        let empty = RoleDirectory::new("", "", "pro@example.com".to_string());
        assert_eq!(empty.primary_leader_email(), None);
    }

    #[test]
    fn config_builder_defaults() {
        let config = AppConfig::new(
            Environment::Development,
            "http://localhost:3000".to_string(),
            SecretString::from("secret"),
            "pro@example.com".to_string(),
        );
        assert_eq!(config.session_ttl_seconds(), 60 * 60 * 8);
        assert_eq!(config.code_ttl_seconds(), 60 * 60 * 4);
        assert!(!config.session_cookie_secure());
        assert!(config.pro_password_hash().is_none());
    }
}
