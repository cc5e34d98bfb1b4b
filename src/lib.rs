//! # Fieldpost
//!
//! `fieldpost` turns field notes from team members into reviewed, approved
//! social media posts. Team members submit notes and photos, a generated
//! draft goes to the PRO for editing, leaders approve or reject, and the
//! final text is published to Facebook and Instagram.
//!
//! ## Access Model
//!
//! Three roles (`team_member`, `pro`, `leader`) are assigned from
//! configuration, never from request data. Sessions are stateless
//! HMAC-signed tokens carried in a cookie or bearer header. Every
//! submission operation checks ownership or role before touching storage.
//!
//! ## Authentication
//!
//! Sign-in is passwordless by default: a one-time code is mailed as a magic
//! link and redeemed exactly once. The PRO can also sign in with a bcrypt
//! password, and the review dashboard has its own shared secret.

pub mod api;
pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod store;
pub mod validation;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
