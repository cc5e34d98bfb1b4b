//! Request-time bot screening for login endpoints.
//!
//! This is a cheap first gate, not an oracle: it only flags requests that
//! are obviously automated, and any classification doubt resolves to
//! `Human` so real users are never locked out by the detector itself.

use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotVerdict {
    Human,
    Bot,
}

pub trait BotDetector: Send + Sync {
    fn classify(&self, headers: &HeaderMap) -> BotVerdict;
}

/// Passes everything; used in tests and when screening is disabled.
pub struct NoopBotDetector;

impl BotDetector for NoopBotDetector {
    fn classify(&self, _headers: &HeaderMap) -> BotVerdict {
        BotVerdict::Human
    }
}

const BOT_MARKERS: &[&str] = &[
    "bot", "crawler", "spider", "curl/", "wget/", "python-requests", "go-http-client", "scrapy",
];

/// Flags missing user agents and well-known automation strings.
pub struct UserAgentBotDetector;

impl BotDetector for UserAgentBotDetector {
    fn classify(&self, headers: &HeaderMap) -> BotVerdict {
        let Some(value) = headers.get(USER_AGENT) else {
            return BotVerdict::Bot;
        };
        // Undecodable header bytes resolve to Human, not Bot.
        let Ok(agent) = value.to_str() else {
            return BotVerdict::Human;
        };
        let agent = agent.to_lowercase();
        if agent.trim().is_empty() || BOT_MARKERS.iter().any(|marker| agent.contains(marker)) {
            BotVerdict::Bot
        } else {
            BotVerdict::Human
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_agent(agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(agent) {
            headers.insert(USER_AGENT, value);
        }
        headers
    }

    #[test]
    fn missing_user_agent_is_a_bot() {
        assert_eq!(
            UserAgentBotDetector.classify(&HeaderMap::new()),
            BotVerdict::Bot
        );
    }

    #[test]
    fn automation_strings_are_bots() {
        for agent in ["curl/8.0", "Googlebot/2.1", "python-requests/2.31", ""] {
            assert_eq!(
                UserAgentBotDetector.classify(&headers_with_agent(agent)),
                BotVerdict::Bot,
                "agent {agent:?} should be flagged"
            );
        }
    }

    #[test]
    fn browsers_pass() {
        let agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
        assert_eq!(
            UserAgentBotDetector.classify(&headers_with_agent(agent)),
            BotVerdict::Human
        );
    }

    #[test]
    fn noop_always_passes() {
        assert_eq!(
            NoopBotDetector.classify(&HeaderMap::new()),
            BotVerdict::Human
        );
    }
}
