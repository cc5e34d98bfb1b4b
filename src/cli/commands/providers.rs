//! Arguments for the outbound providers. Every provider is optional; when
//! its credentials are absent the logging stand-in is used instead.

use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_RESEND_API_KEY: &str = "resend-api-key";
pub const ARG_EMAIL_FROM: &str = "email-from";
pub const ARG_META_ACCESS_TOKEN: &str = "meta-access-token";
pub const ARG_META_PAGE_ID: &str = "meta-page-id";
pub const ARG_INSTAGRAM_USER_ID: &str = "instagram-user-id";
pub const ARG_GEMINI_API_KEY: &str = "gemini-api-key";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RESEND_API_KEY)
                .long(ARG_RESEND_API_KEY)
                .help("Resend API key for outgoing email")
                .env("FIELDPOST_RESEND_API_KEY"),
        )
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("From address for outgoing email")
                .env("FIELDPOST_EMAIL_FROM")
                .default_value("Fieldpost <notifications@fieldpost.dev>"),
        )
        .arg(
            Arg::new(ARG_META_ACCESS_TOKEN)
                .long(ARG_META_ACCESS_TOKEN)
                .help("Meta Graph API page access token")
                .env("FIELDPOST_META_ACCESS_TOKEN"),
        )
        .arg(
            Arg::new(ARG_META_PAGE_ID)
                .long(ARG_META_PAGE_ID)
                .help("Facebook page id to publish to")
                .env("FIELDPOST_META_PAGE_ID"),
        )
        .arg(
            Arg::new(ARG_INSTAGRAM_USER_ID)
                .long(ARG_INSTAGRAM_USER_ID)
                .help("Instagram business account id to publish to")
                .env("FIELDPOST_INSTAGRAM_USER_ID"),
        )
        .arg(
            Arg::new(ARG_GEMINI_API_KEY)
                .long(ARG_GEMINI_API_KEY)
                .help("Gemini API key for post text generation")
                .env("FIELDPOST_GEMINI_API_KEY"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub resend_api_key: Option<SecretString>,
    pub email_from: String,
    pub meta_access_token: Option<SecretString>,
    pub meta_page_id: Option<String>,
    pub instagram_user_id: Option<String>,
    pub gemini_api_key: Option<SecretString>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            resend_api_key: matches
                .get_one::<String>(ARG_RESEND_API_KEY)
                .cloned()
                .map(SecretString::from),
            email_from: matches
                .get_one::<String>(ARG_EMAIL_FROM)
                .cloned()
                .unwrap_or_else(|| "Fieldpost <notifications@fieldpost.dev>".to_string()),
            meta_access_token: matches
                .get_one::<String>(ARG_META_ACCESS_TOKEN)
                .cloned()
                .map(SecretString::from),
            meta_page_id: matches.get_one::<String>(ARG_META_PAGE_ID).cloned(),
            instagram_user_id: matches.get_one::<String>(ARG_INSTAGRAM_USER_ID).cloned(),
            gemini_api_key: matches
                .get_one::<String>(ARG_GEMINI_API_KEY)
                .cloned()
                .map(SecretString::from),
        }
    }
}
