//! Outbound dependencies behind trait seams: email, social publishing,
//! draft generation, and bot detection. Each has a production adapter and a
//! log/dev adapter so the service runs end to end without credentials.

pub mod botid;
pub mod generate;
pub mod notify;
pub mod social;

pub use botid::{BotDetector, BotVerdict, NoopBotDetector, UserAgentBotDetector};
pub use generate::{GeminiGenerator, PostGenerator, TemplateGenerator};
pub use notify::{LogNotifier, Notifier, ResendNotifier};
pub use social::{LogPublisher, MetaPublisher, SocialPublisher};
