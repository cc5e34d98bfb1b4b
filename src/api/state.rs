//! Shared application state, built once by the server action and injected
//! into handlers as an `Extension`.

use crate::auth::{rate_limit::RateLimiter, session::SessionCodec};
use crate::config::{AppConfig, RoleDirectory};
use crate::outbound::{BotDetector, Notifier, PostGenerator, SocialPublisher};
use crate::store::Store;
use std::sync::Arc;

pub struct AppState {
    config: AppConfig,
    roles: RoleDirectory,
    codec: SessionCodec,
    store: Arc<dyn Store>,
    rate_limiter: RateLimiter,
    notifier: Arc<dyn Notifier>,
    publisher: Arc<dyn SocialPublisher>,
    generator: Arc<dyn PostGenerator>,
    bot_detector: Arc<dyn BotDetector>,
}

impl AppState {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        roles: RoleDirectory,
        codec: SessionCodec,
        store: Arc<dyn Store>,
        rate_limiter: RateLimiter,
        notifier: Arc<dyn Notifier>,
        publisher: Arc<dyn SocialPublisher>,
        generator: Arc<dyn PostGenerator>,
        bot_detector: Arc<dyn BotDetector>,
    ) -> Self {
        Self {
            config,
            roles,
            codec,
            store,
            rate_limiter,
            notifier,
            publisher,
            generator,
            bot_detector,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn roles(&self) -> &RoleDirectory {
        &self.roles
    }

    #[must_use]
    pub const fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    #[must_use]
    pub fn publisher(&self) -> &dyn SocialPublisher {
        self.publisher.as_ref()
    }

    #[must_use]
    pub fn generator(&self) -> &dyn PostGenerator {
        self.generator.as_ref()
    }

    #[must_use]
    pub fn bot_detector(&self) -> &dyn BotDetector {
        self.bot_detector.as_ref()
    }
}
