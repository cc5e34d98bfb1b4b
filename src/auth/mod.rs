//! Authentication and authorization building blocks: signed sessions,
//! one-time codes, role/ownership guards, and the rate limiter.

pub mod guard;
pub mod identity;
pub mod rate_limit;
pub mod session;
