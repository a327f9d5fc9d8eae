//! Platform API clients, used as the first (authenticated) fetch strategy
//! when a credential is configured.

pub mod eventbrite;
pub mod luma;

pub use eventbrite::EventbriteApiClient;
pub use luma::LumaApiClient;
