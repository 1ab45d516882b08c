pub mod config;
pub mod session;
pub mod subscriber;

pub use config::FeedClientConfig;
pub use session::{FlashDirection, SessionState};
pub use subscriber::{FeedSubscriber, FeedSubscriberHandle};
