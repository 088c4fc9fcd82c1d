use std::sync::Arc;

use log::info;

/// Tracker config and logger setup
pub mod config;
/// The tracked record
pub mod message;
/// Bounded recency tracker
pub mod tracker;
mod tests;

pub use config::{ConfigError, TrackerConfig};
pub use message::Message;
pub use tracker::{AddOutcome, MessageTracker, RecencyTracker, SharedMessageTracker, TrackerError};

/// Create a shared tracker from a config, starting its logger if one is configured
pub fn create_tracker(config: &TrackerConfig) -> Result<SharedMessageTracker, ConfigError> {
    let capacity = config.validated_capacity()?;

    if let Some(log) = &config.log {
        log.init()?;
    }

    info!("Tracking up to {} messages", capacity);
    Ok(Arc::new(RecencyTracker::new(capacity)))
}
