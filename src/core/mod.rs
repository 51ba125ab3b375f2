//! Core types shared across Stagetrack.
//!
//! Configuration and the in-process notification bus used by the store and
//! the router.

mod config;
pub mod events;

pub use config::{Config, DisplayConfig, GeneralConfig, RefreshConfig, LOCAL_CONFIG_FILE};
pub use events::{EventBus, Notification, Subscription, DATA_CHANGED, ROUTE_CHANGED};
