pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, LogFormat};

pub use adapters::{amadeus::AmadeusClient, brevo::BrevoNotifier, storage::LocalStorage};
pub use config::watch_config::WatchConfig;
pub use core::engine::{RunSettings, WatchEngine};
pub use domain::model::RunOutcome;
pub use utils::error::{Result, WatchError};
