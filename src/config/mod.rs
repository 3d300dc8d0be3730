pub mod watch_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use watch_config::WatchConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "tasman-fare-watch")]
#[command(about = "Searches NZ-Australia fares once and emails the premium-cabin deals")]
pub struct CliConfig {
    /// TOML configuration file; without one, settings come from the environment
    #[arg(short, long, env = "FARE_WATCH_CONFIG")]
    pub config: Option<String>,

    /// Build the email but do not send it
    #[arg(long)]
    pub dry_run: bool,

    /// Also write fares.html and fares.csv into this directory
    #[arg(long)]
    pub report_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the file or environment settings, applies the flags on top and
    /// validates the result.
    pub fn load(&self) -> Result<WatchConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                WatchConfig::from_file(path)?
            }
            None => {
                tracing::info!("Loading configuration from the environment");
                WatchConfig::from_env()?
            }
        };

        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut WatchConfig) {
        if self.dry_run {
            config.dry_run = true;
            tracing::info!("🔧 Dry run enabled from the command line");
        }
        if let Some(dir) = &self.report_dir {
            config.report_dir = Some(dir.clone());
        }
    }
}
