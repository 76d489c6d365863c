pub mod analytics;
pub mod app_config;
pub mod config;

pub use analytics::{
    AnalyticsBundle, DemographicCategory, DemographicEntry, DemographicsRecord, DiscoveryRecord,
    TopPostRecord,
};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
