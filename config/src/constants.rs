// Environment names
pub const ENV_DEVELOPMENT_NAME: &str = "development";
pub const ENV_DEVELOPMENT_SHORT_NAME: &str = "dev";
pub const ENV_STAGING_NAME: &str = "staging";
pub const ENV_STAGING_SHORT_NAME: &str = "stg";
pub const ENV_PRODUCTION_NAME: &str = "production";
pub const ENV_PRODUCTION_SHORT_NAME: &str = "prod";

// Environment variables overriding the config file
pub const CONFIG_FILE_VAR: &str = "RELAYER_CONFIG_FILE";
pub const LOG_LEVEL_VAR: &str = "RELAYER_LOG_LEVEL";
pub const ENVIRONMENT_VAR: &str = "RELAYER_ENVIRONMENT";

pub const DEFAULT_CONFIG_FILE: &str = "relayer.yml";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Runner defaults
pub const DEFAULT_ATTEMPTS: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

// Capacity of the advance channel between the dispatcher and the scheduler
pub const DEFAULT_ADVANCE_BUFFER: usize = 16;
