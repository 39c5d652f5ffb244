use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ENV_DEVELOPMENT_SHORT_NAME | ENV_DEVELOPMENT_NAME => Ok(Environment::Development),
            ENV_STAGING_SHORT_NAME | ENV_STAGING_NAME => Ok(Environment::Staging),
            ENV_PRODUCTION_SHORT_NAME | ENV_PRODUCTION_NAME => Ok(Environment::Production),
            _ => Err(eyre::eyre!(
                "Invalid environment {s}, must be one of: {ENV_DEVELOPMENT_NAME}, {ENV_STAGING_NAME}, {ENV_PRODUCTION_NAME}",
            )),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = eyre::Report;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "{ENV_DEVELOPMENT_NAME}"),
            Environment::Staging => write!(f, "{ENV_STAGING_NAME}"),
            Environment::Production => write!(f, "{ENV_PRODUCTION_NAME}"),
        }
    }
}

impl Environment {
    /// Read the environment from `RELAYER_ENVIRONMENT`, if set
    pub fn from_env() -> eyre::Result<Option<Environment>> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => Ok(Some(value.parse()?)),
            Err(_) => Ok(None),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}
