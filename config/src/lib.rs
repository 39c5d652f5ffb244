//! Relayer configuration: deployment environment and the `relayer.yml` file

pub mod constants;
mod env;
mod relayer;

pub use env::Environment;
pub use relayer::{config_path, RelayerConfig, RobinConfig, RunnerConfig};
