use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::info;

/// Performs one relay for the signer selected in a round
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RelayExecutor: Send + Sync {
    async fn execute(&self, signer_id: &str, round: u64) -> eyre::Result<()>;
}

/// Executor that only records the relay it would have made
#[derive(Debug, Default)]
pub struct LogExecutor;

#[async_trait]
impl RelayExecutor for LogExecutor {
    async fn execute(&self, signer_id: &str, round: u64) -> eyre::Result<()> {
        info!(round, signer_id, "relay");
        Ok(())
    }
}
