use crate::executor::RelayExecutor;
use backon::{ExponentialBuilder, Retryable};
use relayer_config::RunnerConfig;
use relayer_robin::{RoundRobin, Snapshot};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one dispatched round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub round: u64,
    pub signer_id: String,
    pub relayed: bool,
}

/// Drives the round-robin: relays with the current signer, then signals the advance.
pub struct Dispatcher<E: RelayExecutor> {
    robin: Arc<RoundRobin>,
    ack: mpsc::Sender<()>,
    executor: E,
    runner: RunnerConfig,
    snapshots: watch::Receiver<Snapshot>,
}

impl<E: RelayExecutor> Dispatcher<E> {
    pub fn new(
        robin: Arc<RoundRobin>,
        ack: mpsc::Sender<()>,
        executor: E,
        runner: RunnerConfig,
    ) -> Self {
        let snapshots = robin.subscribe();
        Self {
            robin,
            ack,
            executor,
            runner,
            snapshots,
        }
    }

    /// Relay once with the current signer and close the round.
    ///
    /// The advance is signalled whether or not the relay succeeded, so a failing
    /// signer never holds the rotation.
    pub async fn dispatch_once(&mut self) -> eyre::Result<Dispatch> {
        let Snapshot { round, current } = self.snapshots.borrow_and_update().clone();
        let signer_id = current.ok_or_else(|| eyre::eyre!("No signer selected"))?;

        let executor = &self.executor;
        let timeout = self.runner.timeout();
        let relay = || async {
            match tokio::time::timeout(timeout, executor.execute(&signer_id, round)).await {
                Ok(result) => result,
                Err(_) => Err(eyre::eyre!("Relay timed out after {timeout:?}")),
            }
        };

        let builder = ExponentialBuilder::default()
            .with_min_delay(self.runner.retry_delay())
            .with_max_times(self.runner.attempts.saturating_sub(1));

        let result = relay
            .retry(builder)
            .notify(|err: &eyre::Report, dur: Duration| {
                warn!(round, signer_id = %signer_id, "relay failed, retrying in {dur:?}: {err}");
            })
            .await;

        let relayed = match result {
            Ok(()) => {
                metrics::counter!("relayer_dispatch_total", "status" => "ok").increment(1);
                debug!(round, signer_id = %signer_id, "relayed");
                true
            }
            Err(err) => {
                metrics::counter!("relayer_dispatch_total", "status" => "error").increment(1);
                warn!(round, signer_id = %signer_id, "relay failed: {err}");
                false
            }
        };

        self.ack
            .send(())
            .await
            .map_err(|_| eyre::eyre!("Round-robin advance channel closed"))?;

        let advanced = tokio::time::timeout(
            self.runner.timeout(),
            self.snapshots.wait_for(|snapshot| snapshot.round != round),
        )
        .await
        .map(|changed| changed.is_ok());

        match advanced {
            Ok(true) => {}
            Ok(false) => eyre::bail!("Round-robin scheduler dropped"),
            Err(_) => warn!(
                round,
                running = self.robin.is_running(),
                "round did not advance in time"
            ),
        }

        Ok(Dispatch {
            round,
            signer_id,
            relayed,
        })
    }

    /// Dispatch on every interval tick until cancelled or `rounds` dispatches are done.
    ///
    /// Returns the number of dispatched rounds.
    pub async fn run(
        &mut self,
        shutdown: CancellationToken,
        rounds: Option<u64>,
    ) -> eyre::Result<u64> {
        let mut ticker = tokio::time::interval(self.runner.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(signers = self.robin.len(), "starting dispatcher");

        let mut dispatched = 0;
        loop {
            if rounds.is_some_and(|limit| dispatched >= limit) {
                info!(dispatched, "round limit reached");
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(dispatched, "stopping dispatcher");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let dispatch = self.dispatch_once().await?;
            dispatched += 1;

            info!(
                round = dispatch.round,
                signer_id = %dispatch.signer_id,
                relayed = dispatch.relayed,
                "dispatched"
            );
        }

        Ok(dispatched)
    }
}
