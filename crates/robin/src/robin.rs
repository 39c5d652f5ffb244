//! Round-robin scheduler driven by an external advance signal

use crate::{
    participant::{Participant, ScoreSeed},
    rotation::{Rotation, Snapshot},
    Result,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Construction options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RobinOptions {
    pub seed: ScoreSeed,
}

struct State {
    rotation: Rotation,
    running: bool,
    shutdown: CancellationToken,
}

struct Shared {
    state: Mutex<State>,
    // Handed from one control task to the next across stop/start cycles
    signals: tokio::sync::Mutex<mpsc::Receiver<()>>,
    snapshots: watch::Sender<Snapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, rotation: &Rotation) {
        self.snapshots.send_replace(rotation.snapshot());
    }

    fn advance(&self) {
        let mut state = self.lock();
        let rotation = &mut state.rotation;

        debug!(
            round = rotation.round(),
            current_id = rotation.current_id().unwrap_or_default(),
            "finishing"
        );

        let leveled = rotation.advance();
        metrics::counter!("robin_rounds_total").increment(1);
        if leveled {
            metrics::counter!("robin_score_resets_total").increment(1);
        }

        debug!(
            round = rotation.round(),
            current_id = rotation.current_id().unwrap_or_default(),
            leveled,
            "starting"
        );

        self.publish(rotation);
    }

    fn context(&self) -> (u64, String) {
        let state = self.lock();
        (
            state.rotation.round(),
            state.rotation.current_id().unwrap_or_default().to_string(),
        )
    }
}

/// Selects which participant is active and rotates on every advance signal.
///
/// Each signal received on the advance channel closes one round: the current
/// participant is penalized by [`crate::PRIORITY_DELTA`], the highest scoring one
/// becomes current, and once every `len()` rounds all scores are leveled back to
/// their seeds. All operations serialize through one lock.
///
/// Dropping the scheduler stops its control task.
pub struct RoundRobin {
    shared: Arc<Shared>,
}

impl RoundRobin {
    pub fn new(
        advance: mpsc::Receiver<()>,
        participants: impl IntoIterator<Item = Arc<dyn Participant>>,
    ) -> Result<Self> {
        Self::with_options(advance, participants, RobinOptions::default())
    }

    pub fn with_options(
        advance: mpsc::Receiver<()>,
        participants: impl IntoIterator<Item = Arc<dyn Participant>>,
        options: RobinOptions,
    ) -> Result<Self> {
        let rotation = Rotation::new(participants, options.seed)?;
        let (snapshots, _) = watch::channel(rotation.snapshot());

        metrics::gauge!("robin_participants").set(rotation.len() as f64);

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    rotation,
                    running: false,
                    shutdown: CancellationToken::new(),
                }),
                signals: tokio::sync::Mutex::new(advance),
                snapshots,
            }),
        })
    }

    /// Select the initial participant and spawn the control task.
    ///
    /// A no-op when already running. That includes a control task that exited because
    /// the advance source closed: call `stop` first.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn start(&self) {
        let shutdown = {
            let mut state = self.shared.lock();
            if state.running {
                warn!(
                    round = state.rotation.round(),
                    current_id = state.rotation.current_id().unwrap_or_default(),
                    "is already running"
                );
                return;
            }

            state.running = true;
            state.rotation.select();
            self.shared.publish(&state.rotation);
            state.shutdown.clone()
        };

        tokio::spawn(
            control_loop(self.shared.clone(), shutdown).instrument(info_span!("round-robin")),
        );
    }

    /// Cancel the control task. A no-op when not running.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if !state.running {
            warn!(
                round = state.rotation.round(),
                current_id = state.rotation.current_id().unwrap_or_default(),
                "is not running"
            );
            return;
        }

        state.shutdown.cancel();
        state.shutdown = CancellationToken::new();
        state.running = false;
    }

    /// Zero the round counter and restore seeded scores, keeping the current participant
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        state.rotation.reset();
        self.shared.publish(&state.rotation);

        info!(
            current_id = state.rotation.current_id().unwrap_or_default(),
            "reset scores"
        );
    }

    pub fn add(&self, participant: Arc<dyn Participant>) -> Result<()> {
        let mut state = self.shared.lock();
        let id = participant.id().to_string();
        state.rotation.add(participant)?;

        metrics::gauge!("robin_participants").set(state.rotation.len() as f64);
        info!(
            round = state.rotation.round(),
            participant_id = %id,
            score = ?state.rotation.score(&id),
            "added participant"
        );
        Ok(())
    }

    /// Remove a participant by id. The current participant cannot be removed.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut state = self.shared.lock();
        if state.rotation.remove(id)? {
            metrics::gauge!("robin_participants").set(state.rotation.len() as f64);
            info!(
                round = state.rotation.round(),
                participant_id = id,
                "removed participant"
            );
        } else {
            debug!(participant_id = id, "remove of unknown participant ignored");
        }
        Ok(())
    }

    /// Overwrite a participant's score
    pub fn update(&self, id: &str, score: i64) -> Result<()> {
        let mut state = self.shared.lock();
        state.rotation.update(id, score)?;

        debug!(participant_id = id, score, "updated score");
        Ok(())
    }

    /// Currently selected participant, `None` until `start` or while the set is empty
    pub fn current(&self) -> Option<Arc<dyn Participant>> {
        self.shared.lock().rotation.current().cloned()
    }

    pub fn round(&self) -> u64 {
        self.shared.lock().rotation.round()
    }

    /// True between `start` and `stop`, even after the advance source has closed
    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn len(&self) -> usize {
        self.shared.lock().rotation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().rotation.is_empty()
    }

    /// Scores in insertion order
    pub fn scores(&self) -> Vec<(String, i64)> {
        self.shared.lock().rotation.scores()
    }

    /// Watch round and current participant changes
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.snapshots.subscribe()
    }
}

impl Drop for RoundRobin {
    fn drop(&mut self) {
        self.shared.lock().shutdown.cancel();
    }
}

async fn control_loop(shared: Arc<Shared>, shutdown: CancellationToken) {
    let (round, current_id) = shared.context();
    info!(round, current_id = %current_id, "starting service");

    let mut signals = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            let (round, current_id) = shared.context();
            info!(round, current_id = %current_id, "stopping service");
            return;
        }
        signals = shared.signals.lock() => signals,
    };

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                let (round, current_id) = shared.context();
                info!(round, current_id = %current_id, "stopping service");
                break;
            }
            signal = signals.recv() => match signal {
                Some(()) => shared.advance(),
                None => {
                    let (round, current_id) = shared.context();
                    warn!(round, current_id = %current_id, "advance source closed");
                    break;
                }
            },
        }
    }
}
