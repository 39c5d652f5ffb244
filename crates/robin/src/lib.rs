//! Relayer Robin - priority round-robin rotation of relayer participants
//!
//! Decides which participant (a signer key, a backend node) acts next. An external
//! driver performs work with [`RoundRobin::current`] and sends one signal on the
//! advance channel when it is done; the scheduler then penalizes the participant
//! that just acted and promotes the highest scoring one.
//!
//! ```no_run
//! use relayer_robin::{NamedParticipant, RoundRobin};
//!
//! # async fn example() -> relayer_robin::Result<()> {
//! let (ack, advance) = tokio::sync::mpsc::channel(16);
//! let robin = RoundRobin::new(
//!     advance,
//!     ["signer-a", "signer-b"].map(|id| NamedParticipant::new(id).shared()),
//! )?;
//!
//! robin.start();
//! let signer = robin.current();
//! // ... relay with `signer` ...
//! ack.send(()).await.ok();
//! robin.stop();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod participant;
pub mod robin;
pub mod rotation;

pub use error::{Error, Result};
pub use participant::{NamedParticipant, Participant, ScoreSeed};
pub use robin::{RobinOptions, RoundRobin};
pub use rotation::{Rotation, Snapshot, PRIORITY_DELTA};
