//! Audio I/O plumbing for nodesynth.
//!
//! Finished blocks travel from the driver thread to the device callback
//! through a three-slot lock-free ring; live note and controller events
//! travel the other way through an SPSC inbox.

mod block_ring;
mod cpal_backend;
mod event_inbox;
mod traits;

pub use block_ring::{block_ring, BlockConsumer, BlockProducer, SLOTS};
pub use cpal_backend::CpalOutput;
pub use event_inbox::{event_inbox, InboxEvent, InboxReceiver, InboxSender};
pub use traits::{AudioError, AudioOutput};
