//! Graph engine for nodesynth.
//!
//! Holds the component arena and its schedule, the built-in machines, the
//! voice model and DSP primitives they share, and the driver that renders
//! the graph one block at a time.

mod component;
mod connector;
mod driver;
mod frequency;
mod graph;
mod machine;
pub mod dsp;
pub mod machines;
pub mod scheduler;
pub mod voice;

pub use component::{Component, SampleBank, Transport, UpdateContext};
pub use connector::{InputConnector, Link, OutputConnector, Payload, PortRef};
pub use driver::{Engine, MAX_TEMPO, MIN_TEMPO};
pub use frequency::{note_to_frequency, semitone_ratio};
pub use graph::{Edge, Graph, MAX_COMPONENT_ID};
pub use machine::{param_index, Machine, MachineInfo, PortInfo};
pub use machines::{create_machine, KINDS};
pub use scheduler::compute_update_order;
pub use voice::{Voice, VoiceStage, VoiceTracker, MAX_VOICES};
