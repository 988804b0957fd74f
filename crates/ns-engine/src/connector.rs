//! Typed connector endpoints.
//!
//! Edges are stored on both sides as [`PortRef`]s (component id + connector
//! index) instead of pointers, so removing a component can never leave a
//! dangling reference behind.

use ns_ir::{AudioBlock, ComponentId, EventList, NoteEvent};

/// Names one connector of one component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub component: ComponentId,
    pub index: usize,
}

impl PortRef {
    pub const fn new(component: ComponentId, index: usize) -> Self {
        Self { component, index }
    }
}

/// One incoming edge of an input connector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    /// Output connector feeding this input
    pub source: PortRef,
    /// Edge weight in [0, 1]
    pub weight: f32,
}

/// Aggregating input port.
#[derive(Clone, Debug)]
pub struct InputConnector {
    name: &'static str,
    midi: bool,
    links: Vec<Link>,
}

impl InputConnector {
    pub fn new(name: &'static str, midi: bool) -> Self {
        Self { name, midi, links: Vec::new() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_midi(&self) -> bool {
        self.midi
    }

    /// Incoming edges in insertion order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    pub(crate) fn find(&self, source: PortRef) -> Option<usize> {
        self.links.iter().position(|l| l.source == source)
    }

    pub(crate) fn push(&mut self, link: Link) {
        self.links.push(link);
    }

    pub(crate) fn remove(&mut self, source: PortRef) -> bool {
        match self.find(source) {
            Some(pos) => {
                self.links.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_weight(&mut self, source: PortRef, weight: f32) -> bool {
        match self.find(source) {
            Some(pos) => {
                self.links[pos].weight = weight;
                true
            }
            None => false,
        }
    }
}

/// Data held by an output connector. The variant is fixed at construction.
#[derive(Clone, Debug)]
pub enum Payload {
    Audio(AudioBlock),
    Midi(EventList),
}

/// Producing output port.
#[derive(Clone, Debug)]
pub struct OutputConnector {
    name: &'static str,
    payload: Payload,
    targets: Vec<PortRef>,
}

impl OutputConnector {
    pub fn new(name: &'static str, midi: bool) -> Self {
        let payload = if midi {
            Payload::Midi(EventList::new())
        } else {
            Payload::Audio(AudioBlock::new())
        };
        Self { name, payload, targets: Vec::new() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_midi(&self) -> bool {
        matches!(self.payload, Payload::Midi(_))
    }

    /// Audio block, or `None` for a MIDI connector.
    pub fn audio(&self) -> Option<&AudioBlock> {
        match &self.payload {
            Payload::Audio(block) => Some(block),
            Payload::Midi(_) => None,
        }
    }

    pub fn audio_mut(&mut self) -> Option<&mut AudioBlock> {
        match &mut self.payload {
            Payload::Audio(block) => Some(block),
            Payload::Midi(_) => None,
        }
    }

    /// Event list, or `None` for an audio connector.
    pub fn events(&self) -> Option<&[NoteEvent]> {
        match &self.payload {
            Payload::Midi(events) => Some(events.as_slice()),
            Payload::Audio(_) => None,
        }
    }

    /// Append an event. Returns false on an audio connector or a full list.
    pub fn push_event(&mut self, event: NoteEvent) -> bool {
        match &mut self.payload {
            Payload::Midi(events) => events.push(event).is_ok(),
            Payload::Audio(_) => false,
        }
    }

    /// Reset to silence / no events.
    pub fn clear(&mut self) {
        match &mut self.payload {
            Payload::Audio(block) => block.silence(),
            Payload::Midi(events) => events.clear(),
        }
    }

    /// Inputs this output feeds.
    pub fn targets(&self) -> &[PortRef] {
        &self.targets
    }

    pub(crate) fn add_target(&mut self, target: PortRef) {
        self.targets.push(target);
    }

    pub(crate) fn remove_target(&mut self, target: PortRef) -> bool {
        match self.targets.iter().position(|t| *t == target) {
            Some(pos) => {
                self.targets.remove(pos);
                true
            }
            None => false,
        }
    }
}
