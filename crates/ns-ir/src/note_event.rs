//! Note events exchanged over MIDI connectors.

use core::cmp::Ordering;

/// Maximum number of events a MIDI connector (or the pending pool) holds per block.
pub const MAX_EVENTS: usize = 64;

/// Bounded, allocation-free list of events for one block.
pub type EventList = heapless::Vec<NoteEvent, MAX_EVENTS>;

/// A note press or release.
///
/// Events are block-scoped: `time` is the sample offset inside the block in
/// which the event is delivered. They are created once and passed by value.
#[derive(Clone, Copy, Debug)]
pub struct NoteEvent {
    /// Press (`true`) or release (`false`)
    pub pressed: bool,
    /// Sample offset within the block
    pub time: u32,
    /// MIDI note number
    pub note: u8,
    /// Velocity in [0, 1]
    pub velocity: f32,
}

impl NoteEvent {
    /// Create a note press.
    pub fn press(time: u32, note: u8, velocity: f32) -> Self {
        Self { pressed: true, time, note, velocity }
    }

    /// Create a note release.
    pub fn release(time: u32, note: u8) -> Self {
        Self { pressed: false, time, note, velocity: 0.0 }
    }

    /// Copy of this event with velocity scaled by `weight`.
    pub fn scaled(self, weight: f32) -> Self {
        Self { velocity: self.velocity * weight, ..self }
    }
}

/// Ordered by time, then note, then press before release.
impl Ord for NoteEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.note.cmp(&other.note))
            .then(other.pressed.cmp(&self.pressed))
            .then(self.velocity.total_cmp(&other.velocity))
    }
}

impl PartialOrd for NoteEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NoteEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NoteEvent {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn ordering_by_time_then_note() {
        let a = NoteEvent::press(10, 64, 1.0);
        let b = NoteEvent::press(5, 70, 1.0);
        let c = NoteEvent::press(5, 60, 1.0);
        let mut events = [a, b, c];
        events.sort();
        assert_eq!(events.iter().map(|e| e.note).collect::<Vec<_>>(), [60, 70, 64]);
    }

    #[test]
    fn press_sorts_before_release() {
        let off = NoteEvent::release(0, 60);
        let on = NoteEvent::press(0, 60, 0.5);
        let mut events = [off, on];
        events.sort();
        assert!(events[0].pressed);
        assert!(!events[1].pressed);
    }

    #[test]
    fn scaled_only_touches_velocity() {
        let e = NoteEvent::press(3, 60, 0.8).scaled(0.5);
        assert_eq!(e.time, 3);
        assert_eq!(e.note, 60);
        assert!((e.velocity - 0.4).abs() < 1e-6);
    }

    #[test]
    fn event_list_is_bounded() {
        let mut list = EventList::new();
        for i in 0..MAX_EVENTS {
            assert!(list.push(NoteEvent::press(i as u32, 60, 1.0)).is_ok());
        }
        assert!(list.push(NoteEvent::press(0, 60, 1.0)).is_err());
    }
}
