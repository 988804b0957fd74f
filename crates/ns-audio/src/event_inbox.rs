//! SPSC inbox carrying live note and controller events to the driver thread.

use ns_ir::{ControlEvent, NoteEvent};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// One live input event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InboxEvent {
    Note(NoteEvent),
    Control(ControlEvent),
}

/// Create an inbox holding up to `capacity` undelivered events.
pub fn event_inbox(capacity: usize) -> (InboxSender, InboxReceiver) {
    let rb = HeapRb::<InboxEvent>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (InboxSender { producer }, InboxReceiver { consumer })
}

/// Sending end, owned by the input thread (MIDI, UI).
pub struct InboxSender {
    producer: HeapProd<InboxEvent>,
}

impl InboxSender {
    /// Queue a note event. Returns false if the inbox is full.
    pub fn send_note(&mut self, event: NoteEvent) -> bool {
        self.producer.try_push(InboxEvent::Note(event)).is_ok()
    }

    /// Queue a controller value. Returns false if the inbox is full.
    pub fn send_control(&mut self, event: ControlEvent) -> bool {
        self.producer.try_push(InboxEvent::Control(event)).is_ok()
    }
}

/// Receiving end, drained by the driver before each block.
pub struct InboxReceiver {
    consumer: HeapCons<InboxEvent>,
}

impl InboxReceiver {
    pub fn try_recv(&mut self) -> Option<InboxEvent> {
        self.consumer.try_pop()
    }

    /// Hand every queued event to `f` in arrival order.
    pub fn drain(&mut self, mut f: impl FnMut(InboxEvent)) -> usize {
        let mut count = 0;
        while let Some(event) = self.consumer.try_pop() {
            f(event);
            count += 1;
        }
        count
    }
}
