//! Three-slot single-producer single-consumer ring of audio blocks.
//!
//! Wraps a `ringbuf` heap ring so the driver thread can hand finished
//! blocks to the device callback without locking. A full ring is never
//! overwritten; an empty one plays silence and counts an underrun.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ns_ir::{AudioBlock, BLOCK_SIZE};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Number of block slots.
pub const SLOTS: usize = 3;

/// Create a ring, returning its two ends.
pub fn block_ring() -> (BlockProducer, BlockConsumer) {
    let rb = HeapRb::<AudioBlock>::new(SLOTS);
    let (producer, consumer) = rb.split();
    let underruns = Arc::new(AtomicU64::new(0));
    (
        BlockProducer { producer, underruns: underruns.clone() },
        BlockConsumer { consumer, underruns, current: AudioBlock::new(), cursor: BLOCK_SIZE },
    )
}

/// Writing end, owned by the driver thread.
pub struct BlockProducer {
    producer: HeapProd<AudioBlock>,
    underruns: Arc<AtomicU64>,
}

impl BlockProducer {
    /// Publish a block if a slot is free.
    pub fn try_push(&mut self, block: &AudioBlock) -> bool {
        self.producer.try_push(*block).is_ok()
    }

    /// Publish a block, sleeping between attempts while the ring is full.
    ///
    /// Returns false without publishing once `stop` is set.
    pub fn push(&mut self, block: &AudioBlock, stop: &AtomicBool, sleep: Duration) -> bool {
        loop {
            if stop.load(Ordering::Acquire) {
                return false;
            }
            if self.try_push(block) {
                return true;
            }
            thread::sleep(sleep);
        }
    }

    /// Blocks published but not yet consumed.
    pub fn len(&self) -> usize {
        self.producer.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Times the consumer found the ring empty.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}

/// Reading end, owned by the audio callback. Never blocks.
pub struct BlockConsumer {
    consumer: HeapCons<AudioBlock>,
    underruns: Arc<AtomicU64>,
    current: AudioBlock,
    cursor: usize,
}

impl BlockConsumer {
    /// Take the oldest published block.
    pub fn try_pop(&mut self, out: &mut AudioBlock) -> bool {
        match self.consumer.try_pop() {
            Some(block) => {
                *out = block;
                true
            }
            None => false,
        }
    }

    /// Take the oldest block, or silence (counted as an underrun) if none
    /// is ready.
    pub fn pop_or_silence(&mut self, out: &mut AudioBlock) {
        if !self.try_pop(out) {
            out.silence();
            self.underruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Fill an interleaved device buffer, pulling blocks as needed.
    ///
    /// The first two channels get left/right, extra channels are zeroed.
    pub fn fill_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks_mut(channels) {
            if self.cursor >= BLOCK_SIZE {
                let mut next = AudioBlock::new();
                self.pop_or_silence(&mut next);
                self.current = next;
                self.cursor = 0;
            }
            let sample = self.current[self.cursor];
            self.cursor += 1;
            for (i, out) in frame.iter_mut().enumerate() {
                *out = match i {
                    0 if channels == 1 => sample.to_mono(),
                    0 => sample.left,
                    1 => sample.right,
                    _ => 0.0,
                };
            }
        }
    }

    pub fn len(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }
}
