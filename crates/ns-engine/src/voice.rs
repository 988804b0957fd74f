//! Polyphonic voice tracking shared by note-driven machines.

use ns_ir::NoteEvent;

use crate::component::Transport;
use crate::dsp::Adhsr;

/// Maximum simultaneous voices per machine.
pub const MAX_VOICES: usize = 32;

/// Envelope stage of a voice at a given moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceStage {
    /// Onset lies in the future
    Pending,
    Attack,
    Hold,
    Decay,
    Sustain,
    Releasing,
    Done,
}

/// Playback state of one note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voice {
    pub note: u8,
    pub velocity: f32,
    /// Absolute sample index of the onset
    pub start_time: u64,
    /// Steps after onset at which the note was released; infinite while held
    pub release_time: f64,
}

impl Voice {
    pub fn new(note: u8, velocity: f32, start_time: u64) -> Self {
        Self { note, velocity, start_time, release_time: f64::INFINITY }
    }

    pub fn is_released(&self) -> bool {
        self.release_time.is_finite()
    }

    /// Samples elapsed since onset, or `None` before it.
    #[inline]
    pub fn elapsed(&self, sample: u64) -> Option<u64> {
        sample.checked_sub(self.start_time)
    }

    /// Envelope amplitude `t` steps after onset.
    #[inline]
    pub fn amplitude(&self, env: &Adhsr, t: f64) -> f32 {
        if t < self.release_time {
            env.level(t)
        } else {
            env.released_level(self.release_time, t - self.release_time)
        }
    }

    pub fn stage(&self, env: &Adhsr, t: f64) -> VoiceStage {
        let (a, h, d) = (env.attack as f64, env.hold as f64, env.decay as f64);
        if t < 0.0 {
            VoiceStage::Pending
        } else if t >= self.release_time {
            if env.is_done(t - self.release_time) {
                VoiceStage::Done
            } else {
                VoiceStage::Releasing
            }
        } else if t < a {
            VoiceStage::Attack
        } else if t < a + h {
            VoiceStage::Hold
        } else if t < a + h + d {
            VoiceStage::Decay
        } else {
            VoiceStage::Sustain
        }
    }
}

/// Owns the voices of one machine.
///
/// Presses open a voice unless the note is already sounding; releases close
/// the oldest sounding voice of that note.
#[derive(Clone, Debug)]
pub struct VoiceTracker {
    voices: Vec<Voice>,
}

impl Default for VoiceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceTracker {
    pub fn new() -> Self {
        Self { voices: Vec::with_capacity(MAX_VOICES) }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Apply a block's events; `time` offsets are relative to the block start.
    pub fn handle_events(&mut self, events: &[NoteEvent], transport: &Transport) {
        let sps = transport.steps_per_sample();
        for event in events {
            let at = transport.block_start + event.time as u64;
            if event.pressed {
                self.press(event.note, event.velocity, at);
            } else {
                self.release(event.note, at, sps);
            }
        }
    }

    pub fn press(&mut self, note: u8, velocity: f32, at: u64) {
        if self.voices.iter().any(|v| v.note == note && !v.is_released()) {
            return;
        }
        if self.voices.len() >= MAX_VOICES {
            self.steal();
        }
        self.voices.push(Voice::new(note, velocity, at));
    }

    pub fn release(&mut self, note: u8, at: u64, steps_per_sample: f64) {
        let oldest = self
            .voices
            .iter_mut()
            .filter(|v| v.note == note && !v.is_released())
            .min_by_key(|v| v.start_time);
        if let Some(voice) = oldest {
            let held = at.saturating_sub(voice.start_time);
            voice.release_time = held as f64 * steps_per_sample;
        }
    }

    // Full: drop released voices first, then the oldest.
    fn steal(&mut self) {
        let victim = self
            .voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (!v.is_released(), v.start_time))
            .map(|(i, _)| i);
        if let Some(i) = victim {
            self.voices.swap_remove(i);
        }
    }

    /// Remove voices whose release finished by sample `now`.
    pub fn reap(&mut self, env: &Adhsr, now: u64, steps_per_sample: f64) {
        self.retain(|v| match v.elapsed(now) {
            Some(n) => v.stage(env, n as f64 * steps_per_sample) != VoiceStage::Done,
            None => true,
        });
    }

    /// Swap-remove every voice failing `keep`. Order is not preserved.
    pub fn retain(&mut self, mut keep: impl FnMut(&Voice) -> bool) {
        let mut i = 0;
        while i < self.voices.len() {
            if keep(&self.voices[i]) {
                i += 1;
            } else {
                self.voices.swap_remove(i);
            }
        }
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> Transport {
        // 120 BPM: 8 steps per second
        Transport::new(0, 120.0)
    }

    #[test]
    fn press_is_deduplicated_while_sounding() {
        let mut t = VoiceTracker::new();
        t.handle_events(&[NoteEvent::press(0, 60, 1.0), NoteEvent::press(5, 60, 1.0)], &transport());
        assert_eq!(t.len(), 1);
        t.handle_events(&[NoteEvent::release(10, 60), NoteEvent::press(20, 60, 1.0)], &transport());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn release_hits_oldest_sounding_voice() {
        let mut t = VoiceTracker::new();
        t.press(60, 1.0, 100);
        t.release(60, 200, 1.0);
        t.press(60, 1.0, 300);
        t.press(60, 1.0, 400);
        assert_eq!(t.len(), 2);
        t.release(60, 500, 1.0);
        let second = t.voices().iter().find(|v| v.start_time == 300).unwrap();
        assert_eq!(second.release_time, 200.0);
        assert_eq!(t.voices()[0].release_time, 100.0);
    }

    #[test]
    fn stage_walks_through_envelope() {
        let env = Adhsr { attack: 1.0, hold: 1.0, decay: 1.0, sustain: 0.5, release: 2.0 };
        let mut v = Voice::new(60, 1.0, 0);
        assert_eq!(v.stage(&env, -1.0), VoiceStage::Pending);
        assert_eq!(v.stage(&env, 0.5), VoiceStage::Attack);
        assert_eq!(v.stage(&env, 1.5), VoiceStage::Hold);
        assert_eq!(v.stage(&env, 2.5), VoiceStage::Decay);
        assert_eq!(v.stage(&env, 10.0), VoiceStage::Sustain);
        v.release_time = 10.0;
        assert_eq!(v.stage(&env, 11.0), VoiceStage::Releasing);
        assert!((v.amplitude(&env, 11.0) - 0.25).abs() < 1e-6);
        assert_eq!(v.stage(&env, 12.0), VoiceStage::Done);
    }

    #[test]
    fn reap_swaps_out_finished_voices() {
        let env = Adhsr { attack: 0.0, hold: 0.0, decay: 0.0, sustain: 1.0, release: 1.0 };
        let mut t = VoiceTracker::new();
        t.press(60, 1.0, 0);
        t.press(62, 1.0, 0);
        t.press(64, 1.0, 0);
        t.release(60, 10, 0.1);
        t.reap(&env, 19, 0.1);
        assert_eq!(t.len(), 3);
        t.reap(&env, 20, 0.1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.voices()[0].note, 64);
    }

    #[test]
    fn full_tracker_steals_oldest() {
        let mut t = VoiceTracker::new();
        for note in 0..MAX_VOICES as u8 {
            t.press(note, 1.0, note as u64);
        }
        t.press(100, 1.0, 1000);
        assert_eq!(t.len(), MAX_VOICES);
        assert!(t.voices().iter().all(|v| v.note != 0));
        assert!(t.voices().iter().any(|v| v.note == 100));
    }
}
