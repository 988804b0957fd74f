//! Delay-line filters used by the reverb and delay machines.

/// Feedback comb filter with a one-pole lowpass in the feedback path.
///
/// The delay line is allocated once at `capacity`; the active length can be
/// changed later without allocating.
#[derive(Clone, Debug)]
pub struct CombFilter {
    buffer: Vec<f32>,
    length: usize,
    pos: usize,
    feedback: f32,
    damp: f32,
    store: f32,
}

impl CombFilter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0.0; capacity],
            length: capacity,
            pos: 0,
            feedback: 0.5,
            damp: 0.0,
            store: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    /// Set the delay in samples, clamped to `[1, capacity]`.
    pub fn set_len(&mut self, length: usize) {
        self.length = length.clamp(1, self.buffer.len());
        if self.pos >= self.length {
            self.pos = 0;
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    /// 0 leaves the feedback bright, 1 freezes it.
    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.buffer[self.pos];
        self.store = out * (1.0 - self.damp) + self.store * self.damp;
        self.buffer[self.pos] = input + self.store * self.feedback;
        self.pos += 1;
        if self.pos >= self.length {
            self.pos = 0;
        }
        out
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.store = 0.0;
        self.pos = 0;
    }
}

/// Schroeder all-pass: flat magnitude, smeared phase.
#[derive(Clone, Debug)]
pub struct AllPassFilter {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
}

impl AllPassFilter {
    pub fn new(length: usize) -> Self {
        Self { buffer: vec![0.0; length.max(1)], pos: 0, feedback: 0.5 }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let w = input + delayed * self.feedback;
        let out = delayed - w * self.feedback;
        self.buffer[self.pos] = w;
        self.pos += 1;
        if self.pos >= self.buffer.len() {
            self.pos = 0;
        }
        out
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}
