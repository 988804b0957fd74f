//! Envelope gate: shapes its audio input with an ADHSR triggered by notes.

use ns_ir::{AnyParam, BLOCK_SIZE};

use super::{adhsr_params, read_adhsr, sorted_events};
use crate::component::UpdateContext;
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Gate",
    inputs: &[PortInfo::audio("in"), PortInfo::midi("trigger")],
    outputs: &[PortInfo::audio("out")],
};

/// Uses the envelope function directly: one shared envelope, restarted by
/// every press, closed by any release.
pub struct Gate {
    params: Vec<AnyParam>,
    onset: Option<u64>,
    released_at: Option<f64>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    pub fn new() -> Self {
        Self { params: adhsr_params().to_vec(), onset: None, released_at: None }
    }
}

impl Machine for Gate {
    fn info(&self) -> &'static MachineInfo {
        &INFO
    }

    fn params(&self) -> &[AnyParam] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [AnyParam] {
        &mut self.params
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let events = sorted_events(ctx, 1);
        let env = read_adhsr(&self.params);
        let sps = ctx.transport.steps_per_sample();
        let start = ctx.transport.block_start;
        let mut next = 0;

        for i in 0..BLOCK_SIZE {
            let now = start + i as u64;
            while let Some(event) = events.get(next).filter(|e| e.time as usize <= i) {
                if event.pressed {
                    self.onset = Some(now);
                    self.released_at = None;
                } else if let Some(onset) = self.onset {
                    if self.released_at.is_none() {
                        self.released_at = Some((now - onset) as f64 * sps);
                    }
                }
                next += 1;
            }

            let level = match self.onset {
                None => 0.0,
                Some(onset) => {
                    let t = (now - onset) as f64 * sps;
                    match self.released_at {
                        Some(r) if t >= r => env.released_level(r, t - r),
                        _ => env.level(t),
                    }
                }
            };
            let x = ctx.audio(0, i);
            ctx.write_audio(0, i, x * level);
        }
    }

    fn reset(&mut self) {
        self.onset = None;
        self.released_at = None;
    }
}
