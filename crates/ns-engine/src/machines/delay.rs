//! Tempo-synced stereo echo on two damped comb filters.

use ns_ir::{AnyParam, AudioBlock, Parameter, Sample};

use crate::component::{Transport, UpdateContext};
use crate::driver::MIN_TEMPO;
use crate::dsp::CombFilter;
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Delay",
    inputs: &[PortInfo::audio("in")],
    outputs: &[PortInfo::audio("out")],
};

/// Longest echo, in steps.
const MAX_TIME: f32 = 16.0;

const TIME: usize = 0;
const FEEDBACK: usize = 1;
const DAMP: usize = 2;
const MIX: usize = 3;

pub struct Delay {
    params: Vec<AnyParam>,
    left: CombFilter,
    right: CombFilter,
    input: AudioBlock,
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl Delay {
    pub fn new() -> Self {
        // Room for the longest echo at the slowest tempo.
        let longest = Transport::new(0, MIN_TEMPO).steps_to_samples(MAX_TIME as f64);
        let capacity = longest.ceil() as usize + 1;
        Self {
            params: vec![
                Parameter::new("time", 0.25f32, MAX_TIME, 3.0).with_options(&[1.0, 2.0, 3.0, 4.0]).into(),
                Parameter::new("feedback", 0.0f32, 0.95, 0.4).into(),
                Parameter::new("damp", 0.0f32, 1.0, 0.2).into(),
                Parameter::new("mix", 0.0f32, 1.0, 0.35).into(),
            ],
            left: CombFilter::new(capacity),
            right: CombFilter::new(capacity),
            input: AudioBlock::new(),
        }
    }
}

impl Machine for Delay {
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
        let length = ctx.transport.steps_to_samples(self.params[TIME].as_f32() as f64) as usize;
        let feedback = self.params[FEEDBACK].as_f32();
        let damp = self.params[DAMP].as_f32();
        let mix = self.params[MIX].as_f32();
        for comb in [&mut self.left, &mut self.right] {
            comb.set_len(length);
            comb.set_feedback(feedback);
            comb.set_damp(damp);
        }

        ctx.read_audio(0, &mut self.input);
        if let Some(out) = ctx.audio_out(0) {
            for (y, x) in out.iter_mut().zip(self.input.iter()) {
                let wet = Sample::new(self.left.process(x.left), self.right.process(x.right));
                *y = x.lerp(wet, mix);
            }
        }
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}
