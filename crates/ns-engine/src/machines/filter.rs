//! Stereo state-variable filter.

use ns_ir::{AnyParam, AudioBlock, Parameter, Sample};

use crate::component::UpdateContext;
use crate::dsp::{Svf, SvfMode};
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Filter",
    inputs: &[PortInfo::audio("in")],
    outputs: &[PortInfo::audio("out")],
};

const MODE: usize = 0;
const CUTOFF: usize = 1;
const RESONANCE: usize = 2;

pub struct Filter {
    params: Vec<AnyParam>,
    left: Svf,
    right: Svf,
    input: AudioBlock,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    pub fn new() -> Self {
        Self {
            params: vec![
                Parameter::new("mode", 0, 3, 1).with_options(&[0, 1, 2, 3]).into(),
                Parameter::new("cutoff", 20.0f32, 20_000.0, 1_000.0).logarithmic().into(),
                Parameter::new("resonance", 0.0f32, 0.99, 0.2).into(),
            ],
            left: Svf::new(),
            right: Svf::new(),
            input: AudioBlock::new(),
        }
    }
}

impl Machine for Filter {
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
        let mode = SvfMode::from_index(self.params[MODE].as_i32());
        let cutoff = self.params[CUTOFF].as_f32();
        let resonance = self.params[RESONANCE].as_f32();
        let sr = ctx.transport.sample_rate();
        for svf in [&mut self.left, &mut self.right] {
            svf.set_mode(mode);
            svf.set_params(cutoff, resonance, sr);
        }

        ctx.read_audio(0, &mut self.input);
        if let Some(out) = ctx.audio_out(0) {
            for (y, x) in out.iter_mut().zip(self.input.iter()) {
                *y = Sample::new(self.left.process(x.left), self.right.process(x.right));
            }
        }
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}
