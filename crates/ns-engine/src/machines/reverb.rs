//! Freeverb-style stereo reverb.

use ns_ir::{AnyParam, AudioBlock, Parameter, Sample};

use crate::component::UpdateContext;
use crate::dsp::{AllPassFilter, CombFilter};
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Reverb",
    inputs: &[PortInfo::audio("in")],
    outputs: &[PortInfo::audio("out")],
};

// Delay lengths in samples at 44.1 kHz.
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;

const FIXED_GAIN: f32 = 0.015;
const SCALE_WET: f32 = 3.0;
const SCALE_DRY: f32 = 2.0;
const SCALE_DAMP: f32 = 0.4;
const SCALE_ROOM: f32 = 0.28;
const OFFSET_ROOM: f32 = 0.7;

const ROOM: usize = 0;
const DAMP: usize = 1;
const WET: usize = 2;
const DRY: usize = 3;
const WIDTH: usize = 4;

/// Parallel damped combs into serial all-passes, one bank per channel.
struct Channel {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllPassFilter>,
}

impl Channel {
    fn new(spread: usize) -> Self {
        let combs = COMB_TUNING.iter().map(|&n| CombFilter::new(n + spread)).collect();
        let allpasses = ALLPASS_TUNING
            .iter()
            .map(|&n| {
                let mut ap = AllPassFilter::new(n + spread);
                ap.set_feedback(0.5);
                ap
            })
            .collect();
        Self { combs, allpasses }
    }

    fn configure(&mut self, feedback: f32, damp: f32) {
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
            comb.set_damp(damp);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut out = self.combs.iter_mut().map(|c| c.process(input)).sum::<f32>();
        for ap in &mut self.allpasses {
            out = ap.process(out);
        }
        out
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.allpasses.iter_mut().for_each(AllPassFilter::clear);
    }
}

pub struct Reverb {
    params: Vec<AnyParam>,
    left: Channel,
    right: Channel,
    input: AudioBlock,
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl Reverb {
    pub fn new() -> Self {
        Self {
            params: vec![
                Parameter::new("room", 0.0f32, 1.0, 0.5).into(),
                Parameter::new("damp", 0.0f32, 1.0, 0.5).into(),
                Parameter::new("wet", 0.0f32, 1.0, 1.0 / SCALE_WET).into(),
                Parameter::new("dry", 0.0f32, 1.0, 0.5).into(),
                Parameter::new("width", 0.0f32, 1.0, 1.0).into(),
            ],
            left: Channel::new(0),
            right: Channel::new(STEREO_SPREAD),
            input: AudioBlock::new(),
        }
    }
}

impl Machine for Reverb {
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
        let feedback = self.params[ROOM].as_f32() * SCALE_ROOM + OFFSET_ROOM;
        let damp = self.params[DAMP].as_f32() * SCALE_DAMP;
        let wet = self.params[WET].as_f32() * SCALE_WET;
        let dry = self.params[DRY].as_f32() * SCALE_DRY;
        let width = self.params[WIDTH].as_f32();
        let wet1 = wet * (width / 2.0 + 0.5);
        let wet2 = wet * ((1.0 - width) / 2.0);
        self.left.configure(feedback, damp);
        self.right.configure(feedback, damp);

        ctx.read_audio(0, &mut self.input);
        if let Some(out) = ctx.audio_out(0) {
            for (y, x) in out.iter_mut().zip(self.input.iter()) {
                let mono = (x.left + x.right) * FIXED_GAIN;
                let l = self.left.process(mono);
                let r = self.right.process(mono);
                *y = Sample::new(
                    l * wet1 + r * wet2 + x.left * dry,
                    r * wet1 + l * wet2 + x.right * dry,
                );
            }
        }
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machines::testing::{rms, Rig, Signal};

    #[test]
    fn impulse_leaves_a_tail() {
        let mut rig = Rig::new("Reverb", Signal::Impulse);
        let out = rig.run(40);
        // dry path only until the shortest comb comes round
        assert_eq!(out[0].left, 1.0);
        assert!(out[1..COMB_TUNING[0]].iter().all(|s| *s == Sample::ZERO));

        let early = rms(&out[2_000..6_000]);
        let late = rms(&out[8_000..]);
        assert!(early > 0.0);
        assert!(late > 0.0 && late < early, "early {early} late {late}");
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn reset_clears_the_tail() {
        let mut rig = Rig::new("Reverb", Signal::Impulse);
        rig.run(10);
        rig.engine.reset();
        assert!(rig.run(10).iter().all(|s| *s == Sample::ZERO));
    }
}
