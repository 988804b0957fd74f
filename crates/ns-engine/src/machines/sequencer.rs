//! Eight-step note sequencer clocked by the transport.

use ns_ir::{AnyParam, NoteEvent, Parameter, BLOCK_SIZE};

use crate::component::UpdateContext;
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Sequencer",
    inputs: &[],
    outputs: &[PortInfo::midi("out")],
};

pub const STEPS: usize = 8;

const GATE: usize = STEPS;
const TRANSPOSE: usize = STEPS + 1;

const DEFAULT_PATTERN: [i32; STEPS] = [60, 0, 63, 0, 67, 65, 63, 0];
const NOTE_NAMES: [&str; STEPS] =
    ["note_0", "note_1", "note_2", "note_3", "note_4", "note_5", "note_6", "note_7"];

/// Plays one note per step; 0 is a rest. Each note is held for `gate` of a
/// step, then released.
pub struct Sequencer {
    params: Vec<AnyParam>,
    step: Option<u64>,
    sounding: Option<u8>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        let mut params: Vec<AnyParam> = NOTE_NAMES
            .iter()
            .zip(DEFAULT_PATTERN)
            .map(|(name, note)| Parameter::new(name, 0, 127, note).into())
            .collect();
        params.push(Parameter::new("gate", 0.05f32, 1.0, 0.5).into());
        params.push(Parameter::new("transpose", -24, 24, 0).into());
        Self { params, step: None, sounding: None }
    }

    fn note_at(&self, step: u64) -> Option<u8> {
        let note = self.params[(step % STEPS as u64) as usize].as_i32();
        if note == 0 {
            return None;
        }
        let shifted = note + self.params[TRANSPOSE].as_i32();
        u8::try_from(shifted.clamp(1, 127)).ok()
    }
}

impl Machine for Sequencer {
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
        let sps = ctx.transport.steps_per_sample();
        let gate = self.params[GATE].as_f32() as f64;
        let start = ctx.transport.block_start;

        for i in 0..BLOCK_SIZE {
            let n = start + i as u64;
            let pos = n as f64 * sps;
            let step = pos as u64;
            let time = i as u32;

            if self.step != Some(step) {
                if let Some(note) = self.sounding.take() {
                    ctx.emit(0, NoteEvent::release(time, note));
                }
                if let Some(note) = self.note_at(step) {
                    ctx.emit(0, NoteEvent::press(time, note, 1.0));
                    self.sounding = Some(note);
                }
                self.step = Some(step);
                continue;
            }

            // A note never outlives its step, so a repeat of the same
            // note gets a fresh press on the next sample.
            let last_in_step = ((n + 1) as f64 * sps) as u64 != step;
            if pos - step as f64 >= gate || last_in_step {
                if let Some(note) = self.sounding.take() {
                    ctx.emit(0, NoteEvent::release(time, note));
                }
            }
        }
    }

    fn reset(&mut self) {
        self.step = None;
        self.sounding = None;
    }
}
