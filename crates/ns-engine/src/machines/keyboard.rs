//! Forwards the note events pushed into the engine for the current block.

use ns_ir::AnyParam;

use crate::component::UpdateContext;
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Keyboard",
    inputs: &[],
    outputs: &[PortInfo::midi("out")],
};

#[derive(Debug, Default)]
pub struct Keyboard;

impl Keyboard {
    pub fn new() -> Self {
        Self
    }
}

impl Machine for Keyboard {
    fn info(&self) -> &'static MachineInfo {
        &INFO
    }

    fn params(&self) -> &[AnyParam] {
        &[]
    }

    fn params_mut(&mut self) -> &mut [AnyParam] {
        &mut []
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let pending = ctx.pending;
        for &event in pending {
            if !ctx.emit(0, event) {
                break;
            }
        }
    }
}
