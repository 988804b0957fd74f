//! Terminal output. The driver mixes its input into the rendered block.

use ns_ir::AnyParam;

use crate::component::UpdateContext;
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Speaker",
    inputs: &[PortInfo::audio("in")],
    outputs: &[],
};

#[derive(Debug, Default)]
pub struct Speaker;

impl Speaker {
    pub fn new() -> Self {
        Self
    }
}

impl Machine for Speaker {
    fn info(&self) -> &'static MachineInfo {
        &INFO
    }

    fn params(&self) -> &[AnyParam] {
        &[]
    }

    fn params_mut(&mut self) -> &mut [AnyParam] {
        &mut []
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}
}
