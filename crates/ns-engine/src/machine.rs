//! Machine trait for the behaviour behind each component kind.

use ns_ir::{AnyParam, SampleKey};

use crate::component::UpdateContext;

/// Describes one connector of a machine kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortInfo {
    pub name: &'static str,
    pub midi: bool,
}

impl PortInfo {
    pub const fn audio(name: &'static str) -> Self {
        Self { name, midi: false }
    }

    pub const fn midi(name: &'static str) -> Self {
        Self { name, midi: true }
    }
}

/// Static metadata about a machine kind.
#[derive(Debug)]
pub struct MachineInfo {
    /// Registry and persistence name
    pub kind: &'static str,
    pub inputs: &'static [PortInfo],
    pub outputs: &'static [PortInfo],
}

/// Core trait for event sources, generators, effects and sinks.
pub trait Machine: Send {
    fn info(&self) -> &'static MachineInfo;

    fn params(&self) -> &[AnyParam];

    fn params_mut(&mut self) -> &mut [AnyParam];

    /// Consume inputs and produce outputs for one block.
    fn update(&mut self, ctx: &mut UpdateContext<'_>);

    /// Give the machine a sample asset to play. Refused by default.
    fn attach_sample(&mut self, _key: SampleKey) -> bool {
        false
    }

    /// The asset currently attached, if any.
    fn sample(&self) -> Option<SampleKey> {
        None
    }

    /// Render hook for editors and meters.
    fn visual(&self) -> Option<&[f32]> {
        None
    }

    /// Drop all transient playback state.
    fn reset(&mut self) {}
}

/// Index of the parameter called `name`.
pub fn param_index(machine: &dyn Machine, name: &str) -> Option<usize> {
    machine.params().iter().position(|p| p.name() == name)
}
