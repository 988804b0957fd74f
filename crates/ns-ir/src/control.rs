//! External controller events and the parameter link table.

use alloc::vec::Vec;

use crate::ComponentId;

/// Identifies one parameter of one component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParamAddress {
    pub component: ComponentId,
    pub param: u16,
}

impl ParamAddress {
    pub const fn new(component: ComponentId, param: u16) -> Self {
        Self { component, param }
    }
}

/// A value from an external controller (knob, fader, CC).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlEvent {
    /// Controller id
    pub controller: u8,
    /// Normalized position in [0, 1]
    pub value: f32,
}

impl ControlEvent {
    pub fn new(controller: u8, value: f32) -> Self {
        Self { controller, value: value.clamp(0.0, 1.0) }
    }
}

/// Controller-to-parameter links, owned by the graph.
///
/// At most one parameter is armed at a time; the next controller that
/// sends a value gets linked to it.
#[derive(Clone, Debug, Default)]
pub struct ControlLinks {
    armed: Option<ParamAddress>,
    links: Vec<(u8, ParamAddress)>,
}

impl ControlLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a parameter, replacing any previously armed one.
    pub fn arm(&mut self, address: ParamAddress) {
        self.armed = Some(address);
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn armed(&self) -> Option<ParamAddress> {
        self.armed
    }

    /// Link `controller` to a parameter. A parameter has at most one controller.
    pub fn link(&mut self, controller: u8, address: ParamAddress) {
        self.links.retain(|(_, a)| *a != address);
        self.links.push((controller, address));
    }

    /// Remove the link of a parameter, if any.
    pub fn unlink(&mut self, address: ParamAddress) -> bool {
        let before = self.links.len();
        self.links.retain(|(_, a)| *a != address);
        self.links.len() != before
    }

    /// Drop every link (and the armed slot) touching a component.
    pub fn forget_component(&mut self, component: ComponentId) {
        self.links.retain(|(_, a)| a.component != component);
        if self.armed.is_some_and(|a| a.component == component) {
            self.armed = None;
        }
    }

    /// Controller linked to a parameter.
    pub fn controller_of(&self, address: ParamAddress) -> Option<u8> {
        self.links.iter().find(|(_, a)| *a == address).map(|(c, _)| *c)
    }

    /// Bind a pending armed parameter to `controller`, then report the
    /// parameters it drives.
    pub fn route(&mut self, controller: u8) -> impl Iterator<Item = ParamAddress> + '_ {
        if let Some(address) = self.armed.take() {
            self.link(controller, address);
        }
        self.links
            .iter()
            .filter(move |(c, _)| *c == controller)
            .map(|(_, a)| *a)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
