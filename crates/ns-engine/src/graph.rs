//! Component arena, edge editing and the parameter/control context.

use std::mem;

use ns_ir::{
    AudioBlock, ComponentId, ControlEvent, ControlLinks, NoteEvent, SampleAsset, SampleKey,
};
use tracing::debug;

use crate::component::{accumulate_input, Component, SampleBank, Transport, UpdateContext};
use crate::connector::{Link, PortRef};
use crate::machine::{param_index, Machine};
use crate::machines;
use crate::scheduler::compute_update_order;

/// Largest id a component may be placed at. Bounds the arena when a
/// project names its own ids.
pub const MAX_COMPONENT_ID: ComponentId = 0xFFFF;

/// A directed, weighted edge from an output connector to an input connector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub from: PortRef,
    pub to: PortRef,
    pub weight: f32,
}

/// The signal-flow graph.
///
/// Components live in an arena indexed by id; their machines sit in a
/// parallel arena so a machine can be updated while the rest of the graph
/// is read.
pub struct Graph {
    components: Vec<Option<Component>>,
    machines: Vec<Option<Box<dyn Machine>>>,
    order: Vec<ComponentId>,
    next_id: ComponentId,
    samples: SampleBank,
    controls: ControlLinks,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            machines: Vec::new(),
            order: Vec::new(),
            next_id: 0,
            samples: SampleBank::with_key(),
            controls: ControlLinks::new(),
        }
    }

    /// Create a component of a registered kind with the next free id.
    pub fn add_component(&mut self, kind: &str) -> Option<ComponentId> {
        let machine = machines::create_machine(kind)?;
        let id = self.next_id;
        self.place(id, machine);
        Some(id)
    }

    /// Add a component driven by a caller-supplied machine.
    pub fn add_machine(&mut self, machine: Box<dyn Machine>) -> ComponentId {
        let id = self.next_id;
        self.place(id, machine);
        id
    }

    /// Create a component with a specific id (project loading).
    ///
    /// Fails if the kind is unknown, the id is taken or above
    /// [`MAX_COMPONENT_ID`].
    pub fn insert_component(&mut self, kind: &str, id: ComponentId) -> bool {
        if id > MAX_COMPONENT_ID {
            debug!(id, kind, "insert rejected: id out of range");
            return false;
        }
        if self.component(id).is_some() {
            debug!(id, kind, "insert rejected: id in use");
            return false;
        }
        match machines::create_machine(kind) {
            Some(machine) => {
                self.place(id, machine);
                true
            }
            None => false,
        }
    }

    fn place(&mut self, id: ComponentId, machine: Box<dyn Machine>) {
        let idx = id as usize;
        let kind = machine.info().kind;
        if self.components.len() <= idx {
            self.components.resize_with(idx + 1, || None);
            self.machines.resize_with(idx + 1, || None);
        }
        self.components[idx] = Some(Component::from_info(id, machine.info()));
        self.machines[idx] = Some(machine);
        self.next_id = self.next_id.max(id + 1);
        debug!(id, kind, "component added");
        self.reschedule();
    }

    /// Sever every edge of a component, drop its control links and remove it.
    /// Its id is never handed out again.
    pub fn remove_component(&mut self, id: ComponentId) -> bool {
        let Some(component) = self.component(id) else {
            return false;
        };
        let mut severed = Vec::new();
        for (index, input) in component.inputs().iter().enumerate() {
            for link in input.links() {
                severed.push((link.source, PortRef::new(id, index)));
            }
        }
        for (index, output) in component.outputs().iter().enumerate() {
            for &target in output.targets() {
                severed.push((PortRef::new(id, index), target));
            }
        }
        for (from, to) in severed {
            self.unlink(from, to);
        }
        self.controls.forget_component(id);
        self.components[id as usize] = None;
        self.machines[id as usize] = None;
        debug!(id, "component removed");
        self.reschedule();
        true
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id as usize).and_then(Option::as_ref)
    }

    pub fn machine(&self, id: ComponentId) -> Option<&dyn Machine> {
        self.machines.get(id as usize).and_then(|m| m.as_deref())
    }

    pub fn machine_mut(&mut self, id: ComponentId) -> Option<&mut (dyn Machine + 'static)> {
        self.machines.get_mut(id as usize).and_then(|m| m.as_deref_mut())
    }

    /// Live components in id order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.components().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_name(&mut self, id: ComponentId, name: &str) -> bool {
        match self.components.get_mut(id as usize).and_then(Option::as_mut) {
            Some(component) => {
                component.set_name(name);
                true
            }
            None => false,
        }
    }

    /// Id the next `add_component` will use.
    pub fn next_id(&self) -> ComponentId {
        self.next_id
    }

    /// Current processing order, producers first.
    pub fn update_order(&self) -> &[ComponentId] {
        &self.order
    }

    /// Link an output connector to an input connector.
    ///
    /// Rejected when either end does not exist, both ends are on the same
    /// component, the connector kinds differ, the edge exists already or the
    /// edge would close a cycle.
    pub fn connect(&mut self, from: PortRef, to: PortRef, weight: f32) -> bool {
        if from.component == to.component {
            debug!(?from, ?to, "connect rejected: same component");
            return false;
        }
        let Some(output) = self.component(from.component).and_then(|c| c.outputs().get(from.index))
        else {
            debug!(?from, "connect rejected: no such output");
            return false;
        };
        let Some(input) = self.component(to.component).and_then(|c| c.inputs().get(to.index)) else {
            debug!(?to, "connect rejected: no such input");
            return false;
        };
        if output.is_midi() != input.is_midi() {
            debug!(?from, ?to, "connect rejected: connector kinds differ");
            return false;
        }
        if input.find(from).is_some() {
            debug!(?from, ?to, "connect rejected: duplicate edge");
            return false;
        }
        if self.can_reach(to.component, from.component) {
            debug!(?from, ?to, "connect rejected: would create a cycle");
            return false;
        }

        let weight = weight.clamp(0.0, 1.0);
        if let Some(c) = self.components[from.component as usize].as_mut() {
            c.outputs[from.index].add_target(to);
        }
        if let Some(c) = self.components[to.component as usize].as_mut() {
            c.inputs[to.index].push(Link { source: from, weight });
        }
        debug!(?from, ?to, weight, "connected");
        self.reschedule();
        true
    }

    /// Remove an edge from both of its ends.
    pub fn disconnect(&mut self, from: PortRef, to: PortRef) -> bool {
        if !self.unlink(from, to) {
            return false;
        }
        debug!(?from, ?to, "disconnected");
        self.reschedule();
        true
    }

    fn unlink(&mut self, from: PortRef, to: PortRef) -> bool {
        let removed_input = self
            .components
            .get_mut(to.component as usize)
            .and_then(Option::as_mut)
            .and_then(|c| c.inputs.get_mut(to.index))
            .is_some_and(|input| input.remove(from));
        let removed_output = self
            .components
            .get_mut(from.component as usize)
            .and_then(Option::as_mut)
            .and_then(|c| c.outputs.get_mut(from.index))
            .is_some_and(|output| output.remove_target(to));
        removed_input && removed_output
    }

    /// Change the weight of an existing edge.
    pub fn set_weight(&mut self, from: PortRef, to: PortRef, weight: f32) -> bool {
        self.components
            .get_mut(to.component as usize)
            .and_then(Option::as_mut)
            .and_then(|c| c.inputs.get_mut(to.index))
            .is_some_and(|input| input.set_weight(from, weight.clamp(0.0, 1.0)))
    }

    /// Every edge, grouped by target component in id order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.components().flat_map(|c| {
            c.inputs().iter().enumerate().flat_map(move |(index, input)| {
                input.links().iter().map(move |link| Edge {
                    from: link.source,
                    to: PortRef::new(c.id(), index),
                    weight: link.weight,
                })
            })
        })
    }

    /// Whether `to` is downstream of (or equal to) `from`.
    pub fn can_reach(&self, from: ComponentId, to: ComponentId) -> bool {
        let mut visited = vec![false; self.components.len()];
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            let Some(seen) = visited.get_mut(id as usize) else {
                continue;
            };
            if mem::replace(seen, true) {
                continue;
            }
            if let Some(component) = self.component(id) {
                for output in component.outputs() {
                    stack.extend(output.targets().iter().map(|t| t.component));
                }
            }
        }
        false
    }

    fn reschedule(&mut self) {
        self.order = compute_update_order(&self.components);
    }

    /// Current value of a named parameter.
    pub fn param(&self, id: ComponentId, name: &str) -> Option<f64> {
        let machine = self.machine(id)?;
        let index = param_index(machine, name)?;
        Some(machine.params()[index].value())
    }

    /// Set a named parameter, clamped to its range.
    pub fn set_param(&mut self, id: ComponentId, name: &str, value: f64) -> bool {
        let Some(machine) = self.machine_mut(id) else {
            return false;
        };
        match param_index(machine, name) {
            Some(index) => {
                machine.params_mut()[index].set_value(value);
                true
            }
            None => false,
        }
    }

    pub fn add_sample(&mut self, asset: SampleAsset) -> SampleKey {
        self.samples.insert(asset)
    }

    pub fn sample(&self, key: SampleKey) -> Option<&SampleAsset> {
        self.samples.get(key)
    }

    pub fn samples(&self) -> &SampleBank {
        &self.samples
    }

    /// Hand a stored asset to a sample-playing component.
    pub fn attach_sample(&mut self, id: ComponentId, key: SampleKey) -> bool {
        if !self.samples.contains_key(key) {
            return false;
        }
        self.machines
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .is_some_and(|m| m.attach_sample(key))
    }

    /// The asset a component plays from, if it holds one.
    pub fn attached_sample(&self, id: ComponentId) -> Option<&SampleAsset> {
        let key = self.machine(id)?.sample()?;
        self.samples.get(key)
    }

    pub fn controls(&self) -> &ControlLinks {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut ControlLinks {
        &mut self.controls
    }

    /// Route a controller value to every parameter linked to it.
    pub fn apply_control(&mut self, event: ControlEvent) {
        for address in self.controls.route(event.controller) {
            let param = self
                .machines
                .get_mut(address.component as usize)
                .and_then(Option::as_mut)
                .and_then(|m| m.params_mut().get_mut(address.param as usize));
            if let Some(param) = param {
                param.set_normalized(event.value);
            }
        }
    }

    /// Drop transient playback state of every machine.
    pub fn reset(&mut self) {
        for machine in self.machines.iter_mut().flatten() {
            machine.reset();
        }
    }

    pub(crate) fn clear_outputs(&mut self) {
        for component in self.components.iter_mut().flatten() {
            component.clear_outputs();
        }
    }

    /// Run every component once, in schedule order.
    pub(crate) fn update_all(&mut self, transport: Transport, pending: &[NoteEvent]) {
        for k in 0..self.order.len() {
            let id = self.order[k];
            self.update_component(id, transport, pending);
        }
    }

    fn update_component(&mut self, id: ComponentId, transport: Transport, pending: &[NoteEvent]) {
        let idx = id as usize;
        let Some(component) = self.components.get_mut(idx).and_then(Option::as_mut) else {
            return;
        };
        // Vec::new does not allocate, so taking the connectors is free.
        let inputs = mem::take(&mut component.inputs);
        let mut outputs = mem::take(&mut component.outputs);

        if let Some(machine) = self.machines.get_mut(idx).and_then(Option::as_mut) {
            let mut ctx = UpdateContext::new(
                transport,
                pending,
                &self.samples,
                &inputs,
                &self.components,
                &mut outputs,
            );
            machine.update(&mut ctx);
        }

        if let Some(component) = self.components[idx].as_mut() {
            component.inputs = inputs;
            component.outputs = outputs;
        }
    }

    /// Sum the settled inputs of every sink into `out`.
    pub(crate) fn mix_sinks(&self, out: &mut AudioBlock) {
        for component in self.components().filter(|c| c.is_sink()) {
            for input in component.inputs() {
                accumulate_input(&self.components, input, out);
            }
        }
    }
}
