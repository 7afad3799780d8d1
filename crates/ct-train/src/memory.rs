//! Recirculation memory.
//!
//! One fluid slot per stage, surviving across time steps by design: when a
//! stage would otherwise see zero net mass rate, the last fluid it handled
//! is recirculated so the mixing math stays defined. This is the engine's
//! only cross-time-step mutable state, so it lives in an explicit indexed
//! store with plain get/set accessors instead of ambient stage fields.

use ct_fluids::FluidStream;

#[derive(Debug, Clone, Default)]
pub struct RecirculationMemory {
    slots: Vec<Option<FluidStream>>,
}

impl RecirculationMemory {
    /// One empty slot per stage.
    pub fn new(stage_count: usize) -> Self {
        Self {
            slots: vec![None; stage_count],
        }
    }

    pub fn get(&self, stage_index: usize) -> Option<&FluidStream> {
        self.slots.get(stage_index).and_then(|s| s.as_ref())
    }

    pub fn set(&mut self, stage_index: usize, stream: FluidStream) {
        if let Some(slot) = self.slots.get_mut(stage_index) {
            *slot = Some(stream);
        }
    }

    /// Raw slot view; sub-trains read a sub-slice of the parent's slots.
    pub fn slots(&self) -> &[Option<FluidStream>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
