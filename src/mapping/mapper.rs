use std::sync::Arc;

use super::bank::{
    encoder_index, fader_index, Bank, ControlMapping, ParamTarget, CC_BANK_NEXT, CC_BANK_PREV,
    NUM_ENCODERS, NUM_FADERS,
};
use super::fader::FaderState;
use crate::sync::EdgeFlag;

/// Bank-aware CC router with fader pickup
pub struct CcMapper {
    bank: Bank,
    faders: [FaderState; NUM_FADERS],
    encoder_values: [u8; NUM_ENCODERS],
    master_output: f32,
    bank_changed: Arc<EdgeFlag>,
}

impl CcMapper {
    pub fn new() -> Self {
        Self::with_bank(Bank::default())
    }

    pub fn with_bank(bank: Bank) -> Self {
        Self {
            bank,
            faders: [FaderState::new(); NUM_FADERS],
            encoder_values: [64; NUM_ENCODERS],
            master_output: 1.0,
            bank_changed: EdgeFlag::shared(),
        }
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    pub fn bank_name(&self) -> &'static str {
        self.bank.name()
    }

    /// Switching to a different bank puts every fader into pickup
    pub fn set_bank(&mut self, bank: Bank) {
        if bank == self.bank {
            return;
        }
        self.bank = bank;
        for f in self.faders.iter_mut() {
            f.require_pickup();
        }
        self.bank_changed.raise();
    }

    /// Out-of-range indices are ignored
    pub fn set_bank_index(&mut self, index: usize) {
        if let Some(bank) = Bank::from_index(index) {
            self.set_bank(bank);
        }
    }

    /// Bank next/prev buttons. Returns true if `cc` was one of them.
    /// Any value counts as a press.
    pub fn handle_bank_switch(&mut self, cc: u8) -> bool {
        match cc {
            CC_BANK_NEXT => self.set_bank(self.bank.next()),
            CC_BANK_PREV => self.set_bank(self.bank.prev()),
            _ => return false,
        }
        true
    }

    /// Route one CC. Returns the target and the value to apply, or `None` if
    /// the CC was consumed (bank switch), unmapped, or a fader still waiting
    /// for pickup.
    pub fn process_cc(&mut self, cc: u8, value: u8) -> Option<(ParamTarget, u8)> {
        if self.handle_bank_switch(cc) {
            return None;
        }

        if let Some(idx) = encoder_index(cc) {
            // Encoders are relative on the hardware, nothing to pick up
            self.encoder_values[idx] = value;
            return self.encoder_mapping(idx).target.map(|t| (t, value));
        }

        if let Some(idx) = fader_index(cc) {
            let state = &mut self.faders[idx];
            if state.update(value) {
                let out = state.logical_value;
                return self.fader_mapping(idx).target.map(|t| (t, out));
            }
        }

        None
    }

    pub fn encoder_mapping(&self, idx: usize) -> &'static ControlMapping {
        &self.bank.mappings().encoders[idx.min(NUM_ENCODERS - 1)]
    }

    pub fn fader_mapping(&self, idx: usize) -> &'static ControlMapping {
        &self.bank.mappings().faders[idx.min(NUM_FADERS - 1)]
    }

    pub fn fader_state(&self, idx: usize) -> &FaderState {
        &self.faders[idx.min(NUM_FADERS - 1)]
    }

    pub fn encoder_value(&self, idx: usize) -> u8 {
        self.encoder_values[idx.min(NUM_ENCODERS - 1)]
    }

    /// Out-of-range indices are ignored
    pub fn set_fader_logical_value(&mut self, idx: usize, value: u8) {
        if let Some(f) = self.faders.get_mut(idx) {
            f.set_logical_value(value);
        }
    }

    /// Re-sync every fader in the current bank that drives `target`
    pub fn sync_target(&mut self, target: ParamTarget, value: u8) {
        let faders = &self.bank.mappings().faders;
        for (state, mapping) in self.faders.iter_mut().zip(faders.iter()) {
            if mapping.target == Some(target) {
                state.set_logical_value(value);
            }
        }
    }

    /// Bit i set: fader i is picked up
    pub fn picked_up_mask(&self) -> u16 {
        self.mask(|f| f.picked_up)
    }

    /// Bit i set: fader i needs pickup
    pub fn needs_pickup_mask(&self) -> u16 {
        self.mask(|f| f.needs_pickup)
    }

    fn mask(&self, pred: impl Fn(&FaderState) -> bool) -> u16 {
        self.faders
            .iter()
            .enumerate()
            .filter(|(_, f)| pred(f))
            .fold(0, |m, (i, _)| m | (1 << i))
    }

    pub fn master_output(&self) -> f32 {
        self.master_output
    }

    pub fn set_master_output(&mut self, level: f32) {
        self.master_output = level.clamp(0.0, 1.0);
    }

    /// Check-and-clear
    pub fn bank_changed(&self) -> bool {
        self.bank_changed.take()
    }

    pub fn bank_changed_flag(&self) -> Arc<EdgeFlag> {
        Arc::clone(&self.bank_changed)
    }
}

impl Default for CcMapper {
    fn default() -> Self {
        Self::new()
    }
}
