use serde::Serialize;

/// A fader snaps back into control once it is this close to the stored value
pub const PICKUP_TOLERANCE: u8 = 3;

/// Physical fader tracking with soft takeover.
///
/// While not picked up the logical value is frozen; moving the fader does
/// nothing until it passes within [`PICKUP_TOLERANCE`] of the logical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaderState {
    pub physical_value: u8,
    pub logical_value: u8,
    pub picked_up: bool,
    pub needs_pickup: bool,
}

impl FaderState {
    pub fn new() -> Self {
        Self {
            physical_value: 64,
            logical_value: 64,
            picked_up: true,
            needs_pickup: false,
        }
    }

    /// Feed a new physical position. Returns true when the value should be
    /// applied to the target.
    pub fn update(&mut self, physical: u8) -> bool {
        self.physical_value = physical;

        if self.picked_up {
            self.logical_value = physical;
            return true;
        }

        if physical.abs_diff(self.logical_value) <= PICKUP_TOLERANCE {
            self.picked_up = true;
            self.needs_pickup = false;
            self.logical_value = physical;
            return true;
        }

        false
    }

    pub fn require_pickup(&mut self) {
        self.picked_up = false;
        self.needs_pickup = true;
    }

    /// Sync the stored value with the parameter when it changes elsewhere
    pub fn set_logical_value(&mut self, value: u8) {
        self.logical_value = value;
    }
}

impl Default for FaderState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_picked_up_at_center() {
        let mut f = FaderState::new();
        assert!(f.update(0));
        assert_eq!(f.logical_value, 0);
    }

    #[test]
    fn frozen_until_within_tolerance() {
        let mut f = FaderState::new();
        f.require_pickup();
        for v in [0, 10, 60, 127, 68] {
            assert!(!f.update(v));
            assert_eq!(f.logical_value, 64);
            assert!(f.needs_pickup);
        }
        assert!(f.update(67));
        assert!(f.picked_up);
        assert!(!f.needs_pickup);
        assert_eq!(f.logical_value, 67);
    }

    #[test]
    fn stays_picked_up_until_required_again() {
        let mut f = FaderState::new();
        f.require_pickup();
        assert!(f.update(62));
        for v in [0, 127, 5, 90] {
            assert!(f.update(v));
            assert_eq!(f.logical_value, v);
        }
        f.require_pickup();
        assert!(!f.update(0));
    }

    #[test]
    fn logical_sync_moves_pickup_target() {
        let mut f = FaderState::new();
        f.require_pickup();
        f.set_logical_value(100);
        assert!(!f.update(66));
        assert!(f.update(98));
    }
}
