//! Holder for the operator's current throttle/gear selection.

use shared::domain::InputState;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct InputStateHolder {
    current: InputState,
}

impl InputStateHolder {
    pub fn new(initial: InputState) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> InputState {
        self.current
    }

    pub fn set_throttle(&mut self, value: f64) -> InputState {
        if value.is_nan() {
            warn!("ignoring non-numeric throttle value");
            return self.current;
        }
        self.current = self.current.with_throttle(value);
        debug!(
            requested = value,
            throttle_pos = self.current.throttle_position(),
            "throttle updated"
        );
        self.current
    }

    pub fn set_gear(&mut self, value: i64) -> InputState {
        self.current = self.current.with_gear(value);
        debug!(requested = value, gear = self.current.gear(), "gear updated");
        self.current
    }
}
