pub const THROTTLE_MIN: f64 = 0.0;
pub const THROTTLE_MAX: f64 = 100.0;
pub const GEAR_NEUTRAL: u8 = 0;
pub const GEAR_MAX: u8 = 5;

pub const DEFAULT_THROTTLE: f64 = 50.0;
pub const DEFAULT_GEAR: u8 = 3;

/// Operator-selected engine operating point.
///
/// Both fields are always in range. Values are replaced wholesale through
/// [`InputState::with_throttle`] and [`InputState::with_gear`], which clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputState {
    throttle_position: f64,
    gear: u8,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            throttle_position: DEFAULT_THROTTLE,
            gear: DEFAULT_GEAR,
        }
    }
}

impl InputState {
    pub fn new(throttle_position: f64, gear: i64) -> Self {
        Self::default()
            .with_throttle(throttle_position)
            .with_gear(gear)
    }

    pub fn throttle_position(&self) -> f64 {
        self.throttle_position
    }

    pub fn gear(&self) -> u8 {
        self.gear
    }

    pub fn is_neutral(&self) -> bool {
        self.gear == GEAR_NEUTRAL
    }

    /// NaN leaves the throttle untouched.
    pub fn with_throttle(self, value: f64) -> Self {
        if value.is_nan() {
            return self;
        }
        // Adding positive zero turns -0.0 into 0.0.
        Self {
            throttle_position: value.clamp(THROTTLE_MIN, THROTTLE_MAX) + 0.0,
            ..self
        }
    }

    pub fn with_gear(self, value: i64) -> Self {
        Self {
            gear: value.clamp(i64::from(GEAR_NEUTRAL), i64::from(GEAR_MAX)) as u8,
            ..self
        }
    }
}
