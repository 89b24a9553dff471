//! Stepper state machine
//!
//! Position is tracked in 1/8 microsteps over one electrical cycle of four
//! full steps, so it always lies in `0..32`. Full steps sit on multiples of
//! 8 and half steps on multiples of 4.
//!
//! Each call to [`StepperState::advance`] moves the position for the chosen
//! style and returns the [`Phase`] to put on the bridge: a duty for each
//! coil's PWM input and a level for each of the four direction inputs.
//!
//! Coil pattern table (index = position / 4):
//!
//! | Index | AIN2 | BIN1 | AIN1 | BIN2 |
//! |-------|------|------|------|------|
//! | 0     | 1    | 0    | 0    | 0    |
//! | 1     | 1    | 1    | 0    | 0    |
//! | 2     | 0    | 1    | 0    | 0    |
//! | 3     | 0    | 1    | 1    | 0    |
//! | 4     | 0    | 0    | 1    | 0    |
//! | 5     | 0    | 0    | 1    | 1    |
//! | 6     | 0    | 0    | 0    | 1    |
//! | 7     | 1    | 0    | 0    | 1    |

use super::command::{Direction, PinLevel, StepStyle};

/// Microsteps per full step
pub const MICROSTEPS: u8 = 8;

/// Positions in one electrical cycle (4 full steps)
pub const POSITIONS: u8 = MICROSTEPS * 4;

/// Duty curve for one quadrant of microstepping (quarter sine, 0-255)
pub const MICROSTEP_CURVE: [u8; MICROSTEPS as usize + 1] = [0, 50, 98, 142, 180, 212, 236, 250, 255];

/// Default full steps per revolution (1.8 degree motors)
pub const DEFAULT_STEPS_PER_REVOLUTION: u16 = 200;

/// Default speed in RPM
pub const DEFAULT_RPM: u16 = 30;

/// Highest accepted speed in RPM
pub const MAX_RPM: u16 = 255;

const HALF: i16 = (MICROSTEPS / 2) as i16;
const FULL: i16 = MICROSTEPS as i16;

/// Full duty on both coils
const FULL_TORQUE: [u8; 2] = [255, 255];

const L: PinLevel = PinLevel::Low;
const H: PinLevel = PinLevel::High;

/// Single/double/interleave patterns, indexed by position / 4
const STEP_COILS: [[PinLevel; 4]; 8] = [
    [H, L, L, L],
    [H, H, L, L],
    [L, H, L, L],
    [L, H, H, L],
    [L, L, H, L],
    [L, L, H, H],
    [L, L, L, H],
    [H, L, L, H],
];

/// Microstep patterns, indexed by quadrant (position / 8)
const MICROSTEP_COILS: [[PinLevel; 4]; 4] = [
    [H, H, L, L],
    [L, H, H, L],
    [L, L, H, H],
    [H, L, L, H],
];

/// Bridge settings for one stepper position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Phase {
    /// Position after the step (0-31)
    pub position: u8,
    /// 8-bit duty for coil A and coil B PWM inputs
    pub duty: [u8; 2],
    /// Levels for AIN2, BIN1, AIN1, BIN2
    pub coils: [PinLevel; 4],
}

impl Phase {
    /// Both coils de-energized
    pub const fn released(position: u8) -> Self {
        Self {
            position,
            duty: [0, 0],
            coils: [L, L, L, L],
        }
    }
}

/// Timing of a `step` request after style adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepPlan {
    /// Number of `advance` calls before settling
    pub invocations: u32,
    /// Delay after each call, in microseconds
    pub interval_us: u32,
}

/// Microstep duty pair for a position
///
/// Within each quadrant one coil follows the curve up while the other
/// follows it down, so the pair always sums two complementary entries.
pub fn microstep_duty(position: u8) -> [u8; 2] {
    let p = position % POSITIONS;
    let offset = (p % MICROSTEPS) as usize;
    let rising = MICROSTEP_CURVE[offset];
    let falling = MICROSTEP_CURVE[MICROSTEPS as usize - offset];

    match p / MICROSTEPS {
        0 | 2 => [falling, rising],
        _ => [rising, falling],
    }
}

/// Direction-pin levels for a position and style
pub fn coil_pattern(position: u8, style: StepStyle) -> [PinLevel; 4] {
    let p = position % POSITIONS;
    match style {
        StepStyle::Microstep => MICROSTEP_COILS[(p / MICROSTEPS) as usize],
        _ => STEP_COILS[(p / (MICROSTEPS / 2)) as usize],
    }
}

/// Open-loop stepper position and timing
#[derive(Debug, Clone)]
pub struct StepperState {
    position: u8,
    steps_per_revolution: u16,
    rpm: u16,
    us_per_step: u32,
    coast_on_reverse_microstep: bool,
}

impl StepperState {
    /// New stepper at position 0 running at [`DEFAULT_RPM`]
    ///
    /// A zero step count is treated as one step per revolution.
    pub fn new(steps_per_revolution: u16) -> Self {
        let mut state = Self {
            position: 0,
            steps_per_revolution: steps_per_revolution.max(1),
            rpm: DEFAULT_RPM,
            us_per_step: 0,
            coast_on_reverse_microstep: false,
        };
        state.set_speed(DEFAULT_RPM as i32);
        state
    }

    /// Zero both coil duties on backward microsteps
    ///
    /// Off by default. When set, a backward microstep lets the rotor coast
    /// for that sub-step instead of applying the curve.
    pub fn set_coast_on_reverse_microstep(&mut self, coast: bool) {
        self.coast_on_reverse_microstep = coast;
    }

    /// Current position (0-31)
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Configured full steps per revolution
    pub fn steps_per_revolution(&self) -> u16 {
        self.steps_per_revolution
    }

    /// Current speed in RPM
    pub fn rpm(&self) -> u16 {
        self.rpm
    }

    /// Full-step period in microseconds
    pub fn us_per_step(&self) -> u32 {
        self.us_per_step
    }

    /// Full-step period in seconds
    pub fn seconds_per_step(&self) -> f32 {
        self.us_per_step as f32 / 1_000_000.0
    }

    /// Set the speed in RPM
    ///
    /// Clamps to `1..=255` and returns the applied value.
    pub fn set_speed(&mut self, rpm: i32) -> u16 {
        let rpm = rpm.clamp(1, MAX_RPM as i32) as u16;
        self.rpm = rpm;
        // 60 s per minute, in microseconds
        self.us_per_step = 60_000_000 / (self.steps_per_revolution as u32 * rpm as u32);
        rpm
    }

    /// Whether the rotor sits on a full-step position
    pub fn at_full_step(&self) -> bool {
        self.position % MICROSTEPS == 0
    }

    /// Per-call timing for a `steps` request in `style`
    pub fn plan(&self, steps: u32, style: StepStyle) -> StepPlan {
        match style {
            StepStyle::Single | StepStyle::Double => StepPlan {
                invocations: steps,
                interval_us: self.us_per_step,
            },
            StepStyle::Interleave => StepPlan {
                invocations: steps,
                interval_us: self.us_per_step / 2,
            },
            StepStyle::Microstep => StepPlan {
                invocations: steps.saturating_mul(MICROSTEPS as u32),
                interval_us: self.us_per_step / MICROSTEPS as u32,
            },
        }
    }

    /// Move one step unit of `style` and return the new bridge phase
    pub fn advance(&mut self, direction: Direction, style: StepStyle) -> Phase {
        let sign = direction.sign() as i16;
        let mut pos = self.position as i16;
        let mut coast = false;

        match style {
            StepStyle::Single => {
                // Realign from a double-coil position first
                if (pos / HALF) % 2 == 1 {
                    pos += sign * HALF;
                }
                pos += sign * FULL;
            }
            StepStyle::Double => {
                // Realign from a single-coil position first
                if (pos / HALF) % 2 == 0 {
                    pos += sign * HALF;
                }
                pos += sign * FULL;
            }
            StepStyle::Interleave => {
                pos += sign * HALF;
            }
            StepStyle::Microstep => {
                pos += sign;
                coast = direction == Direction::Backward && self.coast_on_reverse_microstep;
            }
        }

        self.position = pos.rem_euclid(POSITIONS as i16) as u8;

        let duty = match style {
            StepStyle::Microstep if coast => [0, 0],
            StepStyle::Microstep => microstep_duty(self.position),
            _ => FULL_TORQUE,
        };

        Phase {
            position: self.position,
            duty,
            coils: coil_pattern(self.position, style),
        }
    }
}

impl Default for StepperState {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS_PER_REVOLUTION)
    }
}
