//! Synthetic flight and the sensors riding on it.

use flight_log_core::Vec3;

/// Standard gravity in m/s²
pub const GRAVITY: f32 = 9.806_65;

/// Sea-level standard pressure in Pa
pub const SEA_LEVEL_PRESSURE_PA: f32 = 101_325.0;

/// Sea-level standard temperature in °C
const SEA_LEVEL_TEMPERATURE_C: f32 = 15.0;

/// Tropospheric temperature lapse rate in °C/m
const LAPSE_RATE: f32 = 0.0065;

/// Motor burn time in seconds
const BURN_TIME_S: f32 = 3.0;

/// Net upward acceleration while the motor burns, m/s²
const BOOST_ACCEL: f32 = 60.0;

/// Terminal descent rate under the main chute, m/s
const DESCENT_RATE: f32 = 6.0;

/// Barometric altitude in metres from pressure and ambient temperature.
pub fn pressure_to_altitude(pressure_pa: f32, temperature_c: f32) -> f32 {
    let pressure_ratio = (pressure_pa / 100.0) / 1013.25;
    let temperature_ratio = (temperature_c + 273.15) / 288.15;

    44330.0 * (1.0 - pressure_ratio.powf(0.1903)) * temperature_ratio.powf(-0.03416)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Boost,
    Coast,
    Descent,
    Landed,
}

/// Point-mass vertical flight: powered ascent, ballistic coast to apogee,
/// then a constant-rate descent under canopy.
#[derive(Debug, Clone)]
pub struct SyntheticFlight {
    elapsed_s: f32,
    altitude_m: f32,
    velocity_ms: f32,
    phase: FlightPhase,
}

impl Default for SyntheticFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticFlight {
    pub fn new() -> Self {
        Self {
            elapsed_s: 0.0,
            altitude_m: 0.0,
            velocity_ms: 0.0,
            phase: FlightPhase::Boost,
        }
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn altitude(&self) -> f32 {
        self.altitude_m
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed_s
    }

    /// Kinematic acceleration for the current phase (positive up).
    fn acceleration(&self) -> f32 {
        match self.phase {
            FlightPhase::Boost => BOOST_ACCEL,
            FlightPhase::Coast => -GRAVITY,
            FlightPhase::Descent | FlightPhase::Landed => 0.0,
        }
    }

    /// Advance the flight by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.elapsed_s += dt;

        match self.phase {
            FlightPhase::Boost | FlightPhase::Coast => {
                self.velocity_ms += self.acceleration() * dt;
                self.altitude_m += self.velocity_ms * dt;
            }
            FlightPhase::Descent => {
                self.velocity_ms = -DESCENT_RATE;
                self.altitude_m = (self.altitude_m - DESCENT_RATE * dt).max(0.0);
            }
            FlightPhase::Landed => {
                self.velocity_ms = 0.0;
            }
        }

        self.phase = match self.phase {
            FlightPhase::Boost if self.elapsed_s >= BURN_TIME_S => FlightPhase::Coast,
            FlightPhase::Coast if self.velocity_ms <= 0.0 => FlightPhase::Descent,
            FlightPhase::Descent if self.altitude_m <= 0.0 => FlightPhase::Landed,
            phase => phase,
        };
    }

    /// Specific force along the body axes, as an accelerometer would see it.
    pub fn accelerometer(&self) -> Vec3 {
        let t = self.elapsed_s;
        let vibration = match self.phase {
            FlightPhase::Boost => 0.8 * (t * 900.0).sin(),
            _ => 0.02 * (t * 50.0).sin(),
        };
        let specific_force = match self.phase {
            // Free fall reads zero
            FlightPhase::Coast => 0.0,
            _ => self.acceleration() + GRAVITY,
        };

        Vec3::new(
            0.05 * (t * 3.0).sin(),
            0.05 * (t * 2.0).cos(),
            specific_force + vibration,
        )
    }

    /// Roll rate spins up during boost and decays afterwards, in rad/s.
    pub fn gyroscope(&self) -> Vec3 {
        let t = self.elapsed_s;
        let roll = match self.phase {
            FlightPhase::Boost => 2.0 * t / BURN_TIME_S,
            FlightPhase::Coast => 2.0 * (-(t - BURN_TIME_S) / 4.0).exp(),
            FlightPhase::Descent => 0.3 * (t * 0.7).sin(),
            FlightPhase::Landed => 0.0,
        };

        Vec3::new(0.01 * (t * 5.0).sin(), 0.01 * (t * 4.0).cos(), roll)
    }

    /// Earth field in µT, rotating with the roll angle.
    pub fn magnetometer(&self) -> Vec3 {
        let angle = self.elapsed_s * 0.5;
        Vec3::new(22.0 * angle.cos(), 22.0 * angle.sin(), -42.0)
    }

    /// Ambient temperature in °C from the standard lapse rate.
    pub fn temperature(&self) -> f32 {
        SEA_LEVEL_TEMPERATURE_C - LAPSE_RATE * self.altitude_m
    }

    /// Static pressure in Pa for the current altitude.
    pub fn pressure(&self) -> f32 {
        SEA_LEVEL_PRESSURE_PA * (1.0 - 2.255_77e-5 * self.altitude_m).powf(5.255_88)
    }
}
