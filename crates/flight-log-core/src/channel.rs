//! Sensor channels and the values they carry.

/// Three-axis reading in sensor frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// A value reported by a sensor driver.
///
/// Scalar channels only look at the first component, so a scalar is stored
/// as `[value, 0, 0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading([f32; 3]);

impl Reading {
    pub const ZERO: Self = Self([0.0; 3]);

    pub const fn components(&self) -> [f32; 3] {
        self.0
    }
}

impl From<Vec3> for Reading {
    fn from(v: Vec3) -> Self {
        Self([v.x, v.y, v.z])
    }
}

impl From<[f32; 3]> for Reading {
    fn from(v: [f32; 3]) -> Self {
        Self(v)
    }
}

impl From<f32> for Reading {
    fn from(v: f32) -> Self {
        Self([v, 0.0, 0.0])
    }
}

/// Physical quantity of a logged field. Selects the rendered precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// m/s²
    Acceleration,
    /// rad/s
    AngularRate,
    /// µT
    MagneticField,
    /// °C
    Temperature,
    /// Pa
    Pressure,
    /// m
    Altitude,
}

/// One named sensor quantity tracked independently for freshness.
///
/// The declaration order is the column order of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Temperature,
    Pressure,
    Altitude,
}

impl Channel {
    pub const COUNT: usize = 6;

    pub const ALL: [Channel; Self::COUNT] = [
        Self::Accelerometer,
        Self::Gyroscope,
        Self::Magnetometer,
        Self::Temperature,
        Self::Pressure,
        Self::Altitude,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn quantity(self) -> Quantity {
        match self {
            Self::Accelerometer => Quantity::Acceleration,
            Self::Gyroscope => Quantity::AngularRate,
            Self::Magnetometer => Quantity::MagneticField,
            Self::Temperature => Quantity::Temperature,
            Self::Pressure => Quantity::Pressure,
            Self::Altitude => Quantity::Altitude,
        }
    }

    /// Column names contributed to the CSV header, in field order.
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Accelerometer => &["accel_x", "accel_y", "accel_z"],
            Self::Gyroscope => &["gyro_x", "gyro_y", "gyro_z"],
            Self::Magnetometer => &["mag_x", "mag_y", "mag_z"],
            Self::Temperature => &["temp_c"],
            Self::Pressure => &["pressure_pa"],
            Self::Altitude => &["altitude_m"],
        }
    }

    /// Number of fields this channel contributes to a record (3 or 1).
    pub const fn width(self) -> usize {
        self.columns().len()
    }
}

/// Set of tracked channels, iterated in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSet(u8);

impl ChannelSet {
    pub const EMPTY: Self = Self(0);
    pub const INERTIAL: Self = Self(0b000_0111);
    pub const BAROMETRIC: Self = Self(0b011_0000);
    pub const ALL: Self = Self(0b011_1111);

    pub const fn with(self, channel: Channel) -> Self {
        Self(self.0 | (1 << channel.index()))
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & (1 << channel.index()) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Total number of record fields for the tracked channels, timestamp excluded.
    pub fn field_count(self) -> usize {
        self.iter().map(Channel::width).sum()
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        Self::EMPTY.with(channel)
    }
}
