//! Combines independently clocked sensor channels into time-aligned records.

use heapless::Vec;

use crate::Tick;
use crate::channel::{Channel, ChannelSet, Quantity, Reading};

/// Most fields a record can hold: the width of every channel together
pub const MAX_FIELDS: usize = {
    let mut total = 0;
    let mut i = 0;
    while i < Channel::COUNT {
        total += Channel::ALL[i].width();
        i += 1;
    }
    total
};

/// When a combined record is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitPolicy {
    /// Emit only once every tracked channel has a fresh observation.
    ///
    /// A channel that never reports blocks emission forever. Records are
    /// always fully aligned.
    Gate,
    /// Emit on every call, reusing the last known value for channels that
    /// did not update. Values are zero until first observed.
    #[default]
    AlwaysEmit,
}

/// Latest value of one channel plus whether it is unconsumed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorChannel {
    pub value: Reading,
    pub fresh: bool,
}

/// One numeric field of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub value: f32,
    pub quantity: Quantity,
}

/// A single emitted row: timestamp plus every tracked channel's value.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    pub timestamp: Tick,
    pub fields: Vec<Field, MAX_FIELDS>,
}

pub struct SampleAggregator {
    policy: EmitPolicy,
    tracked: ChannelSet,
    slots: [SensorChannel; Channel::COUNT],
}

impl SampleAggregator {
    pub const fn new(tracked: ChannelSet, policy: EmitPolicy) -> Self {
        Self {
            policy,
            tracked,
            slots: [SensorChannel {
                value: Reading::ZERO,
                fresh: false,
            }; Channel::COUNT],
        }
    }

    pub const fn policy(&self) -> EmitPolicy {
        self.policy
    }

    pub const fn tracked(&self) -> ChannelSet {
        self.tracked
    }

    pub fn channel(&self, channel: Channel) -> &SensorChannel {
        &self.slots[channel.index()]
    }

    /// Store the latest value of a channel and mark it fresh.
    ///
    /// Plausibility is the driver's concern; the value is kept as-is.
    pub fn observe(&mut self, channel: Channel, value: impl Into<Reading>) {
        let slot = &mut self.slots[channel.index()];
        slot.value = value.into();
        slot.fresh = true;
    }

    /// Whether every tracked channel has been observed since the last emission.
    pub fn all_fresh(&self) -> bool {
        self.tracked.iter().all(|c| self.slots[c.index()].fresh)
    }

    /// Build a record if the policy allows it, consuming freshness.
    pub fn try_emit(&mut self, timestamp: Tick) -> Option<CombinedRecord> {
        if self.policy == EmitPolicy::Gate && !self.all_fresh() {
            return None;
        }

        let mut fields = Vec::new();
        for channel in self.tracked.iter() {
            let slot = &mut self.slots[channel.index()];
            let quantity = channel.quantity();
            for &value in &slot.value.components()[..channel.width()] {
                // MAX_FIELDS is the width of every channel at once
                let _ = fields.push(Field { value, quantity });
            }
            slot.fresh = false;
        }

        Some(CombinedRecord { timestamp, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Vec3;

    fn values(record: &CombinedRecord) -> std::vec::Vec<f32> {
        record.fields.iter().map(|f| f.value).collect()
    }

    #[test]
    fn test_gate_waits_for_every_tracked_channel() {
        let mut agg = SampleAggregator::new(ChannelSet::INERTIAL, EmitPolicy::Gate);

        agg.observe(Channel::Gyroscope, Vec3::new(0.1, 0.2, 0.3));
        assert!(agg.try_emit(10).is_none());
        agg.observe(Channel::Magnetometer, Vec3::new(20.0, -5.0, 40.0));
        assert!(agg.try_emit(20).is_none());
        agg.observe(Channel::Accelerometer, Vec3::new(0.0, 0.0, 9.81));

        let record = agg.try_emit(30).expect("all channels fresh");
        assert_eq!(record.timestamp, 30);
        assert_eq!(
            values(&record),
            [0.0, 0.0, 9.81, 0.1, 0.2, 0.3, 20.0, -5.0, 40.0]
        );

        // Flags were consumed, nothing is emitted until all update again
        assert!(agg.try_emit(40).is_none());
        agg.observe(Channel::Accelerometer, Vec3::new(1.0, 1.0, 1.0));
        agg.observe(Channel::Gyroscope, Vec3::new(1.0, 1.0, 1.0));
        assert!(agg.try_emit(50).is_none());
        agg.observe(Channel::Magnetometer, Vec3::new(1.0, 1.0, 1.0));
        assert!(agg.try_emit(60).is_some());
    }

    #[test]
    fn test_gate_ignores_untracked_channels() {
        let mut agg = SampleAggregator::new(ChannelSet::BAROMETRIC, EmitPolicy::Gate);

        agg.observe(Channel::Accelerometer, Vec3::new(1.0, 2.0, 3.0));
        agg.observe(Channel::Pressure, 101_325.0);
        assert!(agg.try_emit(1).is_none());
        agg.observe(Channel::Altitude, 12.5);

        let record = agg.try_emit(2).expect("barometric channels fresh");
        assert_eq!(values(&record), [101_325.0, 12.5]);
        assert_eq!(record.fields[0].quantity, Quantity::Pressure);
        assert_eq!(record.fields[1].quantity, Quantity::Altitude);
        // The untracked accelerometer was not consumed
        assert!(agg.channel(Channel::Accelerometer).fresh);
    }

    #[test]
    fn test_gate_repeated_updates_of_one_channel_do_not_satisfy_others() {
        let mut agg = SampleAggregator::new(ChannelSet::INERTIAL, EmitPolicy::Gate);
        for i in 0..10 {
            agg.observe(Channel::Accelerometer, Vec3::new(i as f32, 0.0, 0.0));
            assert!(agg.try_emit(i).is_none());
        }
    }

    #[test]
    fn test_always_emit_yields_one_record_per_call() {
        let mut agg = SampleAggregator::new(ChannelSet::INERTIAL, EmitPolicy::AlwaysEmit);
        let mut records = std::vec::Vec::new();

        for tick in 0..25u64 {
            if tick % 2 == 0 {
                agg.observe(Channel::Accelerometer, Vec3::new(tick as f32, 0.0, 0.0));
            }
            if tick % 5 == 0 {
                agg.observe(Channel::Magnetometer, Vec3::new(0.0, tick as f32, 0.0));
            }
            records.push(agg.try_emit(tick).expect("always emits"));
        }

        assert_eq!(records.len(), 25);
        // Tick 7: accel last updated at 6, mag at 5, gyro never
        assert_eq!(
            values(&records[7]),
            [6.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 0.0]
        );
        assert_eq!(records[24].timestamp, 24);
        assert_eq!(values(&records[24])[0], 24.0);
        assert_eq!(values(&records[24])[7], 20.0);
    }

    #[test]
    fn test_record_capacity_covers_every_channel() {
        assert_eq!(MAX_FIELDS, ChannelSet::ALL.field_count());
        assert_eq!(MAX_FIELDS, 12);
    }

    #[test]
    fn test_always_emit_clears_freshness() {
        let mut agg = SampleAggregator::new(ChannelSet::ALL, EmitPolicy::AlwaysEmit);
        agg.observe(Channel::Temperature, 21.5);
        assert!(agg.channel(Channel::Temperature).fresh);

        let record = agg.try_emit(0).unwrap();
        assert_eq!(record.fields.len(), MAX_FIELDS);
        assert!(!agg.channel(Channel::Temperature).fresh);
        assert_eq!(agg.channel(Channel::Temperature).value, Reading::from(21.5));
    }
}
