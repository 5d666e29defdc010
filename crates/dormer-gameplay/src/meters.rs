//! Sleep and wellness meters shown as HUD bars.
//!
//! Sleep drains by a fixed amount once per decay interval. Wellness only
//! drops when the player exerts themselves.

use serde::{Deserialize, Serialize};

/// Starting and maximum meter value.
pub const METER_MAX: f32 = 100.0;

/// Seconds between sleep decay ticks.
pub const DEFAULT_DECAY_INTERVAL: f32 = 1.0;

/// Sleep lost per decay tick.
pub const DEFAULT_SLEEP_DECAY: f32 = 1.0;

/// Wellness lost per exertion.
pub const DEFAULT_EXERT_COST: f32 = 10.0;

/// Status band of a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeterStatus {
    /// 80-100%
    Full,
    /// 50-79%
    Satisfied,
    /// 20-49%
    Low,
    /// 1-19%
    Critical,
    /// 0%
    Depleted,
}

impl MeterStatus {
    /// Returns status from percentage (0.0-1.0).
    #[must_use]
    pub fn from_percentage(pct: f32) -> Self {
        match pct {
            p if p <= 0.0 => Self::Depleted,
            p if p < 0.2 => Self::Critical,
            p if p < 0.5 => Self::Low,
            p if p < 0.8 => Self::Satisfied,
            _ => Self::Full,
        }
    }
}

/// A single meter with current and max values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meter {
    /// Current value (0.0 to max)
    current: f32,
    /// Maximum value
    max: f32,
    /// Amount removed by each decay tick
    decay_per_tick: f32,
    /// Display name
    name: String,
}

impl Meter {
    /// Creates a full meter.
    #[must_use]
    pub fn new(name: impl Into<String>, max: f32, decay_per_tick: f32) -> Self {
        Self {
            current: max,
            max,
            decay_per_tick,
            name: name.into(),
        }
    }

    /// Returns the meter's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns current value.
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Returns max value.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Returns value as percentage (0.0-1.0).
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    /// Returns the current status band.
    #[must_use]
    pub fn status(&self) -> MeterStatus {
        MeterStatus::from_percentage(self.percentage())
    }

    /// Applies one decay tick, floored at zero.
    pub fn tick(&mut self) {
        self.deplete(self.decay_per_tick);
    }

    /// Restores by the given amount, capped at max.
    pub fn restore(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Depletes by the given amount, floored at zero.
    pub fn deplete(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    /// Sets current value directly.
    pub fn set(&mut self, value: f32) {
        self.current = value.clamp(0.0, self.max);
    }

    /// Checks if depleted (0).
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Tunables for the meters, loaded from the engine config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterSettings {
    /// Initial sleep value
    pub sleep_start: f32,
    /// Initial wellness value
    pub wellness_start: f32,
    /// Seconds between decay ticks
    pub decay_interval_secs: f32,
    /// Sleep lost per tick
    pub sleep_decay: f32,
    /// Wellness lost per exertion
    pub exert_cost: f32,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            sleep_start: METER_MAX,
            wellness_start: METER_MAX,
            decay_interval_secs: DEFAULT_DECAY_INTERVAL,
            sleep_decay: DEFAULT_SLEEP_DECAY,
            exert_cost: DEFAULT_EXERT_COST,
        }
    }
}

/// Bar widths in logical pixels; each bar is as wide as its meter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterReadout {
    /// Sleep bar width
    pub sleep_px: f32,
    /// Wellness bar width
    pub wellness_px: f32,
}

/// The two HUD meters and their decay clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meters {
    /// Sleep meter (drains over time)
    pub sleep: Meter,
    /// Wellness meter (drains on exertion)
    pub wellness: Meter,
    /// Seconds between decay ticks
    decay_interval: f32,
    /// Wellness lost per exertion
    exert_cost: f32,
    /// Time since the last decay tick
    elapsed: f32,
}

impl Default for Meters {
    fn default() -> Self {
        Self::from_settings(&MeterSettings::default())
    }
}

impl Meters {
    /// Creates meters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates meters from config settings.
    #[must_use]
    pub fn from_settings(settings: &MeterSettings) -> Self {
        let mut sleep = Meter::new("Sleep", METER_MAX, settings.sleep_decay);
        sleep.set(settings.sleep_start);
        let mut wellness = Meter::new("Wellness", METER_MAX, 0.0);
        wellness.set(settings.wellness_start);

        Self {
            sleep,
            wellness,
            decay_interval: settings.decay_interval_secs.max(0.001),
            exert_cost: settings.exert_cost,
            elapsed: 0.0,
        }
    }

    /// Advances the decay clock. Returns the number of ticks applied.
    pub fn update(&mut self, delta_seconds: f32) -> u32 {
        self.elapsed += delta_seconds;
        let mut ticks = 0;
        while self.elapsed >= self.decay_interval {
            self.elapsed -= self.decay_interval;
            self.sleep.tick();
            ticks += 1;
        }
        ticks
    }

    /// Drains wellness by the exertion cost.
    pub fn exert(&mut self) {
        self.wellness.deplete(self.exert_cost);
    }

    /// Current bar widths.
    #[must_use]
    pub fn readout(&self) -> MeterReadout {
        MeterReadout {
            sleep_px: self.sleep.current(),
            wellness_px: self.wellness.current(),
        }
    }

    /// Seconds between decay ticks.
    #[must_use]
    pub fn decay_interval(&self) -> f32 {
        self.decay_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_meters_start_full() {
        let meters = Meters::new();
        assert_eq!(meters.sleep.current(), 100.0);
        assert_eq!(meters.wellness.current(), 100.0);
        assert_eq!(meters.sleep.status(), MeterStatus::Full);
    }

    #[test]
    fn test_sleep_decays_once_per_second() {
        let mut meters = Meters::new();

        assert_eq!(meters.update(0.5), 0);
        assert_eq!(meters.sleep.current(), 100.0);

        assert_eq!(meters.update(0.5), 1);
        assert_eq!(meters.sleep.current(), 99.0);
        assert_eq!(meters.wellness.current(), 100.0);
    }

    #[test]
    fn test_long_frame_applies_several_ticks() {
        let mut meters = Meters::new();
        assert_eq!(meters.update(3.5), 3);
        assert_eq!(meters.sleep.current(), 97.0);
    }

    #[test]
    fn test_sleep_floors_at_zero() {
        let mut meters = Meters::new();
        meters.update(250.0);
        assert_eq!(meters.sleep.current(), 0.0);
        assert!(meters.sleep.is_depleted());
    }

    #[test]
    fn test_exert_drains_wellness() {
        let mut meters = Meters::new();
        meters.exert();
        assert_eq!(meters.wellness.current(), 90.0);

        for _ in 0..20 {
            meters.exert();
        }
        assert_eq!(meters.wellness.current(), 0.0);
    }

    #[test]
    fn test_readout_matches_values() {
        let mut meters = Meters::new();
        meters.update(5.0);
        meters.exert();

        let readout = meters.readout();
        assert_eq!(readout.sleep_px, 95.0);
        assert_eq!(readout.wellness_px, 90.0);
    }

    #[test]
    fn test_custom_settings() {
        let settings = MeterSettings {
            sleep_start: 50.0,
            wellness_start: 20.0,
            decay_interval_secs: 0.5,
            sleep_decay: 2.0,
            exert_cost: 5.0,
        };
        let mut meters = Meters::from_settings(&settings);
        meters.update(1.0);
        meters.exert();

        assert_eq!(meters.sleep.current(), 46.0);
        assert_eq!(meters.wellness.current(), 15.0);
    }

    #[test]
    fn test_meter_restore_caps_at_max() {
        let mut meter = Meter::new("Test", 100.0, 1.0);
        meter.deplete(30.0);
        meter.restore(100.0);
        assert_eq!(meter.current(), 100.0);
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(MeterStatus::from_percentage(1.0), MeterStatus::Full);
        assert_eq!(MeterStatus::from_percentage(0.6), MeterStatus::Satisfied);
        assert_eq!(MeterStatus::from_percentage(0.3), MeterStatus::Low);
        assert_eq!(MeterStatus::from_percentage(0.1), MeterStatus::Critical);
        assert_eq!(MeterStatus::from_percentage(0.0), MeterStatus::Depleted);
    }

    proptest! {
        #[test]
        fn prop_meters_stay_in_range(frames in proptest::collection::vec(0.0f32..5.0, 0..64), exerts in 0usize..30) {
            let mut meters = Meters::new();
            for dt in frames {
                meters.update(dt);
            }
            for _ in 0..exerts {
                meters.exert();
            }
            prop_assert!((0.0..=100.0).contains(&meters.sleep.current()));
            prop_assert!((0.0..=100.0).contains(&meters.wellness.current()));
        }
    }
}
