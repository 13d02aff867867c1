//! Day/night clock and fixed-step tick accumulation.
//!
//! The clock runs on a 24-hour dial that wraps at midnight. A full day takes a
//! configurable number of real seconds; the dial starts at 6 AM. Phase,
//! darkness and tint are pure functions of the current hour so a renderer can
//! query them every frame without touching simulation state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hour the clock shows when a world is created.
pub const START_HOUR: f64 = 6.0;
/// Darkness at full night.
pub const NIGHT_DARKNESS: f64 = 0.75;

/// Coarse time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    /// 05:00 to 07:00
    Dawn,
    /// 07:00 to 18:00
    Day,
    /// 18:00 to 20:00
    Dusk,
    /// 20:00 to 05:00
    Night,
}

impl DayPhase {
    pub fn from_hour(hour: f64) -> Self {
        if (5.0..7.0).contains(&hour) {
            DayPhase::Dawn
        } else if (7.0..18.0).contains(&hour) {
            DayPhase::Day
        } else if (18.0..20.0).contains(&hour) {
            DayPhase::Dusk
        } else {
            DayPhase::Night
        }
    }

    /// Overlay colour for the phase.
    pub fn tint(self) -> Rgba {
        match self {
            DayPhase::Day => Rgba::new(255, 255, 255, 0.0),
            DayPhase::Night => Rgba::new(20, 30, 60, 0.6),
            DayPhase::Dawn => Rgba::new(150, 100, 180, 0.3),
            DayPhase::Dusk => Rgba::new(200, 100, 50, 0.4),
        }
    }
}

impl fmt::Display for DayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayPhase::Dawn => "dawn",
            DayPhase::Day => "day",
            DayPhase::Dusk => "dusk",
            DayPhase::Night => "night",
        };
        f.write_str(name)
    }
}

/// Overlay colour with a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// 24-hour dial advanced by real seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayClock {
    hour: f64,
    day_length_secs: f64,
}

impl DayClock {
    /// Clock at 6 AM where a full day lasts `day_length_secs`.
    /// Non-positive lengths are clamped to one second.
    pub fn new(day_length_secs: f64) -> Self {
        Self {
            hour: START_HOUR,
            day_length_secs: day_length_secs.max(1.0),
        }
    }

    pub fn with_hour(mut self, hour: f64) -> Self {
        self.hour = hour.rem_euclid(24.0);
        self
    }

    pub fn hour(&self) -> f64 {
        self.hour
    }

    pub fn day_length_secs(&self) -> f64 {
        self.day_length_secs
    }

    /// Hours that pass per real second.
    pub fn hours_per_second(&self) -> f64 {
        24.0 / self.day_length_secs
    }

    /// Advance by `dt` real seconds, wrapping at midnight.
    pub fn advance(&mut self, dt: f64) {
        self.hour = (self.hour + self.hours_per_second() * dt).rem_euclid(24.0);
    }

    pub fn phase(&self) -> DayPhase {
        DayPhase::from_hour(self.hour)
    }

    pub fn is_night(&self) -> bool {
        self.phase() == DayPhase::Night
    }

    /// 0 at day, [`NIGHT_DARKNESS`] at night, linear across dawn and dusk.
    pub fn darkness(&self) -> f64 {
        match self.phase() {
            DayPhase::Day => 0.0,
            DayPhase::Night => NIGHT_DARKNESS,
            DayPhase::Dawn => NIGHT_DARKNESS * (1.0 - (self.hour - 5.0) / 2.0),
            DayPhase::Dusk => NIGHT_DARKNESS * ((self.hour - 18.0) / 2.0),
        }
    }

    pub fn tint(&self) -> Rgba {
        self.phase().tint()
    }

    /// 12-hour wall clock, e.g. `6:00 AM` or `12:30 PM`.
    pub fn clock_string(&self) -> String {
        let hours = self.hour.floor() as u32;
        let minutes = (self.hour.fract() * 60.0).floor() as u32;
        let suffix = if hours >= 12 { "PM" } else { "AM" };
        let display = match hours % 12 {
            0 => 12,
            h => h,
        };
        format!("{display}:{minutes:02} {suffix}")
    }
}

/// Turns variable frame deltas into a whole number of fixed ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedStep {
    step: f64,
    accumulator: f64,
}

impl FixedStep {
    /// Accumulator emitting one tick per `step` seconds.
    pub fn new(step: f64) -> Self {
        Self {
            step: step.max(f64::EPSILON),
            accumulator: 0.0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Feed a frame delta; returns how many ticks are now due.
    pub fn push(&mut self, dt: f64) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            ticks += 1;
        }
        ticks
    }

    /// Leftover time that has not yet produced a tick.
    pub fn pending(&self) -> f64 {
        self.accumulator
    }
}
