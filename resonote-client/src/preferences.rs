//! Text scale preference

use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.0;
pub const SCALE_STEP: f64 = 0.1;

/// Lyrics text scale, 0.5..=2.0 in steps of 0.1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontScale(f64);

impl FontScale {
    /// Clamp and round an arbitrary value to a valid scale
    pub fn new(scale: f64) -> Self {
        if !scale.is_finite() {
            return Self::default();
        }
        Self(round_step(scale.clamp(MIN_SCALE, MAX_SCALE)))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn percent(self) -> u32 {
        (self.0 * 100.0).round() as u32
    }

    /// One step larger; false when already at the maximum
    pub fn increase(&mut self) -> bool {
        if self.0 >= MAX_SCALE {
            return false;
        }
        self.0 = round_step(self.0 + SCALE_STEP).min(MAX_SCALE);
        true
    }

    /// One step smaller; false when already at the minimum
    pub fn decrease(&mut self) -> bool {
        if self.0 <= MIN_SCALE {
            return false;
        }
        self.0 = round_step(self.0 - SCALE_STEP).max(MIN_SCALE);
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Column width for wrapped lyrics: larger text means fewer columns
    pub fn wrap_width(self, base: usize) -> usize {
        ((base as f64 / self.0).round() as usize).max(20)
    }
}

impl Default for FontScale {
    fn default() -> Self {
        Self(1.0)
    }
}

fn round_step(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
