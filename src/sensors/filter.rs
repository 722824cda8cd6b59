//! Adaptive tracking average.
//!
//! Each sample nudges the average by `(raw - average) / factor`.  The factor
//! is large (heavy smoothing) near steady state and drops as the deviation
//! crosses two thresholds, so a step change settles quickly.

use serde::{Deserialize, Serialize};

/// Deviation breakpoints and their tracking factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterPolicy {
    pub slow_factor: f32,
    /// Deviation (counts) above which `medium_factor` applies.
    pub medium_threshold: f32,
    pub medium_factor: f32,
    /// Deviation (counts) above which `fast_factor` applies.
    pub fast_threshold: f32,
    pub fast_factor: f32,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            slow_factor: 100.0,
            medium_threshold: 50.0,
            medium_factor: 10.0,
            fast_threshold: 1000.0,
            fast_factor: 4.0,
        }
    }
}

impl FilterPolicy {
    /// Tracking factor for a given absolute deviation.
    pub fn factor_for(&self, deviation: f32) -> f32 {
        let d = deviation.abs();
        if d > self.fast_threshold {
            self.fast_factor
        } else if d > self.medium_threshold {
            self.medium_factor
        } else {
            self.slow_factor
        }
    }

    /// Factors below 1 would overshoot.
    pub fn is_stable(&self) -> bool {
        self.slow_factor >= 1.0
            && self.medium_factor >= 1.0
            && self.fast_factor >= 1.0
            && self.medium_threshold < self.fast_threshold
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrackingAverage {
    average: f32,
    policy: FilterPolicy,
}

impl TrackingAverage {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            average: 0.0,
            policy,
        }
    }

    /// Feed one raw sample and return the new average.
    pub fn update(&mut self, raw: u16) -> f32 {
        let deviation = f32::from(raw) - self.average;
        self.average += deviation / self.policy.factor_for(deviation);
        self.average
    }

    pub fn value(&self) -> f32 {
        self.average
    }

    pub fn reset(&mut self, value: f32) {
        self.average = value;
    }
}
