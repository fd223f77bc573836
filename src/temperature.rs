//! Sampling temperature forwarded to the generation service

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Temperature used before the user adjusts it
pub(crate) const INITIAL_AI_TEMPERATURE: f64 = 0.5;

/// Holds the current temperature.
///
/// Values are stored as given; range limits belong to the input widget.
#[derive(Debug)]
pub(crate) struct TemperatureControl {
    bits: AtomicU64,
}

impl TemperatureControl {
    pub(crate) fn new(initial: f64) -> Self {
        Self {
            bits: AtomicU64::new(initial.to_bits()),
        }
    }

    pub(crate) fn set(&self, value: f64) {
        debug!(temperature = value, "Temperature changed");
        self.bits.store(value.to_bits(), Ordering::SeqCst);
    }

    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

impl Default for TemperatureControl {
    fn default() -> Self {
        Self::new(INITIAL_AI_TEMPERATURE)
    }
}
