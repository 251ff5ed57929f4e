//! Clock, timezone and randomness inputs to the fingerprint.
//!
//! Kept behind a trait so tests can pin every input and check exact tokens.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the non-deterministic inputs of a fingerprint.
pub trait EntropySource: Send + Sync {
    /// Uniform random 64-bit value for the GUID.
    fn guid_bits(&self) -> u64;
    /// Uniform random float in `[0, 1)`.
    fn unit_interval(&self) -> f64;
    /// Current Unix time in milliseconds.
    fn now_millis(&self) -> u64;
    /// Host UTC offset in minutes, positive west of UTC (UTC+4 is `-240`).
    fn utc_offset_minutes(&self) -> i32;
}

/// Production source: thread RNG, system clock, local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn guid_bits(&self) -> u64 {
        rand::random::<u64>()
    }

    fn unit_interval(&self) -> f64 {
        rand::random::<f64>()
    }

    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn utc_offset_minutes(&self) -> i32 {
        let local_minus_utc = chrono::Local::now().offset().local_minus_utc();
        -(local_minus_utc / 60)
    }
}

/// Fixed inputs; every call returns the same values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEntropy {
    pub guid_bits: u64,
    pub unit_interval: f64,
    pub now_millis: u64,
    pub utc_offset_minutes: i32,
}

impl EntropySource for FixedEntropy {
    fn guid_bits(&self) -> u64 {
        self.guid_bits
    }

    fn unit_interval(&self) -> f64 {
        self.unit_interval
    }

    fn now_millis(&self) -> u64 {
        self.now_millis
    }

    fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }
}
