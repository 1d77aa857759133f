use serde::Deserialize;
use std::time::Duration;

use crate::error::AdmissionError;

/// Unit the configured window is expressed in.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WindowUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl WindowUnit {
    pub fn duration(self) -> Duration {
        match self {
            WindowUnit::Second => Duration::from_secs(1),
            WindowUnit::Minute => Duration::from_secs(60),
            WindowUnit::Hour => Duration::from_secs(60 * 60),
            WindowUnit::Day => Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// "At most `capacity` calls per `window`", validated.
///
/// The only way to obtain one is through [`RateLimit::new`], so a value of
/// this type always has a positive capacity and a replenishment cadence of
/// at least one nanosecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    capacity: u32,
    window: Duration,
}

impl RateLimit {
    /// Capacity is taken as a signed integer so that negative values coming
    /// from configuration are rejected here rather than wrapped.
    pub fn new(window: Duration, capacity: i64) -> Result<Self, AdmissionError> {
        if capacity <= 0 {
            return Err(AdmissionError::InvalidConfiguration(format!(
                "capacity must be positive, got {}",
                capacity
            )));
        }
        let capacity = u32::try_from(capacity).map_err(|_| {
            AdmissionError::InvalidConfiguration(format!(
                "capacity {} exceeds the maximum of {}",
                capacity,
                u32::MAX
            ))
        })?;

        if window.is_zero() {
            return Err(AdmissionError::InvalidConfiguration(
                "window must be greater than zero".into(),
            ));
        }

        let limit = Self { capacity, window };
        if limit.tick().is_zero() {
            return Err(AdmissionError::InvalidConfiguration(format!(
                "window {:?} is too short for {} permits",
                window, capacity
            )));
        }

        Ok(limit)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Interval at which a single permit is returned to the pool.
    pub fn tick(&self) -> Duration {
        self.window / self.capacity
    }
}
