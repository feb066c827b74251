//! Simulation clock.
//!
//! The tick counter is the source of truth; simulated time is derived from
//! it and the configured number of simulated seconds per tick. Changing the
//! wall-clock tick interval never changes simulated time.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration.
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Tick counter with derived simulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    /// Number of completed ticks.
    tick: u64,

    /// Simulated seconds that elapse per tick.
    seconds_per_tick: f64,
}

impl SimClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] unless `seconds_per_tick` is
    /// finite and positive.
    pub fn new(seconds_per_tick: f64) -> Result<Self, ClockError> {
        Self::from_parts(0, seconds_per_tick)
    }

    /// Create a clock at an explicit tick (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] unless `seconds_per_tick` is
    /// finite and positive.
    pub fn from_parts(tick: u64, seconds_per_tick: f64) -> Result<Self, ClockError> {
        if !seconds_per_tick.is_finite() || seconds_per_tick <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("seconds_per_tick must be positive, got {seconds_per_tick}"),
            });
        }
        Ok(Self {
            tick,
            seconds_per_tick,
        })
    }

    /// Advance by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds per tick.
    pub const fn seconds_per_tick(&self) -> f64 {
        self.seconds_per_tick
    }

    /// Simulated seconds elapsed since tick 0.
    pub fn sim_time_s(&self) -> f64 {
        self.tick as f64 * self.seconds_per_tick
    }
}
