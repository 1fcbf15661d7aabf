//! World clock: monotonic world time and time-of-day derivation.
//!
//! The engine does not own the passage of time -- the host's tick
//! transport supplies `world_time_secs` -- but every temporal question
//! inside the engine goes through this type so that seconds-of-day and
//! the time-of-day bucket are derived one way, everywhere.
//!
//! # Design Principles
//!
//! - Seconds-of-day and the bucket are computed from `world_time_secs`
//!   and the configured day length -- never stored independently.
//! - Bucket boundaries are fixed fractions of the day so non-standard
//!   day lengths (fast-time worlds) keep the same daily shape. With the
//!   default 86,400-second day: Dawn 04:00–08:00, Morning 08:00–12:00,
//!   Afternoon 12:00–18:00, Dusk 18:00–22:00, Night 22:00–04:00.

use cadence_types::TimeOfDay;

/// Errors that can occur constructing a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Invalid day length (zero).
    #[error("invalid day length: {reason}")]
    InvalidDayLength {
        /// Explanation of what is wrong.
        reason: String,
    },
}

/// Snapshot of world time for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldClock {
    /// Monotonic world time in seconds, supplied by the host per tick.
    world_time_secs: u64,
    /// Length of one world day in seconds.
    day_length_secs: u32,
}

impl WorldClock {
    /// Create a clock at `world_time_secs` with the given day length.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDayLength`] if `day_length_secs` is 0.
    pub fn new(world_time_secs: u64, day_length_secs: u32) -> Result<Self, ClockError> {
        if day_length_secs == 0 {
            return Err(ClockError::InvalidDayLength {
                reason: "day_length_secs must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            world_time_secs,
            day_length_secs,
        })
    }

    /// Return the current world time in seconds.
    pub const fn world_time_secs(&self) -> u64 {
        self.world_time_secs
    }

    /// Return the configured day length in seconds.
    pub const fn day_length_secs(&self) -> u32 {
        self.day_length_secs
    }

    /// Seconds elapsed since the start of the current world day.
    ///
    /// Always less than `day_length_secs`, so the value fits in `u32`.
    pub fn seconds_of_day(&self) -> u32 {
        let day_length = u64::from(self.day_length_secs);
        // Remainder of a division by a nonzero u32 always fits in u32.
        let sod = self.world_time_secs.checked_rem(day_length).unwrap_or(0);
        u32::try_from(sod).unwrap_or(0)
    }

    /// The coarse time-of-day bucket for the current moment.
    ///
    /// Boundaries are fixed fractions of the day length: Night until 1/6,
    /// Dawn until 1/3, Morning until 1/2, Afternoon until 3/4, Dusk until
    /// 11/12, Night after.
    pub fn time_of_day(&self) -> TimeOfDay {
        let sod = u64::from(self.seconds_of_day());
        let day = u64::from(self.day_length_secs);

        // Fractions computed in u64; day >= 1 is guaranteed by the
        // constructor so the divisions cannot fail.
        let sixth = day.checked_div(6).unwrap_or(0);
        let third = day.checked_div(3).unwrap_or(0);
        let half = day.checked_div(2).unwrap_or(0);
        let three_quarters = half.saturating_add(day.checked_div(4).unwrap_or(0));
        let late_night = day.saturating_sub(day.checked_div(12).unwrap_or(0));

        if sod < sixth {
            TimeOfDay::Night
        } else if sod < third {
            TimeOfDay::Dawn
        } else if sod < half {
            TimeOfDay::Morning
        } else if sod < three_quarters {
            TimeOfDay::Afternoon
        } else if sod < late_night {
            TimeOfDay::Dusk
        } else {
            TimeOfDay::Night
        }
    }
}
