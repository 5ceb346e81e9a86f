//! Capture timestamps in the C-DNS `[seconds, ticks]` form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Point in time as whole seconds since the UNIX epoch plus sub-second ticks.
///
/// The tick resolution is set by the `ticks-per-second` storage parameter of
/// the block the timestamp ends up in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since the UNIX epoch
    pub secs: u64,
    /// Sub-second ticks
    pub ticks: u64,
}

impl Timestamp {
    /// Create a timestamp from its parts
    #[must_use]
    pub const fn new(secs: u64, ticks: u64) -> Self {
        Self { secs, ticks }
    }

    /// Convert a UTC date/time; instants before the epoch clamp to zero.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>, ticks_per_second: u64) -> Self {
        let Ok(secs) = u64::try_from(dt.timestamp()) else {
            return Self::default();
        };
        let ticks = u128::from(dt.timestamp_subsec_nanos()) * u128::from(ticks_per_second)
            / NANOS_PER_SECOND;
        Self {
            secs,
            ticks: u64::try_from(ticks).unwrap_or(u64::MAX),
        }
    }

    /// Current wall-clock time
    #[must_use]
    pub fn now(ticks_per_second: u64) -> Self {
        Self::from_datetime(Utc::now(), ticks_per_second)
    }

    /// Total ticks since the epoch at the given resolution
    #[must_use]
    pub fn as_ticks(&self, ticks_per_second: u64) -> u128 {
        u128::from(self.secs) * u128::from(ticks_per_second) + u128::from(self.ticks)
    }

    /// Ticks elapsed from `earlier` to `self`, zero if `self` is not later.
    ///
    /// Saturates at `u64::MAX`.
    #[must_use]
    pub fn ticks_since(&self, earlier: &Self, ticks_per_second: u64) -> u64 {
        let diff = self
            .as_ticks(ticks_per_second)
            .saturating_sub(earlier.as_ticks(ticks_per_second));
        u64::try_from(diff).unwrap_or(u64::MAX)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    /// Microsecond resolution, the RFC 8618 default
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt, 1_000_000)
    }
}
