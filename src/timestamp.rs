use std::fmt;
use std::ops;
use std::time;

use serde::{Deserialize, Serialize};

/// An AMQP timestamp: whole seconds since January 1, 1970 0:00:00 UTC. The wire format carries
/// no sub-second precision and no time zone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    sec: u64,
}

impl Timestamp {
    pub fn from_sec(sec: u64) -> Timestamp {
        Timestamp { sec }
    }

    /// Minimum possible time that can be represented
    pub fn min_value() -> Timestamp {
        Timestamp { sec: 0 }
    }

    /// Maximum possible time that can be represented
    pub fn max_value() -> Timestamp {
        Timestamp { sec: u64::MAX }
    }

    /// Return the UNIX timestamp (number of seconds since January 1, 1970 0:00:00 UTC).
    pub fn timestamp_utc(&self) -> u64 {
        self.sec
    }

    /// Convert to a [`SystemTime`](time::SystemTime). Fails if the seconds count can't be
    /// represented by the platform's clock.
    pub fn to_system_time(&self) -> Option<time::SystemTime> {
        time::SystemTime::UNIX_EPOCH.checked_add(time::Duration::from_secs(self.sec))
    }

    /// Create a Timestamp based on the current system time, truncated to whole seconds. Fails if
    /// the system clock is before the Unix Epoch.
    pub fn now() -> Option<Timestamp> {
        match time::SystemTime::now().duration_since(time::SystemTime::UNIX_EPOCH) {
            Ok(t) => Some(Timestamp::from_sec(t.as_secs())),
            Err(_) => None,
        }
    }
}

impl ops::Add<u64> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: u64) -> Self {
        Timestamp {
            sec: self.sec.saturating_add(rhs),
        }
    }
}

impl ops::Sub<u64> for Timestamp {
    type Output = Timestamp;
    fn sub(self, rhs: u64) -> Self {
        Timestamp {
            sec: self.sec.saturating_sub(rhs),
        }
    }
}

impl From<u64> for Timestamp {
    fn from(sec: u64) -> Self {
        Timestamp::from_sec(sec)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UTC: {} sec", self.sec)
    }
}
