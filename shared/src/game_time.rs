use std::{
    ops::{Add, AddAssign},
    time::Duration,
};

/// Deterministic simulation clock reading, in milliseconds since the session
/// started. Advanced only by the tick loop, never read from the wall clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameInstant {
    millis: u64,
}

impl GameInstant {
    pub const ZERO: Self = Self { millis: 0 };

    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn from_secs_f32(secs: f32) -> Self {
        Self::ZERO + Duration::from_secs_f32(secs.max(0.0))
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_duration_since(&self, earlier: GameInstant) -> Duration {
        Duration::from_millis(self.millis.saturating_sub(earlier.millis))
    }

    pub fn is_after(&self, other: GameInstant) -> bool {
        self.millis > other.millis
    }
}

impl Add<Duration> for GameInstant {
    type Output = GameInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        GameInstant {
            millis: self.millis.saturating_add(millis),
        }
    }
}

impl AddAssign<Duration> for GameInstant {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}
