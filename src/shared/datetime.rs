pub const SECONDS_PER_DAY: u32 = 86_400;

/// A point in the service calendar, packed as `date * 86_400 + hour` where
/// `date` is a day offset from the snapshot's reference date and `hour` is
/// seconds within that day.
///
/// The packing makes comparisons plain integer comparisons, which the routing
/// labels rely on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(u64);

impl DateTime {
    pub const MIN: Self = Self(0);

    /// Builds a datetime from a day offset and seconds within that day.
    /// An `hour` of a day or more spills into the date part.
    pub const fn set(date: u32, hour: u32) -> Self {
        Self(date as u64 * SECONDS_PER_DAY as u64 + hour as u64)
    }

    pub const fn date(self) -> u32 {
        (self.0 / SECONDS_PER_DAY as u64) as u32
    }

    pub const fn hour(self) -> u32 {
        (self.0 % SECONDS_PER_DAY as u64) as u32
    }

    /// Replaces the hour part. When the new hour moves against the direction
    /// of travel, the date part carries: forward, an earlier hour means the
    /// next day; backward, a later hour means the previous day (saturating at
    /// day zero).
    pub fn update(&mut self, hour: u32, forward: bool) {
        let date = self.date() + hour / SECONDS_PER_DAY;
        let hour = hour % SECONDS_PER_DAY;
        let date = if forward && hour < self.hour() {
            date + 1
        } else if !forward && hour > self.hour() {
            date.saturating_sub(1)
        } else {
            date
        };
        *self = Self::set(date, hour);
    }

    pub const fn total_seconds(self) -> u64 {
        self.0
    }

    /// Seconds from `earlier` to `self`, zero when `earlier` is later.
    pub const fn seconds_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub const fn add_seconds(self, seconds: u32) -> Self {
        Self(self.0 + seconds as u64)
    }

    pub const fn sub_seconds(self, seconds: u32) -> Self {
        Self(self.0.saturating_sub(seconds as u64))
    }
}

#[test]
fn pack_unpack() {
    let dt = DateTime::set(3, 7 * 3600);
    assert_eq!(dt.date(), 3);
    assert_eq!(dt.hour(), 7 * 3600);
}

#[test]
fn set_normalizes_overflowing_hour() {
    let dt = DateTime::set(1, SECONDS_PER_DAY + 60);
    assert_eq!(dt.date(), 2);
    assert_eq!(dt.hour(), 60);
}

#[test]
fn update_forward_same_day() {
    let mut dt = DateTime::set(5, 8 * 3600);
    dt.update(9 * 3600, true);
    assert_eq!(dt, DateTime::set(5, 9 * 3600));
}

#[test]
fn update_forward_carries_date() {
    let mut dt = DateTime::set(5, 23 * 3600);
    dt.update(600, true);
    assert_eq!(dt, DateTime::set(6, 600));
}

#[test]
fn update_backward_same_day() {
    let mut dt = DateTime::set(5, 9 * 3600);
    dt.update(8 * 3600, false);
    assert_eq!(dt, DateTime::set(5, 8 * 3600));
}

#[test]
fn update_backward_retreats_date() {
    let mut dt = DateTime::set(5, 600);
    dt.update(23 * 3600, false);
    assert_eq!(dt, DateTime::set(4, 23 * 3600));
}

#[test]
fn update_backward_saturates_at_day_zero() {
    let mut dt = DateTime::set(0, 600);
    dt.update(23 * 3600, false);
    assert_eq!(dt, DateTime::set(0, 23 * 3600));
}

#[test]
fn ordering_follows_packing() {
    assert!(DateTime::set(1, 0) > DateTime::set(0, SECONDS_PER_DAY - 1));
    assert!(DateTime::set(2, 100) < DateTime::set(2, 101));
}
