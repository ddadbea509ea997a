use bitvec::prelude::*;

/// Day-of-service bitmap keyed by day offset from the snapshot's reference
/// date. Days outside the horizon are simply not valid.
#[derive(Debug, Default, Clone)]
pub struct ValidityPattern {
    days: BitVec<usize, Lsb0>,
}

impl ValidityPattern {
    pub fn new(horizon_days: usize) -> Self {
        Self {
            days: bitvec!(usize, Lsb0; 0; horizon_days),
        }
    }

    /// Parses a pattern from a string of `1`/`0` characters, one per day
    /// starting at the reference date. Any other character reads as invalid.
    pub fn from_days(days: &str) -> Self {
        Self {
            days: days.chars().map(|c| c == '1').collect(),
        }
    }

    pub fn add(&mut self, day: u32) {
        if day as usize >= self.days.len() {
            self.days.resize(day as usize + 1, false);
        }
        self.days.set(day as usize, true);
    }

    pub fn check(&self, day: u32) -> bool {
        self.days.get(day as usize).map(|b| *b).unwrap_or(false)
    }

    pub fn horizon_days(&self) -> usize {
        self.days.len()
    }
}

/// Facilities a stop point offers, as a bitset so that the kernel's
/// per-candidate check is one mask test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Properties(u8);

impl Properties {
    pub const WHEELCHAIR_BOARDING: Self = Self(1 << 0);
    pub const SHELTERED: Self = Self(1 << 1);
    pub const ELEVATOR: Self = Self(1 << 2);
    pub const ESCALATOR: Self = Self(1 << 3);
    pub const BIKE_ACCEPTED: Self = Self(1 << 4);
    pub const VISUAL_ANNOUNCEMENT: Self = Self(1 << 5);
    pub const AUDIBLE_ANNOUNCEMENT: Self = Self(1 << 6);

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Does this set carry everything `required` asks for?
    pub const fn supports(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Capabilities of a vehicle journey.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleProperties(u8);

impl VehicleProperties {
    pub const WHEELCHAIR_ACCESSIBLE: Self = Self(1 << 0);
    pub const BIKE_ACCEPTED: Self = Self(1 << 1);
    pub const AIR_CONDITIONED: Self = Self(1 << 2);
    pub const VISUAL_ANNOUNCEMENT: Self = Self(1 << 3);
    pub const AUDIBLE_ANNOUNCEMENT: Self = Self(1 << 4);
    pub const SCHOOL_VEHICLE: Self = Self(1 << 5);

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn supports(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }
}

/// What a request demands of stop points and vehicles along the journey.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessibilityParams {
    pub properties: Properties,
    pub vehicle_properties: VehicleProperties,
}

impl AccessibilityParams {
    pub fn wheelchair() -> Self {
        Self {
            properties: Properties::WHEELCHAIR_BOARDING,
            vehicle_properties: VehicleProperties::WHEELCHAIR_ACCESSIBLE,
        }
    }
}

#[test]
fn validity_pattern_from_days() {
    let vp = ValidityPattern::from_days("1011");
    assert!(vp.check(0));
    assert!(!vp.check(1));
    assert!(vp.check(2));
    assert!(vp.check(3));
    assert!(!vp.check(4));
}

#[test]
fn validity_pattern_out_of_horizon() {
    let vp = ValidityPattern::new(7);
    assert!(!vp.check(6));
    assert!(!vp.check(1000));
}

#[test]
fn properties_supports_subset() {
    let offered = Properties::WHEELCHAIR_BOARDING.with(Properties::SHELTERED);
    assert!(offered.supports(Properties::WHEELCHAIR_BOARDING));
    assert!(offered.supports(Properties::default()));
    assert!(!offered.supports(Properties::ELEVATOR));
}

#[test]
fn vehicle_properties_supports() {
    let vehicle = VehicleProperties::WHEELCHAIR_ACCESSIBLE.with(VehicleProperties::BIKE_ACCEPTED);
    assert!(vehicle.supports(VehicleProperties::WHEELCHAIR_ACCESSIBLE));
    assert!(!VehicleProperties::default().supports(VehicleProperties::WHEELCHAIR_ACCESSIBLE));
}
