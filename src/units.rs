//! Unit conversions shared by the engine and the report.
//!
//! Quantities are carried around as plain `f64` values in SI base units
//! (joules, coulombs, amperes, volts, seconds). Conversions to and from the
//! datasheet units go through `uom` so the factors are not scattered as
//! literals.

use uom::si::electric_charge::{coulomb, milliampere_hour};
use uom::si::f64::{ElectricCharge, Time};
use uom::si::time::{day, second};

/// Number of days in a reporting year.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Convert a rated capacity in milliampere-hours into coulombs.
///
/// # Examples
/// ```
/// use hygiene_battery::units::milliamp_hours_to_coulombs;
///
/// assert!((milliamp_hours_to_coulombs(1.0) - 3.6).abs() < 1.0e-12);
/// ```
#[must_use]
pub fn milliamp_hours_to_coulombs(milliamp_hours: f64) -> f64 {
    ElectricCharge::new::<milliampere_hour>(milliamp_hours).get::<coulomb>()
}

/// Convert a charge in coulombs into milliampere-hours.
#[must_use]
pub fn coulombs_to_milliamp_hours(coulombs: f64) -> f64 {
    ElectricCharge::new::<coulomb>(coulombs).get::<milliampere_hour>()
}

/// Number of seconds in one day.
#[must_use]
pub fn seconds_per_day() -> f64 {
    Time::new::<day>(1.0).get::<second>()
}
