//! Internal unit system.
//!
//! Lengths are carried in nanometres and energies in electron-volts. Multiply a
//! literal by a unit to bring it into the internal system, divide by the unit to
//! read a value back out (`edep / EV` is always eV).

pub const NANOMETER: f64 = 1.0;
pub const MICROMETER: f64 = 1.0e3 * NANOMETER;
pub const MILLIMETER: f64 = 1.0e6 * NANOMETER;
pub const CENTIMETER: f64 = 1.0e7 * NANOMETER;
pub const CUBIC_CENTIMETER: f64 = CENTIMETER * CENTIMETER * CENTIMETER;

pub const EV: f64 = 1.0;
pub const KEV: f64 = 1.0e3 * EV;
pub const MEV: f64 = 1.0e6 * EV;

/// Avogadro constant (mol^-1).
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Oxygen sites per HfO2 formula unit.
pub const OXYGEN_SITES_PER_FORMULA_UNIT: f64 = 2.0;

/// Convert an internal volume to cm^3.
#[inline]
pub fn to_cm3(volume: f64) -> f64 {
	volume / CUBIC_CENTIMETER
}
