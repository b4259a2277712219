//! Physical parameters describing a hygiene sensor and its battery.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, LoadError};

/// Battery stack made of identical cells in series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Battery {
    /// Rated capacity of a single cell in milliampere-hours.
    pub capacity_mah: f64,
    /// Number of cells in series.
    pub cells: u32,
    /// Area under the discharge curve relative to a flat discharge, in `[0, 1]`.
    ///
    /// `1.0` models a flat (lithium-like) curve, `0.5` a linear (alkaline-like) one.
    pub discharge_curve_factor: f64,
    /// Voltage of a fresh cell in volts.
    pub fresh_voltage: f64,
    /// Voltage of a depleted cell in volts.
    pub dead_voltage: f64,
}

/// Switching regulator supplying the system rail.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Regulator {
    /// Fraction of battery energy delivered to the rail, in `(0, 1]`.
    pub efficiency: f64,
    /// Output voltage in volts.
    pub output_voltage: f64,
}

impl Regulator {
    /// Battery-side voltage basis for loads on the regulated rail.
    ///
    /// The regulator has to draw `output_voltage / efficiency` joules from the
    /// battery for every coulomb it delivers.
    #[must_use]
    pub fn battery_referred_voltage(&self) -> f64 {
        self.output_voltage / self.efficiency
    }
}

/// Indicator LED wired through a series resistor directly across the battery.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Led {
    /// Time the LED stays lit per activation in seconds.
    pub on_duration: f64,
    /// Forward voltage in volts.
    pub forward_voltage: f64,
    /// Series resistor in ohms.
    pub resistance: f64,
}

/// Capacitive touch sensor on the regulated rail.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapacitiveSensor {
    /// Average continuous current in amperes.
    pub current: f64,
}

/// Periodic reconnection attempts of a mesh radio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectAttempts {
    /// Current during an attempt in amperes.
    pub current: f64,
    /// Length of an attempt in seconds.
    pub duration: f64,
    /// Average number of attempts per day.
    pub attempts_per_day: f64,
    /// Description of the backoff strategy that yields `attempts_per_day`.
    #[serde(default)]
    pub backoff: String,
}

/// Radio on the regulated rail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Radio {
    /// Continuous current in amperes.
    pub static_current: f64,
    /// Current while reporting a dispense event in amperes.
    pub dispense_current: f64,
    /// Length of a dispense report in seconds.
    pub dispense_duration: f64,
    /// Reconnection attempts, when the radio joins a mesh network.
    #[serde(default)]
    pub connect: Option<ConnectAttempts>,
}

/// Complete set of parameters for one battery life estimate.
///
/// # Examples
/// ```
/// use hygiene_battery::Configuration;
///
/// let config = Configuration::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.battery.cells, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Battery stack.
    pub battery: Battery,
    /// Regulator feeding the sensor and the radio.
    pub regulator: Regulator,
    /// Dispense activations per day; each one flashes the LED and sends a radio report.
    pub activations_per_day: f64,
    /// Indicator LED.
    pub led: Led,
    /// Capacitive touch sensor.
    pub capacitive_sensor: CapacitiveSensor,
    /// Radio.
    pub radio: Radio,
    /// Compute peak LED current and the bench verification currents.
    #[serde(default)]
    pub verification: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::basic()
    }
}

impl Configuration {
    /// Sensor with a point-to-point radio and no verification figures.
    #[must_use]
    pub fn basic() -> Self {
        Self {
            battery: Battery {
                capacity_mah: 2_850.0,
                cells: 4,
                discharge_curve_factor: 0.5,
                fresh_voltage: 1.5,
                dead_voltage: 0.8,
            },
            regulator: Regulator {
                efficiency: 0.9,
                output_voltage: 2.0,
            },
            activations_per_day: 100.0,
            led: Led {
                on_duration: 1.0,
                forward_voltage: 2.0,
                resistance: 220.0,
            },
            capacitive_sensor: CapacitiveSensor { current: 15.0e-6 },
            radio: Radio {
                static_current: 3.0e-6,
                dispense_current: 8.0e-3,
                dispense_duration: 0.2,
                connect: None,
            },
            verification: false,
        }
    }

    /// Sensor on a mesh network, with reconnection costs and verification figures.
    #[must_use]
    pub fn mesh() -> Self {
        let basic = Self::basic();
        Self {
            radio: Radio {
                static_current: 4.0e-6,
                connect: Some(ConnectAttempts {
                    current: 12.0e-3,
                    duration: 2.0,
                    attempts_per_day: 24.0,
                    backoff: "retry interval doubles after each failed attempt, capped at one hour"
                        .to_owned(),
                }),
                ..basic.radio
            },
            verification: true,
            ..basic
        }
    }

    /// Parse a configuration from a JSON document.
    ///
    /// The document is not validated; call [`Configuration::validate`] or go
    /// straight to [`estimate`](crate::estimate), which validates first.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] when the document does not describe a configuration.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be read and
    /// [`LoadError::Parse`] when its contents are not a configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check every parameter against its physical invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let battery = &self.battery;
        positive("battery.capacity_mah", battery.capacity_mah)?;
        if battery.cells == 0 {
            return Err(ConfigError::NoCells);
        }
        fraction(
            "battery.discharge_curve_factor",
            battery.discharge_curve_factor,
            false,
        )?;
        positive("battery.fresh_voltage", battery.fresh_voltage)?;
        positive("battery.dead_voltage", battery.dead_voltage)?;
        if battery.fresh_voltage <= battery.dead_voltage {
            return Err(ConfigError::VoltageOrdering {
                fresh: battery.fresh_voltage,
                dead: battery.dead_voltage,
            });
        }

        fraction("regulator.efficiency", self.regulator.efficiency, true)?;
        positive("regulator.output_voltage", self.regulator.output_voltage)?;

        non_negative("activations_per_day", self.activations_per_day)?;

        non_negative("led.on_duration", self.led.on_duration)?;
        positive("led.forward_voltage", self.led.forward_voltage)?;
        positive("led.resistance", self.led.resistance)?;

        non_negative("capacitive_sensor.current", self.capacitive_sensor.current)?;

        let radio = &self.radio;
        non_negative("radio.static_current", radio.static_current)?;
        non_negative("radio.dispense_current", radio.dispense_current)?;
        non_negative("radio.dispense_duration", radio.dispense_duration)?;
        if let Some(connect) = &radio.connect {
            non_negative("radio.connect.current", connect.current)?;
            non_negative("radio.connect.duration", connect.duration)?;
            non_negative("radio.connect.attempts_per_day", connect.attempts_per_day)?;
        }
        Ok(())
    }
}

/// Reject NaN and infinities.
fn finite(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { parameter, value })
    }
}

/// Require a strictly positive value.
fn positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(parameter, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { parameter, value })
    }
}

/// Require a value of zero or more.
fn non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(parameter, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { parameter, value })
    }
}

/// Require a value in `[0, 1]`, or `(0, 1]` when `exclude_zero` is set.
fn fraction(parameter: &'static str, value: f64, exclude_zero: bool) -> Result<(), ConfigError> {
    finite(parameter, value)?;
    let (in_range, range) = if exclude_zero {
        (value > 0.0 && value <= 1.0, "(0, 1]")
    } else {
        ((0.0..=1.0).contains(&value), "[0, 1]")
    };
    if in_range {
        Ok(())
    } else {
        Err(ConfigError::FractionOutOfRange {
            parameter,
            range,
            value,
        })
    }
}

/// Built-in parameter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    /// See [`Configuration::basic`].
    Basic,
    /// See [`Configuration::mesh`].
    Mesh,
}

impl Profile {
    /// Build the configuration for this profile.
    #[must_use]
    pub fn configuration(self) -> Configuration {
        match self {
            Profile::Basic => Configuration::basic(),
            Profile::Mesh => Configuration::mesh(),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Profile::Basic => "basic",
            Profile::Mesh => "mesh",
        })
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "basic" => Ok(Profile::Basic),
            "mesh" => Ok(Profile::Mesh),
            other => Err(format!(
                "unknown profile `{other}` (expected `basic` or `mesh`)"
            )),
        }
    }
}
