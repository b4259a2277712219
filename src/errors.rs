//! Error types produced while validating configurations or estimating battery life.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::Quantity;

/// Error returned when a configuration parameter violates its invariant.
///
/// Every variant names the offending parameter with its dotted configuration
/// path (for example `battery.dead_voltage`) so the message can be acted upon
/// without reading the source.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Returned when a value is NaN or infinite.
    #[error("{parameter} must be a finite number (received {value})")]
    NonFinite {
        /// Dotted path of the parameter.
        parameter: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a value that must be strictly positive is zero or negative.
    #[error("{parameter} must be positive (received {value})")]
    NonPositive {
        /// Dotted path of the parameter.
        parameter: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a current, duration or count is negative.
    #[error("{parameter} must not be negative (received {value})")]
    Negative {
        /// Dotted path of the parameter.
        parameter: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a fractional factor lies outside its permitted range.
    #[error("{parameter} must lie within {range} (received {value})")]
    FractionOutOfRange {
        /// Dotted path of the parameter.
        parameter: &'static str,
        /// Human readable interval, e.g. `[0, 1]`.
        range: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when the battery is configured with no cells.
    #[error("battery.cells must be at least 1")]
    NoCells,
    /// Returned when the fresh cell voltage does not exceed the dead cell voltage.
    #[error(
        "battery.fresh_voltage ({fresh} V) must be greater than battery.dead_voltage ({dead} V)"
    )]
    VoltageOrdering {
        /// Fresh cell voltage in volts.
        fresh: f64,
        /// Dead cell voltage in volts.
        dead: f64,
    },
}

/// Error returned when a battery life estimate cannot be produced.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EstimateError {
    /// Returned when the configuration is rejected before evaluation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    /// Returned when a resistor-limited current evaluates below zero, meaning
    /// the forward voltage exceeds the source voltage.
    #[error("{quantity} is negative ({value} A); led.forward_voltage exceeds the supply voltage")]
    NegativeCurrent {
        /// Quantity that went negative.
        quantity: Quantity,
        /// Computed current in amperes.
        value: f64,
    },
    /// Returned when every load is disabled so nothing consumes energy.
    #[error("total daily energy is zero; at least one load must draw current")]
    ZeroTotalEnergy,
    /// Returned when a derived quantity evaluates to NaN or infinity.
    #[error("{quantity} evaluated to a non-finite value ({value})")]
    NonFinite {
        /// Quantity that failed.
        quantity: Quantity,
        /// Computed value.
        value: f64,
    },
    /// Returned when a quantity is requested before its dependency was evaluated.
    #[error("{quantity} depends on {dependency}, which was not evaluated")]
    MissingDependency {
        /// Quantity being evaluated.
        quantity: Quantity,
        /// Dependency with no value.
        dependency: Quantity,
    },
    /// Returned when the quantity dependencies do not form a DAG.
    #[error("derived quantities contain a dependency cycle through {0}")]
    DependencyCycle(Quantity),
}

/// Error returned when a configuration document cannot be read.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Returned when the file cannot be opened or read.
    #[error("failed to read configuration {path:?}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the document is not a valid configuration.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
