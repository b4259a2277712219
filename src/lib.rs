#![warn(clippy::all)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod engine;
pub mod errors;
pub mod report;
pub mod units;

pub use config::{
    Battery, CapacitiveSensor, Configuration, ConnectAttempts, Led, Profile, Radio, Regulator,
};
pub use engine::{estimate, Estimate, Quantity, Subsystem};
pub use errors::{ConfigError, EstimateError, LoadError};
pub use report::{render_report, section_header, Report, Section};
