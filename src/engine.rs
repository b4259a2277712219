//! Evaluation of the derived energy quantities.
//!
//! Every derived quantity is a node in a small dependency graph whose leaves
//! are the [`Configuration`] parameters. [`estimate`] orders the graph
//! topologically and evaluates each node once with the pure formula functions
//! below, so a quantity only ever sees values that were already computed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{debug, info};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Serialize, Serializer};

use crate::config::Configuration;
use crate::errors::EstimateError;
use crate::units::{milliamp_hours_to_coulombs, seconds_per_day, DAYS_PER_YEAR};

/// Energy stored in a battery stack, in joules.
///
/// The discharge curve is approximated by a rectangle at the dead voltage
/// plus the region between dead and fresh voltage scaled by
/// `discharge_curve_factor`.
///
/// # Examples
/// ```
/// use hygiene_battery::engine::battery_energy;
///
/// let energy = battery_energy(4, 10_260.0, 1.5, 0.8, 0.5);
/// assert!((energy - 47_196.0).abs() < 1.0e-6);
/// ```
#[must_use]
pub fn battery_energy(
    cells: u32,
    capacity_coulombs: f64,
    fresh_voltage: f64,
    dead_voltage: f64,
    discharge_curve_factor: f64,
) -> f64 {
    f64::from(cells)
        * (dead_voltage * capacity_coulombs
            + (fresh_voltage - dead_voltage) * discharge_curve_factor * capacity_coulombs)
}

/// Current through a series resistor feeding a diode-like load, in amperes.
///
/// The result is negative when `forward_voltage` exceeds `source_voltage`.
#[must_use]
pub fn resistor_limited_current(source_voltage: f64, forward_voltage: f64, resistance: f64) -> f64 {
    (source_voltage - forward_voltage) / resistance
}

/// Daily energy of a load that only draws current while activated, in joules.
#[must_use]
pub fn duty_cycled_energy(
    activations_per_day: f64,
    on_duration: f64,
    current: f64,
    voltage_basis: f64,
) -> f64 {
    activations_per_day * on_duration * current * voltage_basis
}

/// Daily energy of a load that draws current around the clock, in joules.
#[must_use]
pub fn continuous_energy(current: f64, voltage_basis: f64) -> f64 {
    seconds_per_day() * current * voltage_basis
}

/// Percentage of `total` contributed by `part`.
#[must_use]
pub fn share_percent(part: f64, total: f64) -> f64 {
    part / total * 100.0
}

/// Group a derived quantity belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    /// Battery stack and regulator.
    Battery,
    /// Indicator LED.
    Led,
    /// Capacitive touch sensor.
    CapacitiveSensor,
    /// Radio.
    Radio,
    /// Totals and life expectancy.
    Total,
    /// Currents expected at the battery terminals.
    Verification,
}

/// A derived quantity produced by [`estimate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantity {
    /// Rated capacity of one cell in coulombs.
    CapacityCoulombs,
    /// Energy of the whole stack in joules.
    BatteryEnergy,
    /// Average stack voltage over the discharge in volts.
    AverageBatteryVoltage,
    /// Charge available on the regulated rail in coulombs.
    SystemCapacity,
    /// LED current at the average battery voltage in amperes.
    LedCurrent,
    /// LED current at the fresh stack voltage in amperes.
    LedPeakCurrent,
    /// LED energy per day in joules.
    LedDailyEnergy,
    /// Capacitive sensor energy per day in joules.
    SensorDailyEnergy,
    /// Radio idle energy per day in joules.
    RadioStaticDailyEnergy,
    /// Radio dispense report energy per day in joules.
    RadioDispenseDailyEnergy,
    /// Radio reconnection energy per day in joules.
    RadioConnectDailyEnergy,
    /// All radio energy per day in joules.
    RadioDailyEnergy,
    /// Energy drawn from the battery per day in joules.
    TotalDailyEnergy,
    /// LED share of the daily energy in percent.
    LedShare,
    /// Capacitive sensor share of the daily energy in percent.
    SensorShare,
    /// Radio share of the daily energy in percent.
    RadioShare,
    /// Expected life in days.
    LifeExpectancyDays,
    /// Expected life in years.
    LifeExpectancyYears,
    /// Always-on current measured across the fresh stack in amperes.
    StaticCurrentAtBattery,
    /// Current measured across the fresh stack during a dispense in amperes.
    PeakDispenseCurrentAtBattery,
}

impl Quantity {
    /// Every quantity, in evaluation-independent declaration order.
    pub const ALL: [Quantity; 20] = [
        Quantity::CapacityCoulombs,
        Quantity::BatteryEnergy,
        Quantity::AverageBatteryVoltage,
        Quantity::SystemCapacity,
        Quantity::LedCurrent,
        Quantity::LedPeakCurrent,
        Quantity::LedDailyEnergy,
        Quantity::SensorDailyEnergy,
        Quantity::RadioStaticDailyEnergy,
        Quantity::RadioDispenseDailyEnergy,
        Quantity::RadioConnectDailyEnergy,
        Quantity::RadioDailyEnergy,
        Quantity::TotalDailyEnergy,
        Quantity::LedShare,
        Quantity::SensorShare,
        Quantity::RadioShare,
        Quantity::LifeExpectancyDays,
        Quantity::LifeExpectancyYears,
        Quantity::StaticCurrentAtBattery,
        Quantity::PeakDispenseCurrentAtBattery,
    ];

    /// Stable snake_case name, also used as the JSON key.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Quantity::CapacityCoulombs => "capacity_coulombs",
            Quantity::BatteryEnergy => "battery_energy",
            Quantity::AverageBatteryVoltage => "average_battery_voltage",
            Quantity::SystemCapacity => "system_capacity",
            Quantity::LedCurrent => "led_current",
            Quantity::LedPeakCurrent => "led_peak_current",
            Quantity::LedDailyEnergy => "led_daily_energy",
            Quantity::SensorDailyEnergy => "sensor_daily_energy",
            Quantity::RadioStaticDailyEnergy => "radio_static_daily_energy",
            Quantity::RadioDispenseDailyEnergy => "radio_dispense_daily_energy",
            Quantity::RadioConnectDailyEnergy => "radio_connect_daily_energy",
            Quantity::RadioDailyEnergy => "radio_daily_energy",
            Quantity::TotalDailyEnergy => "total_daily_energy",
            Quantity::LedShare => "led_share",
            Quantity::SensorShare => "sensor_share",
            Quantity::RadioShare => "radio_share",
            Quantity::LifeExpectancyDays => "life_expectancy_days",
            Quantity::LifeExpectancyYears => "life_expectancy_years",
            Quantity::StaticCurrentAtBattery => "static_current_at_battery",
            Quantity::PeakDispenseCurrentAtBattery => "peak_dispense_current_at_battery",
        }
    }

    /// SI unit symbol of the value.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Quantity::CapacityCoulombs | Quantity::SystemCapacity => "C",
            Quantity::BatteryEnergy
            | Quantity::LedDailyEnergy
            | Quantity::SensorDailyEnergy
            | Quantity::RadioStaticDailyEnergy
            | Quantity::RadioDispenseDailyEnergy
            | Quantity::RadioConnectDailyEnergy
            | Quantity::RadioDailyEnergy
            | Quantity::TotalDailyEnergy => "J",
            Quantity::AverageBatteryVoltage => "V",
            Quantity::LedCurrent
            | Quantity::LedPeakCurrent
            | Quantity::StaticCurrentAtBattery
            | Quantity::PeakDispenseCurrentAtBattery => "A",
            Quantity::LedShare | Quantity::SensorShare | Quantity::RadioShare => "%",
            Quantity::LifeExpectancyDays => "d",
            Quantity::LifeExpectancyYears => "a",
        }
    }

    /// Group the quantity is reported under.
    #[must_use]
    pub fn subsystem(self) -> Subsystem {
        match self {
            Quantity::CapacityCoulombs
            | Quantity::BatteryEnergy
            | Quantity::AverageBatteryVoltage
            | Quantity::SystemCapacity => Subsystem::Battery,
            Quantity::LedCurrent
            | Quantity::LedPeakCurrent
            | Quantity::LedDailyEnergy
            | Quantity::LedShare => Subsystem::Led,
            Quantity::SensorDailyEnergy | Quantity::SensorShare => Subsystem::CapacitiveSensor,
            Quantity::RadioStaticDailyEnergy
            | Quantity::RadioDispenseDailyEnergy
            | Quantity::RadioConnectDailyEnergy
            | Quantity::RadioDailyEnergy
            | Quantity::RadioShare => Subsystem::Radio,
            Quantity::TotalDailyEnergy
            | Quantity::LifeExpectancyDays
            | Quantity::LifeExpectancyYears => Subsystem::Total,
            Quantity::StaticCurrentAtBattery | Quantity::PeakDispenseCurrentAtBattery => {
                Subsystem::Verification
            }
        }
    }

    /// Whether the quantity is computed for `config` at all.
    #[must_use]
    pub fn is_applicable(self, config: &Configuration) -> bool {
        match self {
            Quantity::RadioConnectDailyEnergy => config.radio.connect.is_some(),
            Quantity::LedPeakCurrent
            | Quantity::StaticCurrentAtBattery
            | Quantity::PeakDispenseCurrentAtBattery => config.verification,
            _ => true,
        }
    }

    /// Quantities that must be evaluated before this one.
    #[must_use]
    pub fn dependencies(self, config: &Configuration) -> Vec<Quantity> {
        match self {
            Quantity::CapacityCoulombs
            | Quantity::LedPeakCurrent
            | Quantity::SensorDailyEnergy
            | Quantity::RadioStaticDailyEnergy
            | Quantity::RadioDispenseDailyEnergy
            | Quantity::RadioConnectDailyEnergy => vec![],
            Quantity::BatteryEnergy => vec![Quantity::CapacityCoulombs],
            Quantity::AverageBatteryVoltage => {
                vec![Quantity::BatteryEnergy, Quantity::CapacityCoulombs]
            }
            Quantity::SystemCapacity => vec![Quantity::BatteryEnergy],
            Quantity::LedCurrent => vec![Quantity::AverageBatteryVoltage],
            Quantity::LedDailyEnergy => {
                vec![Quantity::LedCurrent, Quantity::AverageBatteryVoltage]
            }
            Quantity::RadioDailyEnergy => {
                let mut parts = vec![
                    Quantity::RadioStaticDailyEnergy,
                    Quantity::RadioDispenseDailyEnergy,
                ];
                if config.radio.connect.is_some() {
                    parts.push(Quantity::RadioConnectDailyEnergy);
                }
                parts
            }
            Quantity::TotalDailyEnergy => vec![
                Quantity::LedDailyEnergy,
                Quantity::SensorDailyEnergy,
                Quantity::RadioDailyEnergy,
            ],
            Quantity::LedShare => vec![Quantity::LedDailyEnergy, Quantity::TotalDailyEnergy],
            Quantity::SensorShare => vec![Quantity::SensorDailyEnergy, Quantity::TotalDailyEnergy],
            Quantity::RadioShare => vec![Quantity::RadioDailyEnergy, Quantity::TotalDailyEnergy],
            Quantity::LifeExpectancyDays => {
                vec![Quantity::BatteryEnergy, Quantity::TotalDailyEnergy]
            }
            Quantity::LifeExpectancyYears => vec![Quantity::LifeExpectancyDays],
            Quantity::StaticCurrentAtBattery => vec![
                Quantity::SensorDailyEnergy,
                Quantity::RadioStaticDailyEnergy,
            ],
            Quantity::PeakDispenseCurrentAtBattery => vec![Quantity::LedPeakCurrent],
        }
    }

    /// Compute the quantity from the configuration and already evaluated values.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::MissingDependency`] when a dependency has no value yet.
    pub fn evaluate(
        self,
        config: &Configuration,
        values: &BTreeMap<Quantity, f64>,
    ) -> Result<f64, EstimateError> {
        let get = |dependency: Quantity| {
            values
                .get(&dependency)
                .copied()
                .ok_or(EstimateError::MissingDependency {
                    quantity: self,
                    dependency,
                })
        };
        let battery = &config.battery;
        let regulated = config.regulator.battery_referred_voltage();
        let fresh_stack_voltage = battery.fresh_voltage * f64::from(battery.cells);

        let value = match self {
            Quantity::CapacityCoulombs => milliamp_hours_to_coulombs(battery.capacity_mah),
            Quantity::BatteryEnergy => battery_energy(
                battery.cells,
                get(Quantity::CapacityCoulombs)?,
                battery.fresh_voltage,
                battery.dead_voltage,
                battery.discharge_curve_factor,
            ),
            // Cells are in series, so the stack shares the charge of one cell.
            Quantity::AverageBatteryVoltage => {
                get(Quantity::BatteryEnergy)? / get(Quantity::CapacityCoulombs)?
            }
            Quantity::SystemCapacity => {
                config.regulator.efficiency * get(Quantity::BatteryEnergy)?
                    / config.regulator.output_voltage
            }
            Quantity::LedCurrent => resistor_limited_current(
                get(Quantity::AverageBatteryVoltage)?,
                config.led.forward_voltage,
                config.led.resistance,
            ),
            Quantity::LedPeakCurrent => resistor_limited_current(
                fresh_stack_voltage,
                config.led.forward_voltage,
                config.led.resistance,
            ),
            Quantity::LedDailyEnergy => duty_cycled_energy(
                config.activations_per_day,
                config.led.on_duration,
                get(Quantity::LedCurrent)?,
                get(Quantity::AverageBatteryVoltage)?,
            ),
            Quantity::SensorDailyEnergy => {
                continuous_energy(config.capacitive_sensor.current, regulated)
            }
            Quantity::RadioStaticDailyEnergy => {
                continuous_energy(config.radio.static_current, regulated)
            }
            Quantity::RadioDispenseDailyEnergy => duty_cycled_energy(
                config.activations_per_day,
                config.radio.dispense_duration,
                config.radio.dispense_current,
                regulated,
            ),
            Quantity::RadioConnectDailyEnergy => {
                config.radio.connect.as_ref().map_or(0.0, |connect| {
                    duty_cycled_energy(
                        connect.attempts_per_day,
                        connect.duration,
                        connect.current,
                        regulated,
                    )
                })
            }
            Quantity::RadioDailyEnergy | Quantity::TotalDailyEnergy => self
                .dependencies(config)
                .into_iter()
                .map(get)
                .sum::<Result<f64, _>>()?,
            Quantity::LedShare => share_percent(
                get(Quantity::LedDailyEnergy)?,
                get(Quantity::TotalDailyEnergy)?,
            ),
            Quantity::SensorShare => share_percent(
                get(Quantity::SensorDailyEnergy)?,
                get(Quantity::TotalDailyEnergy)?,
            ),
            Quantity::RadioShare => share_percent(
                get(Quantity::RadioDailyEnergy)?,
                get(Quantity::TotalDailyEnergy)?,
            ),
            Quantity::LifeExpectancyDays => {
                get(Quantity::BatteryEnergy)? / get(Quantity::TotalDailyEnergy)?
            }
            Quantity::LifeExpectancyYears => get(Quantity::LifeExpectancyDays)? / DAYS_PER_YEAR,
            Quantity::StaticCurrentAtBattery => {
                (get(Quantity::SensorDailyEnergy)? + get(Quantity::RadioStaticDailyEnergy)?)
                    / (fresh_stack_voltage * seconds_per_day())
            }
            Quantity::PeakDispenseCurrentAtBattery => {
                get(Quantity::LedPeakCurrent)?
                    + config.radio.dispense_current * regulated / fresh_stack_voltage
            }
        };
        Ok(value)
    }

    /// Reject values that would poison every downstream quantity.
    fn check(self, value: f64) -> Result<(), EstimateError> {
        if !value.is_finite() {
            return Err(EstimateError::NonFinite {
                quantity: self,
                value,
            });
        }
        match self {
            Quantity::LedCurrent | Quantity::LedPeakCurrent if value < 0.0 => {
                Err(EstimateError::NegativeCurrent {
                    quantity: self,
                    value,
                })
            }
            Quantity::TotalDailyEnergy if value <= 0.0 => Err(EstimateError::ZeroTotalEnergy),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Derived quantities for one configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Estimate {
    /// Parameters the estimate was computed from.
    configuration: Configuration,
    /// Every evaluated quantity.
    values: BTreeMap<Quantity, f64>,
}

impl Estimate {
    /// Parameters the estimate was computed from.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Value of `quantity`, or `None` when it does not apply to this configuration.
    #[must_use]
    pub fn value(&self, quantity: Quantity) -> Option<f64> {
        self.values.get(&quantity).copied()
    }

    /// Iterate over all evaluated quantities in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (Quantity, f64)> + '_ {
        self.values.iter().map(|(&quantity, &value)| (quantity, value))
    }

    /// Energy stored in the battery stack in joules.
    #[must_use]
    pub fn battery_energy(&self) -> Option<f64> {
        self.value(Quantity::BatteryEnergy)
    }

    /// Energy drawn from the battery per day in joules.
    #[must_use]
    pub fn total_daily_energy(&self) -> Option<f64> {
        self.value(Quantity::TotalDailyEnergy)
    }

    /// Expected life in days.
    #[must_use]
    pub fn life_expectancy_days(&self) -> Option<f64> {
        self.value(Quantity::LifeExpectancyDays)
    }

    /// Expected life in years.
    #[must_use]
    pub fn life_expectancy_years(&self) -> Option<f64> {
        self.value(Quantity::LifeExpectancyYears)
    }

    /// Values grouped by subsystem, ready for serialization.
    #[must_use]
    pub fn grouped(&self) -> BTreeMap<Subsystem, BTreeMap<Quantity, f64>> {
        let mut groups: BTreeMap<Subsystem, BTreeMap<Quantity, f64>> = BTreeMap::new();
        for (quantity, value) in self.values() {
            groups
                .entry(quantity.subsystem())
                .or_default()
                .insert(quantity, value);
        }
        groups
    }
}

/// Build the dependency graph of the quantities that apply to `config`.
///
/// Edges point from a dependency to the quantity that uses it.
fn build_graph(config: &Configuration) -> DiGraph<Quantity, ()> {
    let mut graph = DiGraph::new();
    let nodes: HashMap<Quantity, NodeIndex> = Quantity::ALL
        .iter()
        .filter(|quantity| quantity.is_applicable(config))
        .map(|&quantity| (quantity, graph.add_node(quantity)))
        .collect();
    for quantity in Quantity::ALL {
        let Some(&node) = nodes.get(&quantity) else {
            continue;
        };
        for dependency in quantity.dependencies(config) {
            if let Some(&source) = nodes.get(&dependency) {
                graph.add_edge(source, node, ());
            }
        }
    }
    graph
}

/// Estimate the battery life for `configuration`.
///
/// # Errors
///
/// Returns [`EstimateError::InvalidConfiguration`] when a parameter violates
/// its invariant, [`EstimateError::NegativeCurrent`] when the LED forward
/// voltage exceeds its supply, and [`EstimateError::ZeroTotalEnergy`] when
/// every load is disabled.
///
/// # Examples
/// ```
/// use hygiene_battery::{estimate, Configuration};
///
/// let estimate = estimate(&Configuration::basic()).expect("basic profile is valid");
/// let days = estimate.life_expectancy_days().expect("always computed");
/// assert!(days > 0.0);
/// ```
pub fn estimate(configuration: &Configuration) -> Result<Estimate, EstimateError> {
    configuration.validate()?;
    let graph = build_graph(configuration);
    let order = toposort(&graph, None)
        .map_err(|cycle| EstimateError::DependencyCycle(graph[cycle.node_id()]))?;

    let mut values = BTreeMap::new();
    for node in order {
        let quantity = graph[node];
        let value = quantity.evaluate(configuration, &values)?;
        quantity.check(value)?;
        debug!("{quantity} = {value} {}", quantity.unit());
        values.insert(quantity, value);
    }

    let estimate = Estimate {
        configuration: configuration.clone(),
        values,
    };
    if let (Some(days), Some(total)) = (
        estimate.life_expectancy_days(),
        estimate.total_daily_energy(),
    ) {
        info!("estimated life {days:.0} days at {total:.1} J per day");
    }
    Ok(estimate)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::errors::ConfigError;

    fn value(estimate: &Estimate, quantity: Quantity) -> f64 {
        estimate.value(quantity).expect("quantity evaluated")
    }

    #[test]
    fn basic_battery_figures() {
        let estimate = estimate(&Configuration::basic()).expect("basic profile evaluates");
        let capacity = value(&estimate, Quantity::CapacityCoulombs);
        assert_relative_eq!(capacity, 10_260.0, epsilon = 1.0e-6);
        assert_relative_eq!(value(&estimate, Quantity::BatteryEnergy), 47_196.0, epsilon = 1.0e-6);
        assert_relative_eq!(
            value(&estimate, Quantity::AverageBatteryVoltage),
            47_196.0 / 10_260.0,
            epsilon = 1.0e-12
        );
        assert_relative_eq!(value(&estimate, Quantity::SystemCapacity), 21_238.2, epsilon = 1.0e-6);
    }

    #[test]
    fn led_figures_follow_average_voltage() {
        let config = Configuration::basic();
        let estimate = estimate(&config).expect("basic profile evaluates");
        let average = value(&estimate, Quantity::AverageBatteryVoltage);
        let current = (average - config.led.forward_voltage) / config.led.resistance;
        assert_relative_eq!(value(&estimate, Quantity::LedCurrent), current, epsilon = 1.0e-15);
        assert_relative_eq!(
            value(&estimate, Quantity::LedDailyEnergy),
            config.activations_per_day * config.led.on_duration * current * average,
            epsilon = 1.0e-12
        );
    }

    #[test]
    fn regulated_loads_pay_for_regulator_losses() {
        let config = Configuration::basic();
        let estimate = estimate(&config).expect("basic profile evaluates");
        let expected = 86_400.0 * config.capacitive_sensor.current * 2.0 / 0.9;
        assert_relative_eq!(
            value(&estimate, Quantity::SensorDailyEnergy),
            expected,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn optional_quantities_follow_configuration() {
        let basic = estimate(&Configuration::basic()).expect("basic profile evaluates");
        assert!(basic.value(Quantity::RadioConnectDailyEnergy).is_none());
        assert!(basic.value(Quantity::LedPeakCurrent).is_none());
        assert!(basic.value(Quantity::StaticCurrentAtBattery).is_none());

        let mesh = estimate(&Configuration::mesh()).expect("mesh profile evaluates");
        let connect = value(&mesh, Quantity::RadioConnectDailyEnergy);
        assert_relative_eq!(connect, 24.0 * 2.0 * 12.0e-3 * 2.0 / 0.9, max_relative = 1.0e-12);
        assert_relative_eq!(
            value(&mesh, Quantity::RadioDailyEnergy),
            value(&mesh, Quantity::RadioStaticDailyEnergy)
                + value(&mesh, Quantity::RadioDispenseDailyEnergy)
                + connect,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn verification_currents_reuse_daily_figures() {
        let config = Configuration::mesh();
        let estimate = estimate(&config).expect("mesh profile evaluates");
        let stack = config.battery.fresh_voltage * f64::from(config.battery.cells);
        let static_energy = value(&estimate, Quantity::SensorDailyEnergy)
            + value(&estimate, Quantity::RadioStaticDailyEnergy);
        assert_relative_eq!(
            value(&estimate, Quantity::StaticCurrentAtBattery) * stack * 86_400.0,
            static_energy,
            max_relative = 1.0e-12
        );

        let peak_led = value(&estimate, Quantity::LedPeakCurrent);
        assert_relative_eq!(peak_led, (6.0 - 2.0) / 220.0, epsilon = 1.0e-15);
        assert_relative_eq!(
            value(&estimate, Quantity::PeakDispenseCurrentAtBattery),
            peak_led + 8.0e-3 * (2.0 / 0.9) / 6.0,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn dependencies_are_evaluated_first() {
        let config = Configuration::mesh();
        let graph = build_graph(&config);
        let order: Vec<Quantity> = toposort(&graph, None)
            .expect("acyclic")
            .into_iter()
            .map(|node| graph[node])
            .collect();
        assert_eq!(order.len(), Quantity::ALL.len());
        for (position, quantity) in order.iter().enumerate() {
            for dependency in quantity.dependencies(&config) {
                let dependency_position = order
                    .iter()
                    .position(|&candidate| candidate == dependency)
                    .expect("dependency planned");
                assert!(dependency_position < position);
            }
        }
    }

    #[test]
    fn negative_led_current_is_rejected() {
        let mut config = Configuration::basic();
        config.led.forward_voltage = 5.0;
        let error = estimate(&config).expect_err("forward voltage above supply");
        assert!(matches!(
            error,
            EstimateError::NegativeCurrent {
                quantity: Quantity::LedCurrent,
                ..
            }
        ));
    }

    #[test]
    fn disabled_loads_are_rejected() {
        let mut config = Configuration::basic();
        config.activations_per_day = 0.0;
        config.capacitive_sensor.current = 0.0;
        config.radio.static_current = 0.0;
        assert_eq!(estimate(&config), Err(EstimateError::ZeroTotalEnergy));
    }

    #[test]
    fn invalid_configuration_is_reported_before_evaluation() {
        let mut config = Configuration::basic();
        config.regulator.output_voltage = -2.0;
        assert_eq!(
            estimate(&config),
            Err(EstimateError::InvalidConfiguration(ConfigError::NonPositive {
                parameter: "regulator.output_voltage",
                value: -2.0
            }))
        );
    }

    #[test]
    fn grouped_values_cover_every_quantity_once() {
        let estimate = estimate(&Configuration::mesh()).expect("mesh profile evaluates");
        let groups = estimate.grouped();
        let count: usize = groups.values().map(BTreeMap::len).sum();
        assert_eq!(count, Quantity::ALL.len());
        assert!(groups[&Subsystem::Verification].contains_key(&Quantity::StaticCurrentAtBattery));

        let json = serde_json::to_value(&groups).expect("serializable");
        assert!(json["battery"]["battery_energy"].is_number());
    }
}
