//! Text rendering of an [`Estimate`].

use std::fmt;

use crate::engine::{Estimate, Quantity};
use crate::units::coulombs_to_milliamp_hours;

/// Total width of a section header line.
pub const HEADER_WIDTH: usize = 66;

/// Titled group of report statements.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Title shown in the header.
    pub title: String,
    /// Statements in display order, without bullet markers.
    pub lines: Vec<String>,
}

impl Section {
    /// Create an empty section.
    fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            lines: Vec::new(),
        }
    }
}

/// Rendered battery life report.
///
/// `Display` writes each section as a blank line, its header, a blank line and
/// one `* ` bullet per statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// Sections in display order.
    pub sections: Vec<Section>,
}

impl Report {
    /// Find a section by title.
    #[must_use]
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.title == title)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "{}", section_header(&section.title))?;
            writeln!(f)?;
            for line in &section.lines {
                writeln!(f, "* {line}")?;
            }
        }
        Ok(())
    }
}

/// Format a section header as `-- Title --` padded with dashes to [`HEADER_WIDTH`].
///
/// Titles too long to fit fall back to `- Title -`.
///
/// # Examples
/// ```
/// use hygiene_battery::report::section_header;
///
/// let header = section_header("Total");
/// assert_eq!(header.chars().count(), 66);
/// assert!(header.starts_with("---") && header.contains(" Total "));
/// ```
#[must_use]
pub fn section_header(title: &str) -> String {
    let titled = title.chars().count() + 2;
    if titled + 4 > HEADER_WIDTH {
        return format!("- {title} -");
    }
    let dashes = HEADER_WIDTH - titled;
    let left = dashes / 2;
    format!("{} {title} {}", "-".repeat(left), "-".repeat(dashes - left))
}

fn milliamps(amperes: f64) -> f64 {
    amperes * 1.0e3
}

fn microamps(amperes: f64) -> f64 {
    amperes * 1.0e6
}

/// `<label>: <energy> J (<share> % of total)`, or just the energy when no share exists.
fn energy_line(
    estimate: &Estimate,
    label: &str,
    energy: Quantity,
    share: Quantity,
) -> Option<String> {
    let energy = estimate.value(energy)?;
    Some(match estimate.value(share) {
        Some(share) => format!("{label}: {energy:.0} J ({share:.0} % of total)"),
        None => format!("{label}: {energy:.0} J"),
    })
}

fn battery_section(estimate: &Estimate) -> Section {
    let config = estimate.configuration();
    let battery = &config.battery;
    let regulator = &config.regulator;
    let mut section = Section::new("Battery & Regulator");
    section.lines.push(format!(
        "Battery: {} cells of {:.0} mAh, discharge curve factor {:.1}",
        battery.cells, battery.capacity_mah, battery.discharge_curve_factor
    ));
    section.lines.push(format!(
        "Cell voltage: {:.1} V fresh, {:.1} V dead",
        battery.fresh_voltage, battery.dead_voltage
    ));
    if let Some(capacity) = estimate.value(Quantity::CapacityCoulombs) {
        section.lines.push(format!("Cell capacity: {capacity:.0} C"));
    }
    if let Some(energy) = estimate.battery_energy() {
        section.lines.push(format!("Battery energy: {energy:.0} J"));
    }
    if let Some(voltage) = estimate.value(Quantity::AverageBatteryVoltage) {
        section
            .lines
            .push(format!("Average battery voltage: {voltage:.2} V"));
    }
    section.lines.push(format!(
        "Regulator: {:.0} % efficient, {:.1} V output",
        regulator.efficiency * 100.0,
        regulator.output_voltage
    ));
    if let Some(capacity) = estimate.value(Quantity::SystemCapacity) {
        section.lines.push(format!(
            "System battery capacity: {capacity:.0} C ({:.0} mAh) at {:.1} V",
            coulombs_to_milliamp_hours(capacity),
            regulator.output_voltage
        ));
    }
    section
}

fn led_section(estimate: &Estimate) -> Section {
    let config = estimate.configuration();
    let led = &config.led;
    let mut section = Section::new("LEDs");
    section.lines.push(format!(
        "LED lit for {:.1} s per activation, {:.0} activations per day",
        led.on_duration, config.activations_per_day
    ));
    section.lines.push(format!(
        "LED forward voltage {:.1} V through {:.0} Ohm",
        led.forward_voltage, led.resistance
    ));
    if let Some(current) = estimate.value(Quantity::LedCurrent) {
        section
            .lines
            .push(format!("Average LED current: {:.0} mA", milliamps(current)));
    }
    if let Some(current) = estimate.value(Quantity::LedPeakCurrent) {
        section.lines.push(format!(
            "Peak LED current with fresh cells: {:.0} mA",
            milliamps(current)
        ));
    }
    section.lines.extend(energy_line(
        estimate,
        "LED daily energy",
        Quantity::LedDailyEnergy,
        Quantity::LedShare,
    ));
    section
}

fn sensor_section(estimate: &Estimate) -> Section {
    let sensor = &estimate.configuration().capacitive_sensor;
    let mut section = Section::new("Capacitive Sensor");
    section.lines.push(format!(
        "Average sensor current: {:.0} uA",
        microamps(sensor.current)
    ));
    section.lines.extend(energy_line(
        estimate,
        "Sensor daily energy",
        Quantity::SensorDailyEnergy,
        Quantity::SensorShare,
    ));
    section
}

fn radio_section(estimate: &Estimate) -> Section {
    let radio = &estimate.configuration().radio;
    let mut section = Section::new("Radio");
    section.lines.push(format!(
        "Static radio current: {:.0} uA",
        microamps(radio.static_current)
    ));
    section.lines.push(format!(
        "Dispense report: {:.0} mA for {:.1} s",
        milliamps(radio.dispense_current),
        radio.dispense_duration
    ));
    if let Some(energy) = estimate.value(Quantity::RadioStaticDailyEnergy) {
        section
            .lines
            .push(format!("Static radio daily energy: {energy:.0} J"));
    }
    if let Some(energy) = estimate.value(Quantity::RadioDispenseDailyEnergy) {
        section
            .lines
            .push(format!("Dispense radio daily energy: {energy:.0} J"));
    }
    if let Some(connect) = &radio.connect {
        section.lines.push(format!(
            "Connection attempts: {:.0} per day at {:.0} mA for {:.1} s",
            connect.attempts_per_day,
            milliamps(connect.current),
            connect.duration
        ));
        if !connect.backoff.is_empty() {
            section.lines.push(format!("Backoff: {}", connect.backoff));
        }
        if let Some(energy) = estimate.value(Quantity::RadioConnectDailyEnergy) {
            section
                .lines
                .push(format!("Connection daily energy: {energy:.0} J"));
        }
    }
    section.lines.extend(energy_line(
        estimate,
        "Radio daily energy",
        Quantity::RadioDailyEnergy,
        Quantity::RadioShare,
    ));
    section
}

fn total_section(estimate: &Estimate) -> Section {
    let mut section = Section::new("Total");
    if let Some(total) = estimate.total_daily_energy() {
        section.lines.push(format!("Total daily energy: {total:.0} J"));
    }
    if let (Some(days), Some(years)) = (
        estimate.life_expectancy_days(),
        estimate.life_expectancy_years(),
    ) {
        section.lines.push(format!(
            "Life expectancy: {days:.0} days ({years:.2} years)"
        ));
    }
    section
}

fn verification_section(estimate: &Estimate) -> Option<Section> {
    let static_current = estimate.value(Quantity::StaticCurrentAtBattery)?;
    let peak_current = estimate.value(Quantity::PeakDispenseCurrentAtBattery)?;
    let mut section = Section::new("Verification");
    section.lines.push(format!(
        "Static current at fresh battery: {:.0} uA",
        microamps(static_current)
    ));
    section.lines.push(format!(
        "Peak dispense current at fresh battery: {:.0} mA",
        milliamps(peak_current)
    ));
    Some(section)
}

/// Render an estimate into report sections.
///
/// Sections appear in a fixed order: Battery & Regulator, LEDs, Capacitive
/// Sensor, Radio, Total and, when verification currents were computed,
/// Verification.
#[must_use]
pub fn render_report(estimate: &Estimate) -> Report {
    let mut sections = vec![
        battery_section(estimate),
        led_section(estimate),
        sensor_section(estimate),
        radio_section(estimate),
        total_section(estimate),
    ];
    sections.extend(verification_section(estimate));
    Report { sections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::engine::estimate;

    fn titles(report: &Report) -> Vec<&str> {
        report
            .sections
            .iter()
            .map(|section| section.title.as_str())
            .collect()
    }

    #[test]
    fn headers_are_padded_to_fixed_width() {
        let header = section_header("Battery & Regulator");
        assert_eq!(header.chars().count(), HEADER_WIDTH);
        assert!(header.starts_with(&"-".repeat(22)));
        assert!(header.ends_with(&format!(" Battery & Regulator {}", "-".repeat(23))));
    }

    #[test]
    fn long_titles_fall_back_to_single_dashes() {
        let title = "x".repeat(HEADER_WIDTH);
        assert_eq!(section_header(&title), format!("- {title} -"));
    }

    #[test]
    fn basic_report_omits_verification() {
        let estimate = estimate(&Configuration::basic()).expect("basic profile evaluates");
        let report = render_report(&estimate);
        assert_eq!(
            titles(&report),
            [
                "Battery & Regulator",
                "LEDs",
                "Capacitive Sensor",
                "Radio",
                "Total"
            ]
        );
        let battery = report.section("Battery & Regulator").expect("battery section");
        assert!(battery.lines.contains(&"Battery energy: 47196 J".to_owned()));
        assert!(battery
            .lines
            .contains(&"Average battery voltage: 4.60 V".to_owned()));
        assert!(battery
            .lines
            .iter()
            .any(|line| line.starts_with("System battery capacity: 21238 C")));
    }

    #[test]
    fn mesh_report_describes_connections_and_verification() {
        let estimate = estimate(&Configuration::mesh()).expect("mesh profile evaluates");
        let report = render_report(&estimate);
        assert_eq!(titles(&report).last(), Some(&"Verification"));

        let radio = report.section("Radio").expect("radio section");
        assert!(radio
            .lines
            .iter()
            .any(|line| line.starts_with("Backoff: retry interval doubles")));
        assert!(radio
            .lines
            .contains(&"Connection attempts: 24 per day at 12 mA for 2.0 s".to_owned()));

        let led = report.section("LEDs").expect("led section");
        assert!(led
            .lines
            .contains(&"Peak LED current with fresh cells: 18 mA".to_owned()));
    }

    #[test]
    fn display_emits_blank_line_header_and_bullets() {
        let estimate = estimate(&Configuration::basic()).expect("basic profile evaluates");
        let text = render_report(&estimate).to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some(section_header("Battery & Regulator").as_str()));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(
            lines.next(),
            Some("* Battery: 4 cells of 2850 mAh, discharge curve factor 0.5")
        );
        assert!(text.contains("* Life expectancy: "));
    }
}
