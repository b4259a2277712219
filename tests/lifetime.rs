use approx::assert_relative_eq;
use hygiene_battery::units::coulombs_to_milliamp_hours;
use hygiene_battery::{estimate, render_report, Configuration, EstimateError, Quantity};

fn value(estimate: &hygiene_battery::Estimate, quantity: Quantity) -> f64 {
    estimate
        .value(quantity)
        .unwrap_or_else(|| panic!("{quantity} evaluated"))
}

#[test]
fn alkaline_stack_matches_hand_calculation() {
    let estimate = estimate(&Configuration::basic()).expect("basic profile evaluates");

    // 4 * (0.8 * 10260 + 0.7 * 0.5 * 10260) = 4 * (8208 + 3591)
    assert_relative_eq!(value(&estimate, Quantity::CapacityCoulombs), 10_260.0, epsilon = 1.0e-6);
    assert_relative_eq!(value(&estimate, Quantity::BatteryEnergy), 47_196.0, epsilon = 1.0);
    assert_eq!(
        format!("{:.2}", value(&estimate, Quantity::AverageBatteryVoltage)),
        "4.60"
    );
}

#[test]
fn regulated_capacity_matches_hand_calculation() {
    let estimate = estimate(&Configuration::basic()).expect("basic profile evaluates");
    let system_capacity = value(&estimate, Quantity::SystemCapacity);
    assert_relative_eq!(system_capacity, 0.9 * 47_196.0 / 2.0, epsilon = 1.0e-6);
    assert!((coulombs_to_milliamp_hours(system_capacity) - 5_899.0).abs() < 1.0);
}

#[test]
fn life_expectancy_is_finite_and_positive() {
    for config in [Configuration::basic(), Configuration::mesh()] {
        let estimate = estimate(&config).expect("profile evaluates");
        let total = estimate.total_daily_energy().expect("total computed");
        let days = estimate.life_expectancy_days().expect("days computed");
        let years = estimate.life_expectancy_years().expect("years computed");

        assert!(total > 0.0);
        assert!(days.is_finite() && days > 0.0);
        assert_relative_eq!(years, days / 365.0, max_relative = 1.0e-12);
        assert_relative_eq!(
            days,
            estimate.battery_energy().expect("energy computed") / total,
            max_relative = 1.0e-12
        );
    }
}

#[test]
fn mesh_networking_shortens_life() {
    let basic = estimate(&Configuration::basic()).expect("basic profile evaluates");
    let mesh = estimate(&Configuration::mesh()).expect("mesh profile evaluates");
    assert!(mesh.life_expectancy_days() < basic.life_expectancy_days());
}

#[test]
fn shipped_profiles_match_builtins() {
    let basic = Configuration::from_json_str(include_str!("../profiles/basic.json"))
        .expect("basic profile parses");
    assert_eq!(basic, Configuration::basic());

    let mesh = Configuration::from_json_str(include_str!("../profiles/mesh.json"))
        .expect("mesh profile parses");
    assert_eq!(mesh, Configuration::mesh());
}

#[test]
fn disabled_device_reports_configuration_error() {
    let mut config = Configuration::basic();
    config.activations_per_day = 0.0;
    config.capacitive_sensor.current = 0.0;
    config.radio.static_current = 0.0;

    let error = estimate(&config).expect_err("nothing draws current");
    assert_eq!(error, EstimateError::ZeroTotalEnergy);
    assert!(error.to_string().contains("total daily energy is zero"));
}

#[test]
fn invalid_parameter_is_named_in_message() {
    let mut config = Configuration::basic();
    config.battery.discharge_curve_factor = -0.1;
    let error = estimate(&config).expect_err("negative factor rejected");
    assert!(error.to_string().contains("battery.discharge_curve_factor"));
}

#[test]
fn full_mesh_report_has_every_section() {
    let estimate = estimate(&Configuration::mesh()).expect("mesh profile evaluates");
    let text = render_report(&estimate).to_string();
    for title in [
        " Battery & Regulator ",
        " LEDs ",
        " Capacitive Sensor ",
        " Radio ",
        " Total ",
        " Verification ",
    ] {
        assert!(text.contains(title), "missing section {title}");
    }
    assert!(text.contains("* Battery energy: 47196 J"));
}
