use hygiene_battery::{estimate, render_report, Configuration, Quantity};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Start from the mesh profile and try a lithium stack with a flat discharge curve
    let mut config = Configuration::mesh();
    config.battery.discharge_curve_factor = 1.0;
    config.battery.cells = 2;
    config.battery.fresh_voltage = 3.0;
    config.battery.dead_voltage = 2.0;

    let estimate = estimate(&config)?;
    print!("{}", render_report(&estimate));

    // Which subsystem dominates the budget?
    let radio_share = estimate.value(Quantity::RadioShare).unwrap_or(0.0);
    println!();
    println!("Radio share of daily energy: {radio_share:.0} %");

    Ok(())
}
