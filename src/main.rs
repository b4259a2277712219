use std::error::Error;
use std::path::PathBuf;

use hygiene_battery::{estimate, render_report, Configuration, Profile};
use log::info;

/// Command line options.
#[derive(Debug, Default, PartialEq)]
struct Options {
    /// Built-in profile, used when no configuration file is given.
    profile: Option<Profile>,
    /// JSON configuration file.
    config: Option<PathBuf>,
    /// Print grouped quantities as JSON instead of the text report.
    json: bool,
}

impl Options {
    /// Parse arguments, excluding the program name.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, Box<dyn Error>> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--profile" => {
                    let name = args.next().ok_or("--profile needs a value")?;
                    options.profile = Some(name.parse()?);
                }
                "--config" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    options.config = Some(PathBuf::from(path));
                }
                "--json" => options.json = true,
                other => return Err(format!("unexpected argument `{other}`").into()),
            }
        }
        if options.profile.is_some() && options.config.is_some() {
            return Err("--profile and --config are mutually exclusive".into());
        }
        Ok(options)
    }

    /// Resolve the configuration to estimate.
    fn configuration(&self) -> Result<Configuration, Box<dyn Error>> {
        match (&self.config, self.profile) {
            (Some(path), _) => {
                info!("loading configuration from {}", path.display());
                Ok(Configuration::from_path(path)?)
            }
            (None, profile) => {
                let profile = profile.unwrap_or(Profile::Basic);
                info!("using built-in {profile} profile");
                Ok(profile.configuration())
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let options = Options::parse(std::env::args().skip(1))?;
    let configuration = options.configuration()?;

    // Evaluate every derived quantity before anything is printed so a bad
    // configuration never produces a partial report.
    let estimate = estimate(&configuration)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&estimate.grouped())?);
    } else {
        print!("{}", render_report(&estimate));
    }

    Ok(())
}
