use clap::{Arg, ArgAction, Command as ClapCommand};
use log::{error, LevelFilter};
use std::process;

use pondscout::commands::{CommandFactory, ScoutCommandFactory};
use pondscout::utils::logger::Logger;

fn cli() -> ClapCommand {
    ClapCommand::new("pondscout")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetch and crop satellite scenes around fish-farm pond locations")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Path of the log file")
                .value_name("FILE")
                .default_value("pondscout.log")
                .global(true),
        )
        .subcommand(
            ClapCommand::new("run")
                .about("Fetch, crop and save imagery for every configured point")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("TOML configuration file")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .help("Artifact format (npy, png, jpg)")
                        .value_name("FORMAT")
                        .required(false),
                )
                .arg(
                    Arg::new("features")
                        .long("features")
                        .help("Compute mean/median features and write features.csv")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-progress")
                        .long("no-progress")
                        .help("Do not draw a progress bar")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            ClapCommand::new("bbox")
                .about("Print the bounding box around a coordinate")
                .arg(Arg::new("lat").long("lat").value_name("DEGREES").required(true).allow_hyphen_values(true))
                .arg(Arg::new("lon").long("lon").value_name("DEGREES").required(true).allow_hyphen_values(true))
                .arg(
                    Arg::new("buffer")
                        .long("buffer")
                        .help("Buffer distance in meters")
                        .value_name("METERS")
                        .default_value("50000"),
                ),
        )
        .subcommand(
            ClapCommand::new("search")
                .about("List catalog candidates for a coordinate and the selected scene")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("TOML configuration file (defaults apply when omitted)")
                        .value_name("FILE")
                        .required(false),
                )
                .arg(Arg::new("lat").long("lat").value_name("DEGREES").required(true).allow_hyphen_values(true))
                .arg(Arg::new("lon").long("lon").value_name("DEGREES").required(true).allow_hyphen_values(true))
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("Sample date (YYYY-MM-DD)")
                        .value_name("DATE")
                        .required(true),
                ),
        )
        .subcommand(
            ClapCommand::new("features")
                .about("Print feature vectors of saved arrays as CSV")
                .arg(
                    Arg::new("files")
                        .help("Array files (.npy, .png, .jpg)")
                        .value_name("FILE")
                        .num_args(1..)
                        .required(true),
                ),
        )
}

/// `pondscout.log` -> `pondscout-global.log`
fn global_log_path(log_file: &str) -> String {
    match log_file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => format!("{}-global.{}", stem, ext),
        _ => format!("{}-global", log_file),
    }
}

fn main() {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") { LevelFilter::Debug } else { LevelFilter::Info };
    let log_file = matches.get_one::<String>("log-file")
        .cloned()
        .unwrap_or_else(|| "pondscout.log".to_string());

    let logger = match Logger::new(&log_file, level) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = Logger::init_global_logger(&global_log_path(&log_file), level) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    let factory = ScoutCommandFactory::new();

    match factory.create_command(&matches, &logger) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn negative_coordinates_parse() {
        let matches = cli().try_get_matches_from(["pondscout", "bbox", "--lat", "-7.675039", "--lon", "107.769191"]).unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "bbox");
        assert_eq!(sub.get_one::<String>("lat").unwrap(), "-7.675039");
        assert_eq!(sub.get_one::<String>("buffer").unwrap(), "50000");
    }

    #[test]
    fn global_log_name() {
        assert_eq!(global_log_path("pondscout.log"), "pondscout-global.log");
        assert_eq!(global_log_path("logs/run"), "logs/run-global");
    }
}
