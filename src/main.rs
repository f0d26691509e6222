use std::process;
use log::{error, LevelFilter};

use crskit::api::CrsKit;
use crskit::commands::{build_cli, CommandFactory, CrsKitCommandFactory};
use crskit::utils::logger::Logger;

fn main() {
    let matches = build_cli().get_matches();

    let level = if matches.get_flag("verbose") { LevelFilter::Debug } else { LevelFilter::Info };
    let log_file = matches.get_one::<String>("log-file").map(String::as_str);

    match log_file {
        Some(path) => {
            if let Err(e) = Logger::init_global_logger(path, level) {
                eprintln!("Error setting up global logger: {}", e);
                process::exit(1);
            }
        },
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
                .init();
        },
    }

    let definitions = matches.get_one::<String>("definitions").map(String::as_str);
    let kit = match CrsKit::new(definitions, log_file) {
        Ok(kit) => kit,
        Err(e) => {
            error!("Failed to initialise: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let factory = CrsKitCommandFactory::new(&kit);

    let command_result = factory.create_command(&matches, kit.logger());
    match command_result {
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
