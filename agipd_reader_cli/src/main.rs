//! # agipd_reader_cli
//!
//! Part of the agipd_reader crate family.
//!
//! ## Use
//!
//! Make a template configuration with
//!
//! ```bash
//! agipd_reader_cli -p config.yml new
//! ```
//!
//! then scan every event of a run (max projection and pixel statistics) with
//!
//! ```bash
//! agipd_reader_cli -p config.yml
//! ```
//!
//! or inspect a single event with `--train` and `--pulse`.
use clap::{value_parser, Arg, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use libagipd_reader::config::Config;
use libagipd_reader::process::{inspect_event, process};
use libagipd_reader::worker_status::ScanStatus;

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

fn main() {
    // Create a cli
    let matches = Command::new("agipd_reader_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the file"),
        )
        .arg(
            Arg::new("train")
                .long("train")
                .value_parser(value_parser!(u64))
                .requires("pulse")
                .help("Train ID of a single event to inspect"),
        )
        .arg(
            Arg::new("pulse")
                .long("pulse")
                .value_parser(value_parser!(u64))
                .requires("train")
                .help("Pulse ID of a single event to inspect"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");
    log::set_max_level(simplelog::LevelFilter::Info);

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Base Path: {}", config.base_path.to_string_lossy());
    log::info!("Module Token: {}", config.module_token);
    log::info!("Number of Modules: {}", config.n_modules);
    log::info!("Image Group: {}", config.image_group);
    log::info!(
        "Assemble Unusable Modules: {}",
        config.assemble_unusable_modules
    );

    if let (Some(train), Some(pulse)) = (
        matches.get_one::<u64>("train"),
        matches.get_one::<u64>("pulse"),
    ) {
        match inspect_event(&config, *train, *pulse) {
            Ok(_) => log::info!("Done."),
            Err(e) => log::error!("Reading event failed with error: {e}"),
        }
        return;
    }

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    let (tx, rx) = channel::<ScanStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(move || process(config, tx));

    // The channel closes when the task finishes, successfully or not
    for status in rx.iter() {
        pb.set_position((status.progress * 100.0) as u64);
    }

    match handle.join() {
        Ok(result) => match result {
            Ok(projection) => log::info!(
                "Successfully scanned {} events!",
                projection.frames_read
            ),
            Err(e) => log::error!("Scanning failed with error: {e}"),
        },
        Err(_) => log::error!("Failed to join scanning task!"),
    }

    pb.finish();

    log::info!("Done.");
}
