mod panes;
mod runtime;
mod ui;

use std::fs::File;

use pcdice_core::midi::{MidiOutputManager, MidiOutputs};

use ui::RatatuiBackend;

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("pcdice")
        .join("pcdice.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path).unwrap_or_else(|_| {
        File::create("/tmp/pcdice.log").expect("Cannot create log file")
    });

    WriteLogger::init(log_level, Config::default(), log_file)
        .expect("Failed to initialize logger");

    log::info!("pcdice starting (log level: {:?})", log_level);
}

fn list_devices() {
    let mut midi = MidiOutputManager::new();
    let ports = midi.list_outputs();
    if ports.is_empty() {
        println!("No MIDI outputs found");
        return;
    }
    for port in ports {
        println!("{}", port.name);
    }
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    if args.iter().any(|a| a == "--list-devices") {
        list_devices();
        return Ok(());
    }

    let mut backend = RatatuiBackend::new()?;
    backend.start()?;

    let result = runtime::run(&mut backend);

    backend.stop()?;
    result
}
