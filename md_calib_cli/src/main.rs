//! # md_calib_cli
//!
//! Part of the md_calib crate family.
//!
//! Command line application that accumulates LED calibration flashes from a file of event
//! records and writes the run report.
//!
//! ## Use
//!
//! Make a template configuration with
//!
//! ```bash
//! md_calib_cli -p config.yml new
//! ```
//!
//! then fill it in and run
//!
//! ```bash
//! md_calib_cli -p config.yml
//! ```
//!
//! A log is written to `md_calib.log` in the working directory.
use clap::{Arg, Command};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use libmd_calib::config::Config;
use libmd_calib::process::process_run;
use libmd_calib::worker_status::WorkerStatus;

const LOG_PATH: &str = "./md_calib.log";

/// Keep the console sinks of the default logger and add a log file
fn init_logging(log_path: &Path) -> spdlog::Result<()> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(log_path)
            .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
                ),
            )))
            .truncate(true)
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .sinks(spdlog::default_logger().sinks().to_owned())
            .sink(file_sink)
            .flush_level_filter(spdlog::LevelFilter::All)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

fn make_template_config(path: &Path) {
    match Config::default().write_config_file(path) {
        Ok(()) => spdlog::info!("Done."),
        Err(e) => spdlog::error!("Could not write template config: {e}"),
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("md_calib_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    if let Err(e) = init_logging(Path::new(LOG_PATH)) {
        spdlog::error!("Could not create log file {LOG_PATH}: {e}");
    }

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            spdlog::error!("A configuration path is required");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        spdlog::info!("Making a template config at {}...", config_path.display());
        make_template_config(&config_path);
        return;
    }

    // Load our config
    spdlog::info!("Loading config from {}...", config_path.display());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            return;
        }
    };
    spdlog::info!("Config successfully loaded.");
    spdlog::info!("Event Path: {}", config.event_path.display());
    spdlog::info!("Report Path: {}", config.report_path.display());
    match config.seed {
        Some(seed) => spdlog::info!("Seed: {seed}"),
        None => spdlog::info!("Seed: from entropy"),
    }
    spdlog::info!("Number of crate workers: {}", config.n_threads);

    // Setup the progress bar
    let pb = ProgressBar::new(100).with_style(
        ProgressStyle::with_template("{bar:40} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(move || process_run(&config, &tx));

    loop {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(status) => {
                pb.set_position((status.progress * 100.0) as u64);
                pb.set_message(format!("{} events read", status.events_read));
            }
            Err(mpsc::RecvTimeoutError::Timeout) => (),
            Err(mpsc::RecvTimeoutError::Disconnected) => (),
        }

        if handle.is_finished() {
            match handle.join() {
                Ok(result) => match result {
                    Ok((_, report)) => spdlog::info!(
                        "Successfully accumulated {} flashes!",
                        report.total_flashes
                    ),
                    Err(e) => spdlog::error!("Processing failed with error: {e}"),
                },
                Err(_) => spdlog::error!("Failed to join processing task!"),
            }
            break;
        }
    }

    pb.finish();

    spdlog::info!("Done.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_writes_file() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(_) => panic!(),
        };
        let log_path = dir.path().join("md_calib.log");
        if let Err(e) = init_logging(&log_path) {
            panic!("{e}");
        }
        spdlog::info!("logging to {}", log_path.display());

        let contents = match std::fs::read_to_string(&log_path) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        assert!(contents.contains("logging to"));
        assert!(contents.contains("[info]"));
    }
}
