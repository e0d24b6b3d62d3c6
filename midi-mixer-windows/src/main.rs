//! `midi-mixer`: map MIDI control changes to Windows volume levels.
//!
//! ```text
//! midi-mixer [--config <file>] [--log-level <level>] [--list-devices]
//! ```
//!
//! `CONFIG_FILENAME` and `LOG_LEVEL` provide defaults for the two options.
//! `RUST_LOG` takes precedence over both.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use log::LevelFilter;
use midi_mixer_core::DEFAULT_CONFIG_FILENAME;

#[derive(Debug, Clone, PartialEq)]
struct Options {
    config: PathBuf,
    log_level: LevelFilter,
    list_devices: bool,
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.to_ascii_lowercase().as_str() {
        "t" | "trace" => Some(LevelFilter::Trace),
        "d" | "debug" => Some(LevelFilter::Debug),
        "i" | "info" => Some(LevelFilter::Info),
        "w" | "warn" | "warning" => Some(LevelFilter::Warn),
        "e" | "error" => Some(LevelFilter::Error),
        _ => None,
    }
}

fn parse_options<I, E>(args: I, var: E) -> Result<Options, String>
where
    I: IntoIterator<Item = String>,
    E: Fn(&str) -> Option<String>,
{
    let mut options = Options {
        config: var("CONFIG_FILENAME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME)),
        log_level: LevelFilter::Info,
        list_devices: false,
    };
    if let Some(raw) = var("LOG_LEVEL").filter(|v| !v.is_empty()) {
        options.log_level = parse_level(&raw).ok_or_else(|| format!("invalid LOG_LEVEL: {}", raw))?;
    }

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let value = args.next().ok_or("--config needs a file name")?;
                options.config = PathBuf::from(value);
            }
            "-l" | "--log-level" => {
                let value = args.next().ok_or("--log-level needs a level")?;
                options.log_level = parse_level(&value)
                    .ok_or_else(|| format!("invalid log level: {}", value))?;
            }
            "--list-devices" => options.list_devices = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(options)
}

fn init_logging(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

#[cfg(target_os = "windows")]
fn run(options: &Options) -> Result<(), midi_mixer_core::MixerError> {
    if options.list_devices {
        let report = midi_mixer_windows::app::list_devices()?;
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("failed to format device list: {}", e),
        }
        return Ok(());
    }
    log::info!("using config file {}", options.config.display());
    midi_mixer_windows::app::run(&options.config)
}

#[cfg(not(target_os = "windows"))]
fn run(_options: &Options) -> Result<(), midi_mixer_core::MixerError> {
    Err(midi_mixer_core::MixerError::Native(
        "midi-mixer only runs on Windows".into(),
    ))
}

fn main() -> ExitCode {
    let options = match parse_options(env::args().skip(1), |name| env::var(name).ok()) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("midi-mixer: {}", message);
            return ExitCode::from(2);
        }
    };
    init_logging(options.log_level);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
