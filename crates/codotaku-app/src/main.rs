//! The binary entry point: opens a window and clears it every frame until it
//! is closed.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags, e.g. `codotaku --driver vulkan --width 1280`.

use std::process::ExitCode;

use clap::Parser;
use codotaku_app::{AppResult, Launcher};
use codotaku_app::paths::AppDirs;
use codotaku_config::{CliArgs, Config};
use tracing::{error, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match AppDirs::resolve_and_create(args.config.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to initialize application directories: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    codotaku_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    let launcher = match Launcher::new(config, std::env::args().collect()) {
        Ok(launcher) => launcher,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = launcher.quit_on_interrupt() {
        warn!("Ctrl-C will not shut down cleanly: {e}");
    }

    match launcher.run() {
        Ok(AppResult::Success) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
