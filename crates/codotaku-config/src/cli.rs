//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Codotaku command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "codotaku", about = "Window + GPU device shell that clears the screen")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Preferred GPU driver; repeat to add fallbacks (vulkan, metal, dx12, gl).
    #[arg(long = "driver")]
    pub drivers: Vec<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// Drivers given on the command line are tried before the ones from the
    /// config file.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if !args.drivers.is_empty() {
            let mut drivers = args.drivers.clone();
            drivers.extend(
                self.gpu
                    .preferred_drivers
                    .drain(..)
                    .filter(|d| !args.drivers.contains(d)),
            );
            self.gpu.preferred_drivers = drivers;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
