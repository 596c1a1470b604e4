//! Configuration system for the Codotaku shell.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line via clap. Missing fields fall back to defaults and unknown
//! fields are ignored, so older and newer config files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{AppConfig, Config, DebugConfig, GpuConfig, WindowConfig, CONFIG_FILE_NAME};
pub use error::ConfigError;
