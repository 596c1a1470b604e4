//! Codotaku application shell.
//!
//! Provides the lifecycle controller that owns the window and GPU device, the
//! platform seam it drives, and the winit runner that hosts it.

pub mod lifecycle;
pub mod paths;
pub mod platform;
pub mod runner;
pub mod winit_platform;

#[cfg(test)]
mod testing;

pub use lifecycle::{App, AppResult, InitError, LifecycleState, UpdateFn};
pub use platform::{AppEvent, AppWindow, GpuDevice, Platform, PlatformError, WindowDescriptor, WindowId};
pub use runner::{Launcher, QuitRequest, RunError};
