//! pypip CLI library components.
//!
//! The main binary is in `main.rs`.

pub mod commands;
pub mod display;
pub mod installer;
pub mod logging;

pub use commands::AppContext;
pub use installer::PipInstaller;
