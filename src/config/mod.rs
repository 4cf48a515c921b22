//! Compiler configuration

mod config_loader;

pub use config_loader::{load_config, parse_config, CompilerConfig, ConfigOverrides};
