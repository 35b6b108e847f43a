//! Settings describing where aggregated logs live.
//!
//! A YAML file supplies the log root and the suffix level; `locate` finds
//! that file and applies command-line overrides on top.

pub mod generate;
pub mod locate;
pub mod parse;
pub mod types;

pub use locate::{config_file, default_config_path, home_relative, Overrides};
pub use parse::{load_config, parse_config, ConfigError};
pub use types::Config;
