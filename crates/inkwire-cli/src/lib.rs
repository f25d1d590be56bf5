//! Command-line configuration and process startup for the `inkwire` server.

pub mod bootstrap_helpers;
pub mod cli_args;
pub mod cli_validation;
pub mod field_map_config;
pub mod startup;

pub use bootstrap_helpers::init_tracing;
pub use cli_args::{parse_positive_u64, parse_positive_usize, Cli};
pub use cli_validation::validate_cli;
pub use field_map_config::{load_field_map, parse_field_map};
pub use startup::{build_app, serve};
