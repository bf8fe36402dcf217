//! CLI utilities for kahani.
//!
//! Context-based configuration, request file loading and result output
//! shared by the `kahani` binary.

pub mod config;
pub mod output;
pub mod request;

pub use config::{load_config, mask_api_key, Config, Context};
pub use output::{format_bytes, output_result, print_success, print_warning, OutputFormat};
pub use request::{load_request, parse_request, RequestError};
