//! Sarvam AI SDK for Rust.
//!
//! This crate provides a client for the Sarvam text-to-speech API.

mod client;
mod error;
mod http;
mod models;
mod tts;
mod types;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use models::*;
pub use tts::{TtsRequest, TtsResponse, TtsService};
pub use types::{Language, UnknownLanguage};
