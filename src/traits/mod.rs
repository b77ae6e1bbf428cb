//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (buffered and streaming POST)
//! - [`ConfigProvider`] - Endpoint configuration resolution

pub mod config;
pub mod http;

pub use config::ConfigProvider;
pub use http::{ByteStream, Headers, HttpClient, Response};
