//! Image generation router library
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `backends`: Clients for the hosted (Replicate) and local (A1111) backends.
//! - `generate`: Request validation and backend dispatch.
//! - `hairstyle`: Canned hairstyle matcher stub.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `BackendSettings`,
//! `GenerateRequest` and the backend clients.
pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod generate;
pub mod hairstyle;

pub use backends::{A1111Client, Backend, EditOutput, ReplicateClient};
pub use config::{BackendSettings, Config};
pub use error::{AppError, AppResult};
pub use generate::{generate, GenerateRequest};
