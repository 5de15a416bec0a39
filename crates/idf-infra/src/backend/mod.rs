//! Identity backend over HTTP.

mod client;
mod settings;
mod wire;

pub use client::HttpIdentityBackend;
pub use settings::HttpBackendSettings;
