//! Domain layer for the static accessor plugin.

mod client;
pub mod service;

pub use service::Service;
