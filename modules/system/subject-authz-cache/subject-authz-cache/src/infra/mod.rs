//! Infrastructure adapters.

pub mod memory;
