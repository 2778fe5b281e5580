#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Access Decision Accessor Plugin
//!
//! This plugin answers accessor queries from a fixed grant table for
//! development and testing. The verb is ignored and subjects without a grant
//! get empty lists.
//!
//! ## Configuration
//!
//! ```yaml
//! modules:
//!   static_accessor_plugin:
//!     config:
//!       grants:
//!         - subject: "user:foo"
//!           namespaces: ["test", "test2"]
//!         - subject: "group:bar"
//!           accounts: ["foo", "bar"]
//! ```

pub mod config;
pub mod domain;

pub use config::{GrantConfig, StaticAccessorPluginConfig};
pub use domain::Service;
