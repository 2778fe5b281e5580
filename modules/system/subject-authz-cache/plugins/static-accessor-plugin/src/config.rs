//! Configuration for the static accessor plugin.

use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticAccessorPluginConfig {
    /// Grants per subject key.
    pub grants: Vec<GrantConfig>,
}

/// Names granted to one subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantConfig {
    /// Subject key, `user:<name>` or `group:<name>`.
    pub subject: String,

    #[serde(default)]
    pub namespaces: Vec<String>,

    #[serde(default)]
    pub accounts: Vec<String>,
}
