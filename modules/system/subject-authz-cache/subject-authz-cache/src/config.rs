//! Configuration for the subject `AuthZ` cache.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

/// Environment prefix for overrides, e.g. `SUBJECT_AUTHZ_CACHE__WORKERS=2`.
pub const ENV_PREFIX: &str = "SUBJECT_AUTHZ_CACHE__";

/// Configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubjectAuthzCacheConfig {
    /// Number of consumption loops draining the recompute queue.
    pub workers: usize,

    /// Verb passed to the accessor on recompute. The stored answer is
    /// served for every recognized verb.
    pub recompute_verb: String,

    /// First retry delay after a failed recompute.
    #[serde(with = "humantime_duration")]
    pub backoff_base: Duration,

    /// Upper bound for the retry delay.
    #[serde(with = "humantime_duration")]
    pub backoff_max: Duration,

    /// Re-enqueue every known subject at this interval. Disabled when unset.
    #[serde(with = "humantime_duration_opt")]
    pub resync_interval: Option<Duration>,
}

impl Default for SubjectAuthzCacheConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            recompute_verb: "get".to_owned(),
            backoff_base: Duration::from_millis(5),
            backoff_max: Duration::from_secs(1000),
            resync_interval: None,
        }
    }
}

impl SubjectAuthzCacheConfig {
    /// Layered figment: built-in defaults, then the optional YAML file, then
    /// `SUBJECT_AUTHZ_CACHE__*` environment variables.
    ///
    /// A `yaml` path that does not exist makes extraction fail.
    #[must_use]
    pub fn figment(yaml: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = yaml {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails or the values are inconsistent.
    pub fn load(figment: &Figment) -> anyhow::Result<Self> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.recompute_verb.is_empty() {
            anyhow::bail!("recompute_verb must not be empty");
        }
        if self.backoff_base.is_zero() {
            anyhow::bail!("backoff_base must be greater than zero");
        }
        if self.backoff_max < self.backoff_base {
            anyhow::bail!(
                "backoff_max ({:?}) must not be smaller than backoff_base ({:?})",
                self.backoff_max,
                self.backoff_base
            );
        }
        if self.resync_interval.is_some_and(|d| d.is_zero()) {
            anyhow::bail!("resync_interval must be greater than zero when set");
        }
        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

mod humantime_duration_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| humantime::parse_duration(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
