//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers. Every
/// section is optional in a config file.
///
/// # Example
///
/// ```
/// use fieldshell_runtime::config::RuntimeConfig;
///
/// let config = RuntimeConfig::default();
/// assert!(config.scheduler.enabled);
/// assert_eq!(config.scheduler.interval_ms, 1000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Field dynamics scheduler.
    pub scheduler: SchedulerConfig,

    /// Context frame retention.
    pub frames: FramesConfig,

    /// Backend dispatch.
    pub backends: BackendsConfig,
}

impl RuntimeConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default.
    pub fn merge(&mut self, other: &Self) {
        self.scheduler.merge(&other.scheduler);
        self.frames.merge(&other.frames);
        self.backends.merge(&other.backends);
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "scheduler.interval_ms",
                "must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.scheduler.decay_rate) {
            return Err(ConfigError::invalid_value(
                "scheduler.decay_rate",
                format!("{} is outside [0, 1]", self.scheduler.decay_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.scheduler.emergence_threshold) {
            return Err(ConfigError::invalid_value(
                "scheduler.emergence_threshold",
                format!("{} is outside [0, 1]", self.scheduler.emergence_threshold),
            ));
        }
        if self.frames.sweep_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "frames.sweep_interval_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Field dynamics scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the background tick.
    pub enabled: bool,

    /// Tick interval in milliseconds.
    pub interval_ms: u64,

    /// Fraction of energy lost per tick.
    pub decay_rate: f64,

    /// Emergence score above which an event is published.
    pub emergence_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1_000,
            decay_rate: 0.01,
            emergence_threshold: 0.8,
        }
    }
}

impl SchedulerConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.interval_ms != default.interval_ms {
            self.interval_ms = other.interval_ms;
        }
        if (other.decay_rate - default.decay_rate).abs() > f64::EPSILON {
            self.decay_rate = other.decay_rate;
        }
        if (other.emergence_threshold - default.emergence_threshold).abs() > f64::EPSILON {
            self.emergence_threshold = other.emergence_threshold;
        }
    }

    /// Tick interval as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Context frame retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FramesConfig {
    /// Lifetime of a frame, measured from creation.
    pub ttl_ms: u64,

    /// How often expired frames are swept.
    pub sweep_interval_ms: u64,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 3_600_000,
            sweep_interval_ms: 60_000,
        }
    }
}

impl FramesConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.ttl_ms != default.ttl_ms {
            self.ttl_ms = other.ttl_ms;
        }
        if other.sweep_interval_ms != default.sweep_interval_ms {
            self.sweep_interval_ms = other.sweep_interval_ms;
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Backend dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendsConfig {
    /// Collaborator timeout for steps without their own `timeoutMs`.
    pub step_timeout_ms: u64,

    /// Compute mode requested from the compute collaborator.
    pub compute_mode: ComputeMode,

    /// Transcendence level at which `transcendence_achieved` is published.
    pub transcendence_threshold: f64,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: 10_000,
            compute_mode: ComputeMode::Auto,
            transcendence_threshold: 0.85,
        }
    }
}

impl BackendsConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.step_timeout_ms != default.step_timeout_ms {
            self.step_timeout_ms = other.step_timeout_ms;
        }
        if other.compute_mode != default.compute_mode {
            self.compute_mode = other.compute_mode;
        }
        if (other.transcendence_threshold - default.transcendence_threshold).abs() > f64::EPSILON
        {
            self.transcendence_threshold = other.transcendence_threshold;
        }
    }

    #[must_use]
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }
}

/// Execution mode for the compute collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeMode {
    Fast,
    Compatible,
    Cpu,
    #[default]
    Auto,
}

impl ComputeMode {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Compatible => "compatible",
            Self::Cpu => "cpu",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for ComputeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ComputeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "compatible" => Ok(Self::Compatible),
            "cpu" => Ok(Self::Cpu),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown compute mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frames.ttl_ms, 3_600_000);
        assert_eq!(config.backends.step_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = RuntimeConfig::default();
        config.scheduler.decay_rate = 0.05;
        config.backends.compute_mode = ComputeMode::Cpu;

        let text = config.to_toml().unwrap();
        assert!(text.contains("compute_mode = \"cpu\""));
        assert_eq!(RuntimeConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml("[scheduler]\ninterval_ms = 250\n").unwrap();
        assert_eq!(config.scheduler.interval_ms, 250);
        assert!(config.scheduler.enabled);
        assert_eq!(config.frames, FramesConfig::default());
    }

    #[test]
    fn merge_only_overrides_non_defaults() {
        let mut base = RuntimeConfig::default();
        base.scheduler.decay_rate = 0.2;
        base.frames.ttl_ms = 10;

        let mut overlay = RuntimeConfig::default();
        overlay.scheduler.emergence_threshold = 0.5;

        base.merge(&overlay);

        assert!((base.scheduler.decay_rate - 0.2).abs() < f64::EPSILON);
        assert!((base.scheduler.emergence_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(base.frames.ttl_ms, 10);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut config = RuntimeConfig::default();
        config.scheduler.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RuntimeConfig::default();
        config.scheduler.decay_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = RuntimeConfig::default();
        config.scheduler.emergence_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn compute_mode_parse() {
        assert_eq!("FAST".parse::<ComputeMode>(), Ok(ComputeMode::Fast));
        assert_eq!("auto".parse::<ComputeMode>(), Ok(ComputeMode::Auto));
        assert!("gpu".parse::<ComputeMode>().is_err());
    }
}
