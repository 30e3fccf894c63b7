//! Runtime configuration with hierarchical layering.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────────┐
//! │  1. Environment Variables (FIELDSHELL_*)     │
//! ├──────────────────────────────────────────────┤
//! │  2. Project Config (.fieldshell/config.toml) │
//! ├──────────────────────────────────────────────┤
//! │  3. Global Config (~/.fieldshell/config.toml)│
//! ├──────────────────────────────────────────────┤
//! │  4. Default Values (compile-time)            │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `FIELDSHELL_SCHEDULER_ENABLED` | `scheduler.enabled` | bool |
//! | `FIELDSHELL_TICK_INTERVAL_MS` | `scheduler.interval_ms` | u64 |
//! | `FIELDSHELL_DECAY_RATE` | `scheduler.decay_rate` | f64 |
//! | `FIELDSHELL_EMERGENCE_THRESHOLD` | `scheduler.emergence_threshold` | f64 |
//! | `FIELDSHELL_FRAME_TTL_MS` | `frames.ttl_ms` | u64 |
//! | `FIELDSHELL_STEP_TIMEOUT_MS` | `backends.step_timeout_ms` | u64 |
//! | `FIELDSHELL_COMPUTE_MODE` | `backends.compute_mode` | fast/compatible/cpu/auto |
//!
//! # Example Configuration
//!
//! ```toml
//! [scheduler]
//! enabled = true
//! interval_ms = 1000
//! decay_rate = 0.01
//! emergence_threshold = 0.8
//!
//! [frames]
//! ttl_ms = 3600000
//! sweep_interval_ms = 60000
//!
//! [backends]
//! step_timeout_ms = 10000
//! compute_mode = "auto"
//! transcendence_threshold = 0.85
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLoader};
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{BackendsConfig, ComputeMode, FramesConfig, RuntimeConfig, SchedulerConfig};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(PROJECT_CONFIG_DIR)
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join(PROJECT_CONFIG_FILE)
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".fieldshell";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
