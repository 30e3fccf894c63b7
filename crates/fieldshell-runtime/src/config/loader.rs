//! Layered config loading.
//!
//! Layers apply in [`ConfigLayer::ORDER`]; each overrides the one before.
//! Files that do not exist are skipped silently, files that exist but do
//! not parse are errors. The merged result is validated once at the end.

use super::{default_config_path, ConfigError, RuntimeConfig, PROJECT_CONFIG_DIR, PROJECT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// One source the loader reads from, above compile-time defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigLayer {
    /// `~/.fieldshell/config.toml`, or the path given to
    /// [`ConfigLoader::with_global_config`].
    Global,
    /// `<root>/.fieldshell/config.toml`; needs a project root.
    Project,
    /// `FIELDSHELL_*` variables.
    Env,
}

impl ConfigLayer {
    pub const ORDER: [ConfigLayer; 3] = [Self::Global, Self::Project, Self::Env];
}

/// Reads and merges [`RuntimeConfig`] layers.
///
/// ```no_run
/// use fieldshell_runtime::config::{ConfigLayer, ConfigLoader};
///
/// let config = ConfigLoader::new()
///     .with_project_root("/srv/fields")
///     .without(ConfigLayer::Env)
///     .load()?;
/// # Ok::<(), fieldshell_runtime::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    global_path: Option<PathBuf>,
    project_root: Option<PathBuf>,
    disabled: Vec<ConfigLayer>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Leaves `layer` out of the merge.
    #[must_use]
    pub fn without(mut self, layer: ConfigLayer) -> Self {
        if !self.disabled.contains(&layer) {
            self.disabled.push(layer);
        }
        self
    }

    /// Every layer disabled: [`load`](Self::load) returns the defaults.
    #[must_use]
    pub fn isolated() -> Self {
        ConfigLayer::ORDER
            .into_iter()
            .fold(Self::new(), Self::without)
    }

    /// Merges every enabled layer over the defaults and validates the result.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for an unreadable or malformed file, a malformed
    /// environment variable, or a merged config that fails
    /// [`RuntimeConfig::validate`].
    pub fn load(&self) -> Result<RuntimeConfig, ConfigError> {
        let mut config = RuntimeConfig::default();

        for layer in ConfigLayer::ORDER {
            if self.disabled.contains(&layer) {
                continue;
            }
            match layer {
                ConfigLayer::Env => apply_env(&mut config)?,
                file_layer => {
                    let Some(path) = self.file_for(file_layer) else {
                        continue;
                    };
                    if let Some(file) = read_file(&path)? {
                        debug!(layer = ?file_layer, path = %path.display(), "Merged config file");
                        config.merge(&file);
                    }
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn file_for(&self, layer: ConfigLayer) -> Option<PathBuf> {
        match layer {
            ConfigLayer::Global => Some(
                self.global_path
                    .clone()
                    .unwrap_or_else(default_config_path),
            ),
            ConfigLayer::Project => self
                .project_root
                .as_ref()
                .map(|root| root.join(PROJECT_CONFIG_DIR).join(PROJECT_CONFIG_FILE)),
            ConfigLayer::Env => None,
        }
    }
}

fn read_file(path: &Path) -> Result<Option<RuntimeConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    RuntimeConfig::from_toml(&text)
        .map(Some)
        .map_err(|e| ConfigError::parse_toml(path, e))
}

fn apply_env(config: &mut RuntimeConfig) -> Result<(), ConfigError> {
    env_override("FIELDSHELL_SCHEDULER_ENABLED", &mut config.scheduler.enabled, parse_switch)?;
    env_override("FIELDSHELL_TICK_INTERVAL_MS", &mut config.scheduler.interval_ms, parse_plain)?;
    env_override("FIELDSHELL_DECAY_RATE", &mut config.scheduler.decay_rate, parse_plain)?;
    env_override(
        "FIELDSHELL_EMERGENCE_THRESHOLD",
        &mut config.scheduler.emergence_threshold,
        parse_plain,
    )?;
    env_override("FIELDSHELL_FRAME_TTL_MS", &mut config.frames.ttl_ms, parse_plain)?;
    env_override("FIELDSHELL_STEP_TIMEOUT_MS", &mut config.backends.step_timeout_ms, parse_plain)?;
    env_override("FIELDSHELL_COMPUTE_MODE", &mut config.backends.compute_mode, parse_plain)
}

/// Overwrites `target` when `var` is set; a set but unparseable value is an error.
fn env_override<T>(
    var: &'static str,
    target: &mut T,
    parse: fn(&str) -> Option<T>,
) -> Result<(), ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(());
    };
    *target = parse(&raw).ok_or_else(|| {
        ConfigError::invalid_env_var(var, format!("cannot parse {raw:?} as {}", std::any::type_name::<T>()))
    })?;
    Ok(())
}

/// `true/false`, `1/0`, `yes/no`, `on/off`, any case.
fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_plain<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}
