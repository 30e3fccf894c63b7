//! Programmatic overrides applied after loading.
//!
//! ```text
//! ConfigLoader.load()  →  RuntimeConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()
//!                              │
//!                              ▼
//!                     RuntimeConfig (final)
//! ```

use super::RuntimeConfig;

/// Applies overrides to a loaded configuration.
///
/// Only values the resolver actually carries should be written; anything
/// else keeps its loaded value.
pub trait ConfigResolver {
    fn apply(&self, config: &mut RuntimeConfig);
}

/// Resolver that makes no changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut RuntimeConfig) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_resolver_does_nothing() {
        let mut config = RuntimeConfig::default();
        let original = config.clone();

        NoOpResolver.apply(&mut config);

        assert_eq!(config, original);
    }

    #[test]
    fn custom_resolver() {
        struct DisableScheduler;

        impl ConfigResolver for DisableScheduler {
            fn apply(&self, config: &mut RuntimeConfig) {
                config.scheduler.enabled = false;
            }
        }

        let mut config = RuntimeConfig::default();
        DisableScheduler.apply(&mut config);
        assert!(!config.scheduler.enabled);
    }
}
