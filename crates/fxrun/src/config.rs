//! Runtime configuration.

use std::time::Duration;

use crate::convention::DEFAULT_SLACK;

/// Default upper bound on cached compiled modules.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Default interval between engine epoch ticks.
pub const DEFAULT_EPOCH_TICK: Duration = Duration::from_millis(10);

/// Knobs for the call engine.
///
/// ```rust
/// # use fxrun::Config;
/// let config = Config::standard().slack(4096).check_arity(false);
/// assert_eq!(config.get_slack(), 4096);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    slack: u32,
    memory_export: String,
    alloc_export: String,
    check_arity: bool,
    cache_modules: bool,
    cache_capacity: usize,
    epoch_tick: Duration,
}

impl Config {
    pub fn standard() -> Self {
        Self {
            slack: DEFAULT_SLACK,
            memory_export: "memory".into(),
            alloc_export: "alloc".into(),
            check_arity: true,
            cache_modules: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            epoch_tick: DEFAULT_EPOCH_TICK,
        }
    }

    /// Extra bytes requested beyond the linear input. Never below `DEFAULT_SLACK`.
    pub fn slack(mut self, slack: u32) -> Self {
        self.slack = slack.max(DEFAULT_SLACK);
        self
    }

    /// Name of the exported linear memory.
    pub fn memory_export(mut self, name: impl Into<String>) -> Self {
        self.memory_export = name.into();
        self
    }

    /// Name of the exported `(i32) -> i32` allocator.
    pub fn alloc_export(mut self, name: impl Into<String>) -> Self {
        self.alloc_export = name.into();
        self
    }

    /// Reject calls whose argument count differs from the manifest's declared args.
    pub fn check_arity(mut self, on: bool) -> Self {
        self.check_arity = on;
        self
    }

    /// Reuse compiled modules across calls to the same bytecode.
    pub fn cache_modules(mut self, on: bool) -> Self {
        self.cache_modules = on;
        self
    }

    /// Most compiled modules kept at once. Zero disables the cache.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// How often running guests yield to the executor. Bounds cancellation latency.
    pub fn epoch_tick(mut self, tick: Duration) -> Self {
        self.epoch_tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn get_slack(&self) -> u32 {
        self.slack
    }

    pub fn get_memory_export(&self) -> &str {
        &self.memory_export
    }

    pub fn get_alloc_export(&self) -> &str {
        &self.alloc_export
    }

    pub fn get_check_arity(&self) -> bool {
        self.check_arity
    }

    pub fn get_cache_modules(&self) -> bool {
        self.cache_modules
    }

    /// Effective cache capacity: zero when caching is off.
    pub fn get_cache_capacity(&self) -> usize {
        if self.cache_modules { self.cache_capacity } else { 0 }
    }

    pub fn get_epoch_tick(&self) -> Duration {
        self.epoch_tick
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_never_below_default() {
        assert_eq!(Config::standard().slack(10).get_slack(), DEFAULT_SLACK);
        assert_eq!(Config::standard().slack(1000).get_slack(), 1000);
    }

    #[test]
    fn test_standard_exports() {
        let c = Config::default();
        assert_eq!(c.get_memory_export(), "memory");
        assert_eq!(c.get_alloc_export(), "alloc");
        assert!(c.get_check_arity());
        assert!(c.get_cache_modules());
        assert_eq!(c.get_cache_capacity(), DEFAULT_CACHE_CAPACITY);
        assert_eq!(c.get_epoch_tick(), DEFAULT_EPOCH_TICK);
    }

    #[test]
    fn test_disabled_cache_has_no_capacity() {
        assert_eq!(Config::standard().cache_modules(false).get_cache_capacity(), 0);
        assert_eq!(Config::standard().cache_capacity(0).get_cache_capacity(), 0);
        assert_eq!(Config::standard().cache_capacity(3).get_cache_capacity(), 3);
    }
}
