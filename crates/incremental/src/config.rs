//! Aggregator configuration.

use core::num::NonZeroU32;

/// Behavior switches fixed when an aggregator is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Drop `Update` emissions whose tuple equals the last one sent.
    ///
    /// Equality is `Value` equality, which keeps the two numeric domains
    /// apart: `Int(1)` and `Float(1.0)` differ. A sum that crosses between
    /// domains (a float contributor joins or leaves, or an integer total
    /// outgrows `i64`) is reported as changed even when the magnitude is
    /// the same.
    pub skip_unchanged: bool,
    /// Re-query group membership on delete and log drift from the recorded
    /// snapshot.
    pub verify_membership: bool,
    /// Rebuild a group's accumulators from its members after this many
    /// retractions, bounding float drift.
    pub rederive_interval: Option<NonZeroU32>,
}

impl AggregatorConfig {
    /// Creates the default configuration: emit every change, no
    /// verification, no periodic re-derivation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }

    pub fn with_verify_membership(mut self, verify: bool) -> Self {
        self.verify_membership = verify;
        self
    }

    /// Sets the re-derivation interval. Zero disables it.
    pub fn with_rederive_interval(mut self, retractions: u32) -> Self {
        self.rederive_interval = NonZeroU32::new(retractions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = AggregatorConfig::new();
        assert!(!config.skip_unchanged);
        assert!(!config.verify_membership);
        assert_eq!(config.rederive_interval, None);
    }

    #[test]
    fn test_config_setters() {
        let config = AggregatorConfig::new()
            .with_skip_unchanged(true)
            .with_verify_membership(true)
            .with_rederive_interval(64);
        assert!(config.skip_unchanged);
        assert!(config.verify_membership);
        assert_eq!(config.rederive_interval.map(NonZeroU32::get), Some(64));

        assert_eq!(config.with_rederive_interval(0).rederive_interval, None);
    }
}
