use thiserror::Error;

/// Invalid window configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sample capacity should be positive")]
    ZeroCapacity,
    #[error("decay period cannot be negative (got {millis}ms)")]
    NegativeDecayPeriod { millis: i64 },
}
