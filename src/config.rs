//! Arena configuration parameters.

use std::env;

use crate::{
    block::{HEADER_SIZE, MIN_BLOCK_SIZE},
    error::ArenaError,
    strategy::FitStrategy,
};

/// Configuration for an arena.
///
/// Validated when the arena is created; both values are fixed for the
/// lifetime of the arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the backing buffer in bytes, headers included.
    ///
    /// The first [`HEADER_SIZE`] bytes hold the header of the initial free
    /// block, so at most `total_size - HEADER_SIZE` bytes can be handed out.
    pub total_size: usize,

    /// Placement strategy. Default: [`FitStrategy::FirstFit`].
    pub strategy: FitStrategy,
}

impl ArenaConfig {
    /// Default arena size: 1MB.
    pub const DEFAULT_TOTAL_SIZE: usize = 1024 * 1024;

    /// Environment variable holding the arena size in bytes.
    pub const SIZE_VAR: &'static str = "ARENA_SIZE";

    /// Environment variable holding the strategy name, see [`FitStrategy`]'s
    /// `FromStr` implementation for the accepted spellings.
    pub const STRATEGY_VAR: &'static str = "ARENA_STRATEGY";

    /// Create a config for an arena of `total_size` bytes using first fit.
    pub fn new(total_size: usize) -> Self {
        Self {
            total_size,
            strategy: FitStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: FitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Checks that an arena can actually be built from this config. The arena
    /// must fit at least one block, and sizes are stored as `i64` headers.
    pub fn validate(&self) -> Result<(), ArenaError> {
        let max_size = usize::try_from(i64::MAX).unwrap_or(usize::MAX);

        if self.total_size < MIN_BLOCK_SIZE || self.total_size > max_size {
            return Err(ArenaError::InvalidSize {
                size: self.total_size,
            });
        }

        Ok(())
    }

    /// Usable bytes of a freshly created arena.
    pub fn usable_size(&self) -> usize {
        self.total_size.saturating_sub(HEADER_SIZE)
    }

    /// Reads [`ArenaConfig::SIZE_VAR`] and [`ArenaConfig::STRATEGY_VAR`] from
    /// the process environment. Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ArenaError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ArenaConfig::from_env`] but reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ArenaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::SIZE_VAR) {
            config.total_size =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ArenaError::InvalidConfig {
                        key: Self::SIZE_VAR,
                        value: value.clone(),
                    })?;
        }

        if let Some(value) = lookup(Self::STRATEGY_VAR) {
            config.strategy = value.parse()?;
        }

        config.validate()?;

        Ok(config)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOTAL_SIZE)
    }
}
