use std::{cmp::Reverse, fmt, str::FromStr};

use crate::{error::ArenaError, freelist::Registry, kernel::Mapping, list::NodeId};

/// Policy used to pick the free block that satisfies an allocation request.
/// It is chosen once when the arena is created and never changes afterwards.
///
/// Every strategy only considers blocks whose gross size can hold the request
/// plus the header of the new allocation. Among those:
///
/// - [`FitStrategy::FirstFit`] takes the first one in free list order.
/// - [`FitStrategy::BestFit`] takes the smallest one.
/// - [`FitStrategy::WorstFit`] takes the largest one.
///
/// Ties between equally sized candidates always go to the block found first
/// in free list order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FitStrategy {
    #[default]
    FirstFit,
    BestFit,
    WorstFit,
}

impl FitStrategy {
    pub const ALL: [FitStrategy; 3] = [Self::FirstFit, Self::BestFit, Self::WorstFit];

    /// Returns the free block that should host a block of `needed` gross
    /// bytes, or `None` if no free block is large enough.
    pub(crate) fn select(self, free: &Registry, needed: usize, memory: &Mapping) -> Option<NodeId> {
        let mut candidates = free
            .iter()
            .map(|(node, block)| (node, block.size(memory)))
            .filter(|&(_, size)| size >= needed);

        // `min_by_key` keeps the first of several equal elements, so both
        // best and worst fit resolve ties in scan order.
        let chosen = match self {
            Self::FirstFit => candidates.next(),
            Self::BestFit => candidates.min_by_key(|&(_, size)| size),
            Self::WorstFit => candidates.min_by_key(|&(_, size)| Reverse(size)),
        };

        chosen.map(|(node, _)| node)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstFit => "first-fit",
            Self::BestFit => "best-fit",
            Self::WorstFit => "worst-fit",
        }
    }
}

impl fmt::Display for FitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitStrategy {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "first-fit" | "firstfit" | "first" => Ok(Self::FirstFit),
            "best-fit" | "bestfit" | "best" => Ok(Self::BestFit),
            "worst-fit" | "worstfit" | "worst" => Ok(Self::WorstFit),
            _ => Err(ArenaError::InvalidStrategy(s.to_owned())),
        }
    }
}

/// Discriminants used by C style callers: `0` first fit, `1` best fit and
/// `2` worst fit.
impl TryFrom<u32> for FitStrategy {
    type Error = ArenaError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FirstFit),
            1 => Ok(Self::BestFit),
            2 => Ok(Self::WorstFit),
            other => Err(ArenaError::InvalidStrategy(other.to_string())),
        }
    }
}
