//! Target definitions.
//!
//! A target is the log-return of one instrument, or the difference of two
//! instruments' log-returns, over a fixed horizon (`lag`). The registry is
//! built once per run and shared read-only by the loop and the metric engine.

use crate::types::{TargetIndex, parse_target_column, target_column};
use crate::{Result, SoleraError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Separator used between the two legs of a pair target.
pub const PAIR_SEPARATOR: &str = " - ";

/// The instrument(s) a target is defined on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruments {
    /// Log-return of a single instrument.
    Single(String),
    /// Log-return of the first instrument minus that of the second.
    Pair(String, String),
}

impl Instruments {
    /// Parses `"A"` or `"A - B"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use solera_traits::Instruments;
    ///
    /// let pair = Instruments::parse("LME_AH_Close - JPX_Gold_Close").unwrap();
    /// assert!(pair.is_pair());
    /// assert!(!Instruments::parse("US_Stock_VT_adj_close").unwrap().is_pair());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SoleraError::InvalidData(
                "empty instrument name".to_string(),
            ));
        }
        match raw.split_once(PAIR_SEPARATOR) {
            Some((a, b)) => {
                let (a, b) = (a.trim(), b.trim());
                if a.is_empty() || b.is_empty() {
                    return Err(SoleraError::InvalidData(format!(
                        "malformed instrument pair: '{raw}'"
                    )));
                }
                Ok(Self::Pair(a.to_string(), b.to_string()))
            }
            None => Ok(Self::Single(raw.to_string())),
        }
    }

    /// Whether this is a pair target.
    pub const fn is_pair(&self) -> bool {
        matches!(self, Self::Pair(..))
    }
}

impl fmt::Display for Instruments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(a) => write!(f, "{a}"),
            Self::Pair(a, b) => write!(f, "{a}{PAIR_SEPARATOR}{b}"),
        }
    }
}

/// One prediction target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Position in the registry.
    pub index: TargetIndex,
    /// Horizon in days.
    pub lag: u32,
    /// Underlying instrument(s).
    pub instruments: Instruments,
}

impl Target {
    /// Canonical column name of this target.
    pub fn column_name(&self) -> String {
        target_column(self.index)
    }
}

/// Immutable, contiguous set of targets indexed `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// Builds a registry.
    ///
    /// Targets may arrive in any order but their indices must cover `0..n`
    /// exactly once, and every lag must be positive.
    pub fn new(mut targets: Vec<Target>) -> Result<Self> {
        targets.sort_by_key(|t| t.index);
        for (position, target) in targets.iter().enumerate() {
            if target.index != position {
                return Err(SoleraError::InvalidData(format!(
                    "target indices must be contiguous from 0: expected {position}, found {}",
                    target.index
                )));
            }
            if target.lag == 0 {
                return Err(SoleraError::InvalidData(format!(
                    "target {} has a zero lag",
                    target.index
                )));
            }
        }
        Ok(Self { targets })
    }

    /// Registry of `n` single-instrument targets sharing one lag.
    ///
    /// Mostly useful for tests and synthetic runs.
    pub fn uniform(n: usize, lag: u32) -> Result<Self> {
        Self::new(
            (0..n)
                .map(|index| Target {
                    index,
                    lag,
                    instruments: Instruments::Single(format!("instrument_{index}")),
                })
                .collect(),
        )
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Looks up a target.
    pub fn get(&self, index: TargetIndex) -> Option<&Target> {
        self.targets.get(index)
    }

    /// Whether the index is part of the registry.
    pub fn contains(&self, index: TargetIndex) -> bool {
        index < self.targets.len()
    }

    /// Targets in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// All target indices in canonical order.
    pub fn indices(&self) -> Vec<TargetIndex> {
        (0..self.targets.len()).collect()
    }

    /// All target indices as a set.
    pub fn index_set(&self) -> BTreeSet<TargetIndex> {
        (0..self.targets.len()).collect()
    }

    /// Targets whose horizon equals `lag`.
    pub fn with_lag(&self, lag: u32) -> impl Iterator<Item = &Target> {
        self.targets.iter().filter(move |t| t.lag == lag)
    }

    /// Distinct lags, ascending.
    pub fn lags(&self) -> Vec<u32> {
        self.targets
            .iter()
            .map(|t| t.lag)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Resolves a canonical column name to a registered target index.
    pub fn resolve_column(&self, name: &str) -> Result<TargetIndex> {
        let index = parse_target_column(name).ok_or_else(|| {
            SoleraError::InvalidData(format!("'{name}' is not a target column"))
        })?;
        if self.contains(index) {
            Ok(index)
        } else {
            Err(SoleraError::UnknownTarget(index))
        }
    }

    /// Fails with [`SoleraError::UnknownTarget`] on the first unregistered index.
    pub fn check_known<I>(&self, indices: I) -> Result<()>
    where
        I: IntoIterator<Item = TargetIndex>,
    {
        match indices.into_iter().find(|&i| !self.contains(i)) {
            Some(unknown) => Err(SoleraError::UnknownTarget(unknown)),
            None => Ok(()),
        }
    }
}
