use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};

use crate::cards::{Rank, ALL_RANKS};
use crate::error::{PokerError, PokerResult};

/// Ranks listed in the order their characters sort: this is the order used
/// whenever a range is rendered as a string ("AJKQT", "JQ", ...).
pub const DISPLAY_ORDER: [Rank; 5] = [Rank::Ace, Rank::Jack, Rank::King, Rank::Queen, Rank::Ten];

/// A set of ranks the opponent is believed capable of holding. One bit per
/// rank, with explicit set algebra; state keys render it as a sorted string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RankSet(u8);

impl RankSet {
    pub const EMPTY: RankSet = RankSet(0);
    pub const FULL: RankSet = RankSet(0b11111);

    pub fn single(rank: Rank) -> RankSet {
        RankSet(1 << rank.bit())
    }

    pub fn of(ranks: &[Rank]) -> RankSet {
        ranks.iter().fold(RankSet::EMPTY, |s, &r| s.with(r))
    }

    pub fn with(self, rank: Rank) -> RankSet {
        RankSet(self.0 | 1 << rank.bit())
    }

    pub fn contains(self, rank: Rank) -> bool {
        self.0 & (1 << rank.bit()) != 0
    }

    pub fn union(self, other: RankSet) -> RankSet {
        RankSet(self.0 | other.0)
    }

    pub fn intersect(self, other: RankSet) -> RankSet {
        RankSet(self.0 & other.0)
    }

    pub fn minus(self, other: RankSet) -> RankSet {
        RankSet(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Member ranks in ascending rank order (T first).
    pub fn iter(self) -> impl Iterator<Item = Rank> {
        ALL_RANKS.into_iter().filter(move |r| self.contains(*r))
    }
}

impl fmt::Display for RankSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in DISPLAY_ORDER {
            if self.contains(r) {
                write!(f, "{}", r.to_char())?;
            }
        }
        Ok(())
    }
}

impl FromStr for RankSet {
    type Err = PokerError;

    fn from_str(s: &str) -> PokerResult<RankSet> {
        let mut set = RankSet::EMPTY;
        for c in s.chars() {
            set = set.with(Rank::from_char(c)?);
        }
        Ok(set)
    }
}

impl Serialize for RankSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// All 31 non-empty subsets of the rank universe.
pub static ALL_RANGES: Lazy<Vec<RankSet>> =
    Lazy::new(|| (1u8..32).map(RankSet).collect());

/// Subsets containing `rank`.
pub fn ranges_containing(rank: Rank) -> impl Iterator<Item = RankSet> {
    ALL_RANGES.iter().copied().filter(move |r| r.contains(rank))
}
