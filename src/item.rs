//! Candidate inputs and the oracle's verdict on them.

/// Ordinal reported by the oracle for a mutated candidate.
///
/// The engine treats any variant other than [`HitRank::NoInteraction`] as
/// "still reaches the target branch" for branch-mask learning (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum HitRank {
    /// No uncovered branch interaction.
    NoInteraction = 0,
    /// The input exercises an uncovered branch.
    UncoveredBranch = 1,
    /// The input hits the current target branch.
    CurrentBranch = 2,
    /// The input discovered a new branch.
    NewBranch = 3,
}

impl HitRank {
    /// True for every variant but [`HitRank::NoInteraction`].
    pub const fn reaches_branch(self) -> bool {
        !matches!(self, Self::NoInteraction)
    }

    /// Reconstruct from the raw ordinal the oracle returns. Any value
    /// outside `0..=3` saturates to [`HitRank::NewBranch`], the strongest
    /// signal, rather than silently truncating: an oracle bug that emits an
    /// out-of-range rank shouldn't look like "no interaction" to the learner.
    pub const fn from_ordinal(raw: u8) -> Self {
        match raw {
            0 => Self::NoInteraction,
            1 => Self::UncoveredBranch,
            2 => Self::CurrentBranch,
            _ => Self::NewBranch,
        }
    }
}

impl Default for HitRank {
    fn default() -> Self {
        Self::NoInteraction
    }
}

/// The oracle's verdict on a single executed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OracleResult {
    /// 64-bit coverage fingerprint.
    pub cksum: u64,
}

/// A candidate input together with everything the oracle reported about it.
///
/// `fuzzed_count` and `depth` are scheduler bookkeeping, opaque to the
/// mutation engine: it neither reads nor writes them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuzzItem {
    /// The raw bytes of this candidate.
    pub data: Vec<u8>,
    /// The oracle's coverage result for `data`.
    pub res: OracleResult,
    /// Opaque scheduler bookkeeping.
    pub fuzzed_count: u64,
    /// Opaque scheduler bookkeeping.
    pub depth: u64,
    /// The oracle's branch-hit ordinal for `data`.
    pub hit_rank: HitRank,
}

impl FuzzItem {
    /// Construct a fresh item from raw bytes, with no oracle result yet.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            res: OracleResult::default(),
            fuzzed_count: 0,
            depth: 0,
            hit_rank: HitRank::NoInteraction,
        }
    }

    /// Length of the candidate's data, in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the candidate is empty. The engine never constructs one of
    /// these, but corpus items supplied by the host could be, in principle.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
