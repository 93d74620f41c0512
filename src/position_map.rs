//! Uniform random selection among the positions a branch mask currently
//! admits.
//!
//! Havoc repeatedly needs "a run of N still-modifiable bytes starting where,
//! picked uniformly among all valid starts" and "a position I can still
//! insert before, picked uniformly." Both are answered by scanning the mask
//! once per call into a reusable scratch buffer of candidate starts, then
//! indexing into it — the maximal-run walk below, plus a uniform pick,
//! amortizing the scratch allocation across the many calls a havoc round
//! makes.

use crate::branch_mask::BranchMask;
use crate::rng::EngineRng;

/// Reusable scratch buffer for admissible-position enumeration.
#[derive(Debug, Clone, Default)]
pub struct PositionMap {
    scratch: Vec<u32>,
}

impl PositionMap {
    /// An empty scratch buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A uniformly random start position such that a contiguous run of
    /// `(num_to_modify_bits / 8).max(1)` bytes beginning there are all still
    /// modifiable, restricted to the first `map_len` bytes of `mask`.
    ///
    /// `num_to_modify_bits < 8` (the single-bit-flip case) still validates a
    /// whole modifiable byte, then widens the result to a bit offset within
    /// it — the caller wants a bit position, not a byte position, but the
    /// mask only ever tracks capability at byte granularity.
    ///
    /// Returns `None` if no run of the required length exists.
    pub fn random_modifiable_position(
        &mut self,
        mask: &BranchMask,
        map_len: usize,
        num_to_modify_bits: u32,
        rng: &mut impl EngineRng,
    ) -> Option<u32> {
        let run_len = (num_to_modify_bits / 8).max(1) as usize;
        self.scratch.clear();

        let mut in_zero_block = true;
        let mut run_start = 0usize;

        for i in 0..map_len {
            if mask.can_modify(i) {
                if in_zero_block {
                    run_start = i;
                    in_zero_block = false;
                }
            } else {
                if !in_zero_block {
                    self.push_run(run_start, i, run_len);
                }
                in_zero_block = true;
            }
        }
        if !in_zero_block {
            self.push_run(run_start, map_len, run_len);
        }

        if self.scratch.is_empty() {
            return None;
        }
        let idx = rng.below(self.scratch.len() as u32) as usize;
        let base = self.scratch[idx];
        if num_to_modify_bits >= 8 {
            Some(base)
        } else {
            Some(base * 8 + rng.below(8))
        }
    }

    /// Push every valid run-start in `[run_start, end_exclusive - run_len]`.
    fn push_run(&mut self, run_start: usize, end_exclusive: usize, run_len: usize) {
        if end_exclusive < run_start + run_len {
            return;
        }
        let last_start = end_exclusive - run_len;
        self.scratch
            .extend((run_start..=last_start).map(|j| j as u32));
    }

    /// A uniformly random position in `0..=map_len` the mask still permits
    /// inserting before. Unlike [`PositionMap::random_modifiable_position`],
    /// this never reports failure: if nothing in range is insert-capable, it
    /// falls back to appending at `map_len` itself.
    pub fn random_insert_position(
        &mut self,
        mask: &BranchMask,
        map_len: usize,
        rng: &mut impl EngineRng,
    ) -> u32 {
        self.scratch.clear();
        self.scratch
            .extend((0..=map_len as u32).filter(|&i| mask.can_insert_before(i as usize)));

        if self.scratch.is_empty() {
            return map_len as u32;
        }
        let idx = rng.below(self.scratch.len() as u32) as usize;
        self.scratch[idx]
    }
}
