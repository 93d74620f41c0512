//! The mutation engine: one instance per seed under active mutation.
//!
//! Mirrors the teacher's big-struct-plus-responsibility-files layout (see
//! `interpreter.rs` + `interpreter/*.rs`): [`MutationEngine`] is declared
//! here, and each stage group lives in its own `engine/*.rs` file as an
//! `impl` block.

mod arith;
mod bit_walk;
mod byte_walk;
mod dict;
mod havoc;
mod interest;
mod prolongate;
mod random;
mod splice;

use tracing::debug;

use crate::branch_mask::BranchMask;
use crate::config::{EngineConfig, STAGE_COUNT};
use crate::dictionary::Dicts;
use crate::effector::EffectorMap;
use crate::error::MutationError;
use crate::item::FuzzItem;
use crate::position_map::PositionMap;
use crate::rng::EngineRng;

/// Indices into [`MutationEngine::stage_cycles`], one per named stage.
pub mod stage_id {
    pub const FLIP1: usize = 0;
    pub const FLIP2: usize = 1;
    pub const FLIP4: usize = 2;
    pub const FLIP8: usize = 3;
    pub const FLIP16: usize = 4;
    pub const FLIP32: usize = 5;
    pub const ARITH8: usize = 6;
    pub const ARITH16: usize = 7;
    pub const ARITH32: usize = 8;
    pub const INTEREST8: usize = 9;
    pub const INTEREST16: usize = 10;
    pub const INTEREST32: usize = 11;
    pub const EXTRAS_UO: usize = 12;
    pub const EXTRAS_AO: usize = 13;
    pub const HAVOC: usize = 14;
    pub const SPLICE: usize = 15;
    pub const PROLONGATION: usize = 16;
    pub const RANDOM: usize = 17;
}

/// Stateful mutation engine bound to a single seed.
///
/// Construction fixes the seed, the dictionaries, and whether shadow mode
/// (branch-mask learning) is active. Stages are then invoked in whatever
/// order the caller chooses; each stage drives an [`crate::oracle::Oracle`]
/// passed in per call, rather than owned by the engine, mirroring the
/// source's callback-per-stage-call shape.
#[derive(Debug, Clone)]
pub struct MutationEngine<R: EngineRng> {
    pub(crate) cur_item: FuzzItem,
    pub(crate) dicts: Dicts,
    pub(crate) config: EngineConfig,
    pub(crate) rng: R,
    pub(crate) eff: EffectorMap,
    pub(crate) shadow_mode: bool,
    pub(crate) branch_mask: Option<BranchMask>,
    pub(crate) orig_branch_mask: Option<Vec<u8>>,
    pub(crate) position_map: PositionMap,
    stage_name: &'static str,
    stage_cur: u64,
    stage_max: u64,
    stage_cycles: [u64; STAGE_COUNT],
}

impl<R: EngineRng> MutationEngine<R> {
    /// Build an engine over `seed` with the default [`EngineConfig`].
    pub fn new(seed: FuzzItem, dicts: Dicts, shadow_mode: bool, rng: R) -> Result<Self, MutationError> {
        Self::with_config(seed, dicts, shadow_mode, rng, EngineConfig::default())
    }

    /// Build an engine over `seed` with an explicit [`EngineConfig`].
    pub fn with_config(
        seed: FuzzItem,
        dicts: Dicts,
        shadow_mode: bool,
        rng: R,
        config: EngineConfig,
    ) -> Result<Self, MutationError> {
        if seed.data.is_empty() {
            return Err(MutationError::EmptySeed);
        }

        let data_size = seed.data.len();
        if shadow_mode && data_size + 1 > config.max_alloc {
            return Err(MutationError::AllocationTooLarge {
                requested: data_size + 1,
                limit: config.max_alloc,
            });
        }

        let eff = EffectorMap::new(data_size);
        let (branch_mask, orig_branch_mask) = if shadow_mode {
            let mask = BranchMask::new(data_size);
            let snapshot = mask.snapshot();
            (Some(mask), Some(snapshot))
        } else {
            (None, None)
        };

        Ok(Self {
            cur_item: seed,
            dicts,
            config,
            rng,
            eff,
            shadow_mode,
            branch_mask,
            orig_branch_mask,
            position_map: PositionMap::new(),
            stage_name: "init",
            stage_cur: 0,
            stage_max: 0,
            stage_cycles: [0; STAGE_COUNT],
        })
    }

    /// The candidate buffer as it stands right now.
    pub fn data(&self) -> &[u8] {
        &self.cur_item.data
    }

    /// Length of the seed. Constant for the engine's lifetime except for
    /// havoc's transient internal growth/shrink, which always restores
    /// before returning.
    pub fn data_size(&self) -> usize {
        self.cur_item.data.len()
    }

    /// Whether shadow mode (branch-mask learning) is active.
    pub fn shadow_mode(&self) -> bool {
        self.shadow_mode
    }

    /// The engine's tunable constants.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Human-readable name of the most recently run (or running) stage.
    pub fn stage_name(&self) -> &str {
        self.stage_name
    }

    /// Candidates emitted so far in the current stage.
    pub fn stage_cur(&self) -> u64 {
        self.stage_cur
    }

    /// Total candidates the current stage will emit, net of skips.
    pub fn stage_max(&self) -> u64 {
        self.stage_max
    }

    /// Cumulative emitted-candidate counts, indexed by [`stage_id`].
    pub fn stage_cycles(&self) -> &[u64; STAGE_COUNT] {
        &self.stage_cycles
    }

    /// Current branch mask, if shadow mode is active.
    pub fn branch_mask(&self) -> Option<&BranchMask> {
        self.branch_mask.as_ref()
    }

    pub(crate) fn begin_stage(&mut self, name: &'static str, stage_max: u64) {
        self.stage_name = name;
        self.stage_cur = 0;
        self.stage_max = stage_max;
        debug!(stage = name, stage_max, "starting deterministic stage");
    }

    pub(crate) fn finish_stage(&mut self, id: usize) {
        self.stage_cycles[id] += self.stage_max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdEngineRng;

    #[test]
    fn rejects_empty_seed() {
        let err = MutationEngine::new(
            FuzzItem::new(vec![]),
            Dicts::default(),
            false,
            StdEngineRng::from_seed(0),
        )
        .unwrap_err();
        assert_eq!(err, MutationError::EmptySeed);
    }

    #[test]
    fn shadow_mode_allocates_a_branch_mask() {
        let engine = MutationEngine::new(
            FuzzItem::new(vec![1, 2, 3]),
            Dicts::default(),
            true,
            StdEngineRng::from_seed(0),
        )
        .unwrap();
        assert!(engine.branch_mask().is_some());
        assert_eq!(engine.branch_mask().unwrap().len(), 4);
    }

    #[test]
    fn non_shadow_mode_has_no_branch_mask() {
        let engine = MutationEngine::new(
            FuzzItem::new(vec![1, 2, 3]),
            Dicts::default(),
            false,
            StdEngineRng::from_seed(0),
        )
        .unwrap();
        assert!(engine.branch_mask().is_none());
    }
}
