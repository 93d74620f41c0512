//! Aligned byte/word/dword-flip stages: `singleWalkingByte` (plus its two
//! shadow-mode delete/insert probe passes) and `twoWalkingByte`/
//! `fourWalkingByte`.

use super::stage_id;
use crate::engine::MutationEngine;
use crate::oracle::Oracle;
use crate::rng::EngineRng;

impl<R: EngineRng> MutationEngine<R> {
    /// Flip every byte with `0xFF` in turn. In shadow mode this also runs two
    /// extra probe passes afterward (delete-this-byte, insert-random-byte-
    /// before-this-byte) to learn the branch mask's delete/insert-before
    /// capability bits, and always updates the effector map from the
    /// checksum deltas the main pass observes.
    pub fn single_walking_byte(&mut self, oracle: &mut impl Oracle) {
        let stage_max = self.data_size() as u64;
        self.begin_stage("bitflip 8/8", stage_max);

        let base_cksum = self.cur_item.res.cksum;
        for i in 0..self.data_size() {
            self.cur_item.data[i] ^= 0xFF;
            let result = oracle.on_mutate(&self.cur_item.data);

            if self.shadow_mode {
                self.branch_mask.as_mut().unwrap().set_modify(i, result.hit_rank.reaches_branch());
            }

            if !self.eff.is_effective(i) && result.res.cksum != base_cksum {
                self.eff.mark(i);
            }

            self.cur_item.data[i] ^= 0xFF;
        }
        self.stage_cur = stage_max;

        self.eff.saturate_if_dense(self.config.eff_max_perc);
        self.finish_stage(stage_id::FLIP8);

        if self.shadow_mode {
            self.probe_delete_capability(oracle);
            self.probe_insert_capability(oracle);
            let snapshot = self.branch_mask.as_ref().unwrap().snapshot();
            self.orig_branch_mask = Some(snapshot);
        }
    }

    fn probe_delete_capability(&mut self, oracle: &mut impl Oracle) {
        self.stage_name = "bitflip 8/8_rbrem8";
        let data_size = self.data_size();
        for i in 0..data_size {
            let mut probe = Vec::with_capacity(data_size - 1);
            probe.extend_from_slice(&self.cur_item.data[..i]);
            probe.extend_from_slice(&self.cur_item.data[i + 1..]);
            let result = oracle.on_mutate(&probe);
            self.branch_mask.as_mut().unwrap().set_delete(i, result.hit_rank.reaches_branch());
        }
    }

    fn probe_insert_capability(&mut self, oracle: &mut impl Oracle) {
        self.stage_name = "bitflip 8/8_rbadd8";
        let data_size = self.data_size();
        for i in 0..data_size {
            let mut probe = Vec::with_capacity(data_size + 1);
            probe.extend_from_slice(&self.cur_item.data[..i]);
            probe.push(self.rng.byte());
            probe.extend_from_slice(&self.cur_item.data[i..]);
            let result = oracle.on_mutate(&probe);
            self.branch_mask.as_mut().unwrap().set_insert_before(i, result.hit_rank.reaches_branch());
        }
    }

    /// Flip an aligned 16-bit window with `0xFFFF`, skipping spans the
    /// effector map or (in shadow mode) branch mask rule out.
    pub fn two_walking_byte(&mut self, oracle: &mut impl Oracle) {
        if self.data_size() < 2 {
            self.begin_stage("bitflip 16/8", 0);
            self.finish_stage(stage_id::FLIP16);
            return;
        }
        let total = self.data_size() - 1;
        let mut stage_max = total as u64;
        self.begin_stage("bitflip 16/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..total {
            if self.shadow_mode {
                let mask = self.branch_mask.as_ref().unwrap();
                if !mask.can_modify(i) || !mask.can_modify(i + 1) {
                    stage_max -= 1;
                    continue;
                }
            }
            if !self.eff.is_effective(i) && !self.eff.is_effective(i + 1) {
                stage_max -= 1;
                continue;
            }

            self.cur_item.data[i] ^= 0xFF;
            self.cur_item.data[i + 1] ^= 0xFF;
            oracle.on_mutate(&self.cur_item.data);
            emitted += 1;
            self.cur_item.data[i] ^= 0xFF;
            self.cur_item.data[i + 1] ^= 0xFF;
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::FLIP16);
    }

    /// Flip an aligned 32-bit window with `0xFFFFFFFF`, same gating as
    /// [`MutationEngine::two_walking_byte`].
    pub fn four_walking_byte(&mut self, oracle: &mut impl Oracle) {
        if self.data_size() < 4 {
            self.begin_stage("bitflip 32/8", 0);
            self.finish_stage(stage_id::FLIP32);
            return;
        }
        let total = self.data_size() - 3;
        let mut stage_max = total as u64;
        self.begin_stage("bitflip 32/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..total {
            if self.shadow_mode {
                let mask = self.branch_mask.as_ref().unwrap();
                if !(0..4).all(|k| mask.can_modify(i + k)) {
                    stage_max -= 1;
                    continue;
                }
            }
            if !(0..4).any(|k| self.eff.is_effective(i + k)) {
                stage_max -= 1;
                continue;
            }

            for k in 0..4 {
                self.cur_item.data[i + k] ^= 0xFF;
            }
            oracle.on_mutate(&self.cur_item.data);
            emitted += 1;
            for k in 0..4 {
                self.cur_item.data[i + k] ^= 0xFF;
            }
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::FLIP32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dicts;
    use crate::item::{FuzzItem, HitRank};
    use crate::rng::ScriptedRng;

    fn oracle_of(calls: &mut Vec<Vec<u8>>) -> impl Oracle + '_ {
        move |data: &[u8]| {
            calls.push(data.to_vec());
            FuzzItem::new(data.to_vec())
        }
    }

    #[test]
    fn single_walking_byte_emits_two_calls_and_sets_both_effector_bits() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0x00, 0x00]),
            Dicts::default(),
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        engine.cur_item.res.cksum = 0;
        let mut calls = Vec::new();
        {
            let mut counter = 0u64;
            let mut oracle = |data: &[u8]| {
                counter += 1;
                let mut item = FuzzItem::new(data.to_vec());
                item.res.cksum = counter;
                item
            };
            engine.single_walking_byte(&mut oracle);
        }
        let _ = &mut calls;
        assert_eq!(engine.data(), &[0x00, 0x00]);
        assert_eq!(engine.stage_cycles()[stage_id::FLIP8], 2);
    }

    #[test]
    fn single_walking_byte_learns_delete_and_insert_capability_in_shadow_mode() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0xAA, 0xBB]),
            Dicts::default(),
            true,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        let mut oracle = |data: &[u8]| {
            let mut item = FuzzItem::new(data.to_vec());
            item.hit_rank = HitRank::CurrentBranch;
            item
        };
        engine.single_walking_byte(&mut oracle);
        let mask = engine.branch_mask().unwrap();
        assert!(mask.can_modify(0));
        assert!(mask.can_delete(0));
        assert!(mask.can_insert_before(0));
    }

    #[test]
    fn two_walking_byte_restores_data_and_counts_emitted() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0x01, 0x02, 0x03]),
            Dicts::default(),
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        engine.eff.mark_all();
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.two_walking_byte(&mut oracle);
        }
        assert_eq!(calls.len(), 2);
        assert_eq!(engine.data(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn four_walking_byte_too_short_emits_nothing() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0x01, 0x02, 0x03]),
            Dicts::default(),
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.four_walking_byte(&mut oracle);
        }
        assert!(calls.is_empty());
    }
}
