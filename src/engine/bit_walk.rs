//! Walking bit-flip stages: `singleWalkingBit`/`twoWalkingBit`/`fourWalkingBit`.

use super::stage_id;
use crate::engine::MutationEngine;
use crate::oracle::Oracle;
use crate::rng::EngineRng;

fn flip_bit(data: &mut [u8], pos: u64) {
    data[(pos >> 3) as usize] ^= 128 >> (pos & 7);
}

impl<R: EngineRng> MutationEngine<R> {
    /// Flip every single bit in turn, XOR it back after the oracle call.
    pub fn single_walking_bit(&mut self, oracle: &mut impl Oracle) {
        let stage_max = (self.data_size() as u64) << 3;
        self.begin_stage("bitflip 1/1", stage_max);

        let mut cur = 0u64;
        while cur < stage_max {
            flip_bit(&mut self.cur_item.data, cur);
            oracle.on_mutate(&self.cur_item.data);
            flip_bit(&mut self.cur_item.data, cur);
            cur += 1;
        }
        self.stage_cur = cur;

        self.finish_stage(stage_id::FLIP1);
    }

    /// Flip two adjacent bits at a time, skipping spans shadow mode has
    /// ruled out.
    pub fn two_walking_bit(&mut self, oracle: &mut impl Oracle) {
        let total = (self.data_size() as u64) << 3;
        if total < 1 {
            self.begin_stage("bitflip 2/1", 0);
            self.finish_stage(stage_id::FLIP2);
            return;
        }
        let mut stage_max = total - 1;
        self.begin_stage("bitflip 2/1", stage_max);

        let mut cur = 0u64;
        let mut emitted = 0u64;
        while cur < total - 1 {
            if self.shadow_mode {
                let byte = (cur >> 3) as usize;
                let mask = self.branch_mask.as_ref().unwrap();
                let spills = byte != ((cur + 1) >> 3) as usize;
                if !mask.can_modify(byte) || (spills && !mask.can_modify(byte + 1)) {
                    stage_max -= 1;
                    cur += 1;
                    continue;
                }
            }

            flip_bit(&mut self.cur_item.data, cur);
            flip_bit(&mut self.cur_item.data, cur + 1);
            oracle.on_mutate(&self.cur_item.data);
            flip_bit(&mut self.cur_item.data, cur);
            flip_bit(&mut self.cur_item.data, cur + 1);
            emitted += 1;
            cur += 1;
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::FLIP2);
    }

    /// Flip four adjacent bits at a time, same shadow-mode skip rule as
    /// [`MutationEngine::two_walking_bit`].
    pub fn four_walking_bit(&mut self, oracle: &mut impl Oracle) {
        let total = (self.data_size() as u64) << 3;
        if total < 3 {
            self.begin_stage("bitflip 4/1", 0);
            self.finish_stage(stage_id::FLIP4);
            return;
        }
        let mut stage_max = total - 3;
        self.begin_stage("bitflip 4/1", stage_max);

        let mut cur = 0u64;
        let mut emitted = 0u64;
        while cur < total - 3 {
            if self.shadow_mode {
                let byte = (cur >> 3) as usize;
                let mask = self.branch_mask.as_ref().unwrap();
                let spills = byte != ((cur + 3) >> 3) as usize;
                if !mask.can_modify(byte) || (spills && !mask.can_modify(byte + 1)) {
                    stage_max -= 1;
                    cur += 1;
                    continue;
                }
            }

            for i in 0..4 {
                flip_bit(&mut self.cur_item.data, cur + i);
            }
            oracle.on_mutate(&self.cur_item.data);
            for i in 0..4 {
                flip_bit(&mut self.cur_item.data, cur + i);
            }
            emitted += 1;
            cur += 1;
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::FLIP4);
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
    fn single_walking_bit_emits_eight_calls_for_one_byte() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0x00]),
            Dicts::default(),
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.single_walking_bit(&mut oracle);
        }
        assert_eq!(
            calls,
            vec![
                vec![0x80],
                vec![0x40],
                vec![0x20],
                vec![0x10],
                vec![0x08],
                vec![0x04],
                vec![0x02],
                vec![0x01],
            ]
        );
        assert_eq!(engine.data(), &[0x00]);
        assert_eq!(engine.stage_cycles()[stage_id::FLIP1], 8);
    }

    #[test]
    fn two_walking_bit_skips_spans_the_mask_forbids() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0xAA, 0xBB, 0xCC, 0xDD]),
            Dicts::default(),
            true,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        engine.branch_mask.as_mut().unwrap().revoke_modify(1);
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.two_walking_bit(&mut oracle);
        }
        // Every 2-bit span touching byte 1 (bits 8..16, plus the spillover
        // from byte 0's bit 15) is skipped.
        assert!(calls.len() < 31);
        assert_eq!(engine.data(), &[0xAA, 0xBB, 0xCC, 0xDD]);
    }
}
