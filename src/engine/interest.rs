//! Interesting-value substitution stages: `singleInterest`/`twoInterest`/
//! `fourInterest`. Each substitutes a fixed boundary constant only when the
//! result isn't already reachable by an earlier (cheaper) deterministic
//! stage.

use super::stage_id;
use crate::engine::MutationEngine;
use crate::oracle::Oracle;
use crate::rng::EngineRng;
use crate::util::{could_be_arith, could_be_bitflip, could_be_interest, swap16, swap32, Width, INTERESTING_16, INTERESTING_32, INTERESTING_8};

impl<R: EngineRng> MutationEngine<R> {
    /// 8-bit interesting-value substitutions.
    pub fn single_interest(&mut self, oracle: &mut impl Oracle) {
        let arith_max = self.config.arith_max;
        let data_size = self.data_size();
        let table_len = INTERESTING_8.len() as u64;
        let mut stage_max = data_size as u64 * table_len;
        self.begin_stage("interest 8/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..data_size {
            if !self.eff.is_effective(i) {
                stage_max -= table_len;
                continue;
            }
            if self.shadow_mode && !self.branch_mask.as_ref().unwrap().can_modify(i) {
                stage_max -= table_len;
                continue;
            }

            let orig = self.cur_item.data[i];
            for &value in INTERESTING_8.iter() {
                let candidate = value as u8;
                if could_be_bitflip((orig ^ candidate) as u32)
                    || could_be_arith(orig as u32, candidate as u32, Width::Byte, arith_max)
                {
                    stage_max -= 1;
                    continue;
                }
                self.cur_item.data[i] = candidate;
                oracle.on_mutate(&self.cur_item.data);
                emitted += 1;
                self.cur_item.data[i] = orig;
            }
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::INTEREST8);
    }

    /// 16-bit interesting-value substitutions, native and byte-swapped.
    pub fn two_interest(&mut self, oracle: &mut impl Oracle) {
        let arith_max = self.config.arith_max;
        let data_size = self.data_size();
        let table_len = INTERESTING_16.len() as u64;
        if data_size < 2 {
            self.begin_stage("interest 16/8", 0);
            self.finish_stage(stage_id::INTEREST16);
            return;
        }
        let total = data_size - 1;
        let mut stage_max = 2 * total as u64 * table_len;
        self.begin_stage("interest 16/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..total {
            if !self.eff.is_effective(i) && !self.eff.is_effective(i + 1) {
                stage_max -= table_len;
                continue;
            }
            if self.shadow_mode {
                let mask = self.branch_mask.as_ref().unwrap();
                if !mask.can_modify(i) || !mask.can_modify(i + 1) {
                    stage_max -= table_len;
                    continue;
                }
            }

            let orig = self.read_word(i);
            for &value in INTERESTING_16.iter() {
                let candidate = value as u16;
                if !could_be_bitflip((orig ^ candidate) as u32)
                    && !could_be_arith(orig as u32, candidate as u32, Width::Word, arith_max)
                    && !could_be_interest(orig as u32, candidate as u32, Width::Word, false)
                {
                    self.write_word(i, candidate);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let swapped = swap16(candidate);
                if candidate != swapped
                    && !could_be_bitflip((orig ^ swapped) as u32)
                    && !could_be_arith(orig as u32, swapped as u32, Width::Word, arith_max)
                    && !could_be_interest(orig as u32, swapped as u32, Width::Word, true)
                {
                    self.write_word(i, swapped);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }
            }
            self.write_word(i, orig);
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::INTEREST16);
    }

    /// 32-bit interesting-value substitutions, native and byte-swapped.
    pub fn four_interest(&mut self, oracle: &mut impl Oracle) {
        let arith_max = self.config.arith_max;
        let data_size = self.data_size();
        let table_len = INTERESTING_32.len() as u64;
        if data_size < 4 {
            self.begin_stage("interest 32/8", 0);
            self.finish_stage(stage_id::INTEREST32);
            return;
        }
        let total = data_size - 3;
        let mut stage_max = 2 * total as u64 * table_len;
        self.begin_stage("interest 32/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..total {
            if !(0..4).any(|k| self.eff.is_effective(i + k)) {
                stage_max -= table_len;
                continue;
            }
            if self.shadow_mode {
                let mask = self.branch_mask.as_ref().unwrap();
                if !(0..4).all(|k| mask.can_modify(i + k)) {
                    stage_max -= table_len;
                    continue;
                }
            }

            let orig = self.read_dword(i);
            for &value in INTERESTING_32.iter() {
                let candidate = value as u32;
                if !could_be_bitflip(orig ^ candidate)
                    && !could_be_arith(orig, candidate, Width::Dword, arith_max)
                    && !could_be_interest(orig, candidate, Width::Dword, false)
                {
                    self.write_dword(i, candidate);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let swapped = swap32(candidate);
                if candidate != swapped
                    && !could_be_bitflip(orig ^ swapped)
                    && !could_be_arith(orig, swapped, Width::Dword, arith_max)
                    && !could_be_interest(orig, swapped, Width::Dword, true)
                {
                    self.write_dword(i, swapped);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }
            }
            self.write_dword(i, orig);
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::INTEREST32);
    }
}
