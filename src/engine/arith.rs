//! Arithmetic stages: `singleArith`/`twoArith`/`fourArith`. Each tries
//! `orig ± j` for `j` in `[1, arith_max]`, emitting a candidate only when the
//! result couldn't already have come from a bit-walk stage and the
//! arithmetic actually carries across a byte boundary.

use super::stage_id;
use crate::engine::MutationEngine;
use crate::oracle::Oracle;
use crate::rng::EngineRng;
use crate::util::{could_be_bitflip, read_dword_le, read_word_le, swap16, swap32, write_dword_le, write_word_le};

impl<R: EngineRng> MutationEngine<R> {
    /// 8-bit `orig ± j` substitutions.
    pub fn single_arith(&mut self, oracle: &mut impl Oracle) {
        let arith_max = self.config.arith_max;
        let data_size = self.data_size();
        let mut stage_max = 2 * data_size as u64 * arith_max as u64;
        self.begin_stage("arith 8/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..data_size {
            if !self.eff.is_effective(i) {
                stage_max -= 2 * arith_max as u64;
                continue;
            }
            if self.shadow_mode && !self.branch_mask.as_ref().unwrap().can_modify(i) {
                stage_max -= 2 * arith_max as u64;
                continue;
            }

            let orig = self.cur_item.data[i];
            for j in 1..=arith_max as u8 {
                let plus = orig.wrapping_add(j);
                if !could_be_bitflip((orig ^ plus) as u32) {
                    self.cur_item.data[i] = plus;
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let minus = orig.wrapping_sub(j);
                if !could_be_bitflip((orig ^ minus) as u32) {
                    self.cur_item.data[i] = minus;
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                self.cur_item.data[i] = orig;
            }
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::ARITH8);
    }

    /// 16-bit `orig ± j` substitutions, native and byte-swapped.
    pub fn two_arith(&mut self, oracle: &mut impl Oracle) {
        let arith_max = self.config.arith_max;
        let data_size = self.data_size();
        if data_size < 2 {
            self.begin_stage("arith 16/8", 0);
            self.finish_stage(stage_id::ARITH16);
            return;
        }
        let total = data_size - 1;
        let mut stage_max = 4 * total as u64 * arith_max as u64;
        self.begin_stage("arith 16/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..total {
            let orig = self.read_word(i);
            if !self.eff.is_effective(i) && !self.eff.is_effective(i + 1) {
                stage_max -= 4 * arith_max as u64;
                continue;
            }
            if self.shadow_mode {
                let mask = self.branch_mask.as_ref().unwrap();
                if !mask.can_modify(i) || !mask.can_modify(i + 1) {
                    stage_max -= 4 * arith_max as u64;
                    continue;
                }
            }

            for j in 1..=arith_max as u16 {
                let plus = orig.wrapping_add(j);
                let r1 = orig ^ plus;
                if (orig & 0xFF) + j > 0xFF && !could_be_bitflip(r1 as u32) {
                    self.write_word(i, plus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let minus = orig.wrapping_sub(j);
                let r2 = orig ^ minus;
                if (orig & 0xFF) < j && !could_be_bitflip(r2 as u32) {
                    self.write_word(i, minus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let swapped_plus = swap16(swap16(orig).wrapping_add(j));
                let r3 = orig ^ swapped_plus;
                if (orig >> 8) + j > 0xFF && !could_be_bitflip(r3 as u32) {
                    self.write_word(i, swapped_plus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let swapped_minus = swap16(swap16(orig).wrapping_sub(j));
                let r4 = orig ^ swapped_minus;
                if (orig >> 8) < j && !could_be_bitflip(r4 as u32) {
                    self.write_word(i, swapped_minus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                self.write_word(i, orig);
            }
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::ARITH16);
    }

    /// 32-bit `orig ± j` substitutions, native and byte-swapped.
    pub fn four_arith(&mut self, oracle: &mut impl Oracle) {
        let arith_max = self.config.arith_max;
        let data_size = self.data_size();
        if data_size < 4 {
            self.begin_stage("arith 32/8", 0);
            self.finish_stage(stage_id::ARITH32);
            return;
        }
        let total = data_size - 3;
        let mut stage_max = 4 * total as u64 * arith_max as u64;
        self.begin_stage("arith 32/8", stage_max);

        let mut emitted = 0u64;
        for i in 0..total {
            let orig = self.read_dword(i);
            if !(0..4).any(|k| self.eff.is_effective(i + k)) {
                stage_max -= 4 * arith_max as u64;
                continue;
            }
            if self.shadow_mode {
                let mask = self.branch_mask.as_ref().unwrap();
                if !(0..4).all(|k| mask.can_modify(i + k)) {
                    stage_max -= 4 * arith_max as u64;
                    continue;
                }
            }

            for j in 1..=arith_max {
                let plus = orig.wrapping_add(j);
                let r1 = orig ^ plus;
                if (orig & 0xFFFF) + j > 0xFFFF && !could_be_bitflip(r1) {
                    self.write_dword(i, plus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let minus = orig.wrapping_sub(j);
                let r2 = orig ^ minus;
                if (orig & 0xFFFF) < j && !could_be_bitflip(r2) {
                    self.write_dword(i, minus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let swapped_plus = swap32(swap32(orig).wrapping_add(j));
                let r3 = orig ^ swapped_plus;
                if (swap32(orig) & 0xFFFF) + j > 0xFFFF && !could_be_bitflip(r3) {
                    self.write_dword(i, swapped_plus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                let swapped_minus = swap32(swap32(orig).wrapping_sub(j));
                let r4 = orig ^ swapped_minus;
                if (swap32(orig) & 0xFFFF) < j && !could_be_bitflip(r4) {
                    self.write_dword(i, swapped_minus);
                    oracle.on_mutate(&self.cur_item.data);
                    emitted += 1;
                } else {
                    stage_max -= 1;
                }

                self.write_dword(i, orig);
            }
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::ARITH32);
    }

    /// Read a 16-bit window starting at `pos`. Fixed little-endian, unlike
    /// the source's pointer-cast reads (which inherited the build host's
    /// endianness); see the crate's design notes.
    pub(crate) fn read_word(&self, pos: usize) -> u16 {
        read_word_le(&self.cur_item.data, pos)
    }

    pub(crate) fn write_word(&mut self, pos: usize, value: u16) {
        write_word_le(&mut self.cur_item.data, pos, value)
    }

    /// Read a 32-bit window starting at `pos`. Fixed little-endian; see
    /// [`MutationEngine::read_word`].
    pub(crate) fn read_dword(&self, pos: usize) -> u32 {
        read_dword_le(&self.cur_item.data, pos)
    }

    pub(crate) fn write_dword(&mut self, pos: usize, value: u32) {
        write_dword_le(&mut self.cur_item.data, pos, value)
    }
}
