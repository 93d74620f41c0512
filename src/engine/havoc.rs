//! Havoc: the stochastic stage. Each of `havoc_min_rounds` rounds starts
//! from a snapshot of the pre-havoc buffer and branch mask, stacks
//! `2^(1+UR(havoc_stack_pow2))` random operators, invokes the oracle once on
//! the result, then restores the snapshot before the next round.
//!
//! Havoc never mutates [`MutationEngine::cur_item`] directly — it works off
//! a detached local buffer, mirroring the source's `origin`/`data` split.

use super::stage_id;
use crate::engine::MutationEngine;
use crate::oracle::Oracle;
use crate::rng::EngineRng;
use crate::util::{choose_block_len, swap16, swap32, read_dword_le, read_word_le, write_dword_le, write_word_le, INTERESTING_16, INTERESTING_32, INTERESTING_8};

impl<R: EngineRng> MutationEngine<R> {
    /// Run the havoc stage.
    pub fn havoc(&mut self, oracle: &mut impl Oracle) {
        let rounds = self.config.havoc_min_rounds as u64;
        self.begin_stage("havoc", rounds);

        let origin = self.cur_item.data.clone();
        let orig_branch_mask = self.orig_branch_mask.clone();
        let has_dict = !self.dicts.code.is_empty();

        let mut data = origin.clone();

        for round in 0..rounds {
            self.stage_cur = round;
            let use_stacking = 1u32 << (1 + self.rng.below(self.config.havoc_stack_pow2));
            for _ in 0..use_stacking {
                let op_count = 14 + if has_dict { 2 } else { 0 };
                let op = self.rng.below(op_count);
                self.apply_havoc_op(op, &mut data);
            }
            oracle.on_mutate(&data);

            data = origin.clone();
            if let (Some(mask), Some(snapshot)) = (self.branch_mask.as_mut(), orig_branch_mask.as_ref()) {
                mask.restore(snapshot);
            }
        }
        self.stage_cur = rounds;
        self.finish_stage(stage_id::HAVOC);
    }

    fn pick_modifiable(&mut self, tmp_len: usize, num_bits: u32, non_shadow_bound: u32) -> Option<u32> {
        if self.shadow_mode {
            let mask = self.branch_mask.as_ref().unwrap();
            self.position_map.random_modifiable_position(mask, tmp_len, num_bits, &mut self.rng)
        } else {
            Some(self.rng.below(non_shadow_bound))
        }
    }

    fn pick_insert(&mut self, tmp_len: usize, non_shadow_bound: u32) -> u32 {
        if self.shadow_mode {
            let mask = self.branch_mask.as_ref().unwrap();
            self.position_map.random_insert_position(mask, tmp_len, &mut self.rng)
        } else {
            self.rng.below(non_shadow_bound)
        }
    }

    fn apply_havoc_op(&mut self, op: u32, data: &mut Vec<u8>) {
        let tmp_len = data.len();
        let arith_max = self.config.arith_max;
        let havoc_blk_large = self.config.havoc_blk_large;

        match op {
            0 => {
                let Some(pos) = self.pick_modifiable(tmp_len, 1, (tmp_len as u32) << 3) else { return };
                data[(pos >> 3) as usize] ^= 128u8 >> (pos & 7);
            }
            1 => {
                let Some(pos) = self.pick_modifiable(tmp_len, 8, tmp_len as u32) else { return };
                data[pos as usize] = INTERESTING_8[self.rng.below(INTERESTING_8.len() as u32) as usize] as u8;
            }
            2 => {
                if tmp_len < 2 {
                    return;
                }
                let Some(pos) = self.pick_modifiable(tmp_len, 16, (tmp_len - 1) as u32) else { return };
                let value = INTERESTING_16[self.rng.below(INTERESTING_16.len() as u32) as usize] as u16;
                let value = if self.rng.coin() { value } else { swap16(value) };
                write_word_le(data, pos as usize, value);
            }
            3 => {
                if tmp_len < 4 {
                    return;
                }
                let Some(pos) = self.pick_modifiable(tmp_len, 32, (tmp_len - 3) as u32) else { return };
                let value = INTERESTING_32[self.rng.below(INTERESTING_32.len() as u32) as usize] as u32;
                let value = if self.rng.coin() { value } else { swap32(value) };
                write_dword_le(data, pos as usize, value);
            }
            4 => {
                let Some(pos) = self.pick_modifiable(tmp_len, 8, tmp_len as u32) else { return };
                let delta = 1 + self.rng.below(arith_max) as u8;
                data[pos as usize] = data[pos as usize].wrapping_sub(delta);
            }
            5 => {
                let Some(pos) = self.pick_modifiable(tmp_len, 8, tmp_len as u32) else { return };
                let delta = 1 + self.rng.below(arith_max) as u8;
                data[pos as usize] = data[pos as usize].wrapping_add(delta);
            }
            6 => {
                if tmp_len < 2 {
                    return;
                }
                let Some(pos) = self.pick_modifiable(tmp_len, 16, (tmp_len - 1) as u32) else { return };
                let delta = 1 + self.rng.below(arith_max) as u16;
                if self.rng.coin() {
                    let v = read_word_le(data, pos as usize);
                    write_word_le(data, pos as usize, v.wrapping_sub(delta));
                } else {
                    let v = swap16(read_word_le(data, pos as usize));
                    write_word_le(data, pos as usize, swap16(v.wrapping_sub(delta)));
                }
            }
            7 => {
                if tmp_len < 2 {
                    return;
                }
                let Some(pos) = self.pick_modifiable(tmp_len, 16, (tmp_len - 1) as u32) else { return };
                let delta = 1 + self.rng.below(arith_max) as u16;
                if self.rng.coin() {
                    let v = read_word_le(data, pos as usize);
                    write_word_le(data, pos as usize, v.wrapping_add(delta));
                } else {
                    let v = swap16(read_word_le(data, pos as usize));
                    write_word_le(data, pos as usize, swap16(v.wrapping_add(delta)));
                }
            }
            8 => {
                if tmp_len < 4 {
                    return;
                }
                let Some(pos) = self.pick_modifiable(tmp_len, 32, (tmp_len - 3) as u32) else { return };
                let delta = 1 + self.rng.below(arith_max);
                if self.rng.coin() {
                    let v = read_dword_le(data, pos as usize);
                    write_dword_le(data, pos as usize, v.wrapping_sub(delta));
                } else {
                    let v = swap32(read_dword_le(data, pos as usize));
                    write_dword_le(data, pos as usize, swap32(v.wrapping_sub(delta)));
                }
            }
            9 => {
                if tmp_len < 4 {
                    return;
                }
                let Some(pos) = self.pick_modifiable(tmp_len, 32, (tmp_len - 3) as u32) else { return };
                let delta = 1 + self.rng.below(arith_max);
                if self.rng.coin() {
                    let v = read_dword_le(data, pos as usize);
                    write_dword_le(data, pos as usize, v.wrapping_add(delta));
                } else {
                    let v = swap32(read_dword_le(data, pos as usize));
                    write_dword_le(data, pos as usize, swap32(v.wrapping_add(delta)));
                }
            }
            10 => {
                let Some(pos) = self.pick_modifiable(tmp_len, 8, tmp_len as u32) else { return };
                let delta = 1 + self.rng.below(255) as u8;
                data[pos as usize] ^= delta;
            }
            11 | 12 => {
                if tmp_len < 2 {
                    return;
                }
                let del_len = choose_block_len(&mut self.rng, (tmp_len - 1) as u32, havoc_blk_large);
                let Some(del_from) =
                    self.pick_modifiable(tmp_len, del_len * 8, tmp_len as u32 - del_len + 1)
                else {
                    return;
                };
                let del_from = del_from as usize;
                let del_len = del_len as usize;
                data.drain(del_from..del_from + del_len);
            }
            13 => {
                let actually_clone = self.rng.below(4) != 0;
                let (copy_from, copy_len, insert_bound) = if actually_clone {
                    let copy_len = choose_block_len(&mut self.rng, tmp_len as u32, havoc_blk_large);
                    let copy_from = self.rng.below(tmp_len as u32 - copy_len + 1);
                    (copy_from, copy_len, tmp_len as u32 - copy_len + 1)
                } else {
                    // Constant-run length is drawn independent of tmp_len, so
                    // it may exceed the buffer; an insertion point is valid
                    // anywhere in 0..=tmp_len regardless.
                    let copy_len = choose_block_len(&mut self.rng, havoc_blk_large, havoc_blk_large);
                    (0, copy_len, tmp_len as u32 + 1)
                };

                let copy_to = self.pick_insert(tmp_len, insert_bound) as usize;
                let copy_len = copy_len as usize;
                let copy_from = copy_from as usize;

                let inserted: Vec<u8> = if actually_clone {
                    data[copy_from..copy_from + copy_len].to_vec()
                } else {
                    let fill = if self.rng.coin() {
                        self.rng.byte()
                    } else {
                        data[self.rng.below(tmp_len as u32) as usize]
                    };
                    vec![fill; copy_len]
                };

                let grown_size = tmp_len + copy_len;
                assert!(
                    grown_size + 1 <= self.config.max_alloc,
                    "havoc growth to {grown_size} bytes exceeds the {} byte guard rail",
                    self.config.max_alloc
                );

                let mut new_data = Vec::with_capacity(grown_size);
                new_data.extend_from_slice(&data[..copy_to]);
                new_data.extend_from_slice(&inserted);
                new_data.extend_from_slice(&data[copy_to..]);
                *data = new_data;

                if let Some(mask) = self.branch_mask.as_mut() {
                    mask.insert_run(copy_to, copy_len);
                }
            }
            14 => {
                if tmp_len < 2 {
                    return;
                }
                let copy_len = choose_block_len(&mut self.rng, (tmp_len - 1) as u32, havoc_blk_large);
                let copy_from = self.rng.below(tmp_len as u32 - copy_len + 1);
                let Some(copy_to) = self.pick_modifiable(tmp_len, copy_len * 8, tmp_len as u32 - copy_len + 1)
                else {
                    return;
                };
                let copy_from = copy_from as usize;
                let copy_to = copy_to as usize;
                let copy_len = copy_len as usize;

                if self.rng.below(4) != 0 {
                    if copy_from != copy_to {
                        data.copy_within(copy_from..copy_from + copy_len, copy_to);
                    }
                } else {
                    let fill = if self.rng.coin() {
                        self.rng.byte()
                    } else {
                        data[self.rng.below(tmp_len as u32) as usize]
                    };
                    data[copy_to..copy_to + copy_len].fill(fill);
                }
            }
            15 => {
                let extras_count = self.dicts.code.len() as u32;
                let use_extra = self.rng.below(extras_count) as usize;
                let extra_len = self.dicts.code.extras[use_extra].len();
                if extra_len > tmp_len {
                    return;
                }
                let Some(insert_at) =
                    self.pick_modifiable(tmp_len, extra_len as u32 * 8, tmp_len as u32 - extra_len as u32 + 1)
                else {
                    return;
                };
                let insert_at = insert_at as usize;
                data[insert_at..insert_at + extra_len].copy_from_slice(&self.dicts.code.extras[use_extra].data);
            }
            _ => unreachable!("havoc operator selector only produces 0..=15"),
        }
    }
}
