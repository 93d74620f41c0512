//! Dictionary overwrite stages: `overwriteWithDictionary` (generic code
//! literals, any length) and `overwriteWithAddressDictionary` (20-byte
//! attacker addresses, ABI-word-strided).

use itertools::iproduct;

use super::stage_id;
use crate::config::{ABI_WORD_LEN, ADDRESS_LEN};
use crate::engine::MutationEngine;
use crate::oracle::Oracle;
use crate::rng::EngineRng;

impl<R: EngineRng> MutationEngine<R> {
    /// Overwrite each position with each code-dictionary entry in turn,
    /// restoring the untouched buffer before the next entry. Entries are
    /// skipped when they don't fit, are a no-op, touch no effector-marked
    /// byte, fall outside the branch mask in shadow mode, or (once the
    /// dictionary is large) are probabilistically dropped.
    pub fn overwrite_with_dictionary(&mut self, oracle: &mut impl Oracle) {
        let data_size = self.data_size();
        let extras_count = self.dicts.code.len() as u32;
        let mut stage_max = data_size as u64 * extras_count as u64;
        self.begin_stage("dict (over)", stage_max);

        let original = self.cur_item.data.clone();
        let max_det_extras = self.config.max_det_extras;
        let mut emitted = 0u64;

        for (i, j) in iproduct!(0..data_size, 0..self.dicts.code.len()) {
            let entry_len = self.dicts.code.extras[j].len();

            let probabilistic_skip =
                extras_count > max_det_extras && self.rng.below(extras_count) > max_det_extras;
            let too_long = entry_len > data_size - i;
            let is_noop = !too_long && self.cur_item.data[i..i + entry_len] == self.dicts.code.extras[j].data[..];
            let span_inert = !too_long && !self.eff.span_has_effective_byte(i, entry_len);

            if probabilistic_skip || too_long || is_noop || span_inert {
                stage_max -= 1;
                continue;
            }

            if self.shadow_mode {
                let mask = self.branch_mask.as_ref().unwrap();
                if !(0..entry_len).all(|k| mask.can_modify(i + k)) {
                    stage_max -= 1;
                    continue;
                }
            }

            self.cur_item.data[i..i + entry_len].copy_from_slice(&self.dicts.code.extras[j].data);
            oracle.on_mutate(&self.cur_item.data);
            emitted += 1;
            self.cur_item.data.copy_from_slice(&original);
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::EXTRAS_UO);
    }

    /// Overwrite the low 20 bytes of each 32-byte ABI word with each
    /// address-dictionary entry in turn.
    pub fn overwrite_with_address_dictionary(&mut self, oracle: &mut impl Oracle) {
        let data_size = self.data_size();
        let extras_count = self.dicts.address.len() as u32;
        let word_count = (data_size / ABI_WORD_LEN) as u64;
        let mut stage_max = word_count * extras_count as u64;
        self.begin_stage("address (over)", stage_max);

        if data_size == 0 {
            self.finish_stage(stage_id::EXTRAS_AO);
            return;
        }

        let original = self.cur_item.data.clone();
        let mut emitted = 0u64;
        for word in 0..word_count as usize {
            let i = word * ABI_WORD_LEN;
            for j in 0..self.dicts.address.len() {
                let addr_start = i + 12;
                let entry = &self.dicts.address.extras[j].data;
                let is_noop = self.cur_item.data[addr_start..addr_start + ADDRESS_LEN] == entry[..];
                if is_noop {
                    stage_max -= 1;
                    continue;
                }

                if self.shadow_mode {
                    let mask = self.branch_mask.as_ref().unwrap();
                    if !(0..ADDRESS_LEN).all(|k| mask.can_modify(addr_start + k)) {
                        stage_max -= 1;
                        continue;
                    }
                }

                self.cur_item.data[addr_start..addr_start + ADDRESS_LEN]
                    .copy_from_slice(&self.dicts.address.extras[j].data);
                oracle.on_mutate(&self.cur_item.data);
                emitted += 1;
                self.cur_item.data.copy_from_slice(&original);
            }
        }
        self.stage_max = stage_max;
        self.stage_cur = emitted;
        self.finish_stage(stage_id::EXTRAS_AO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ADDRESS_LEN;
    use crate::dictionary::{Dictionary, Dicts};
    use crate::item::FuzzItem;
    use crate::rng::ScriptedRng;

    fn oracle_of(calls: &mut Vec<Vec<u8>>) -> impl Oracle + '_ {
        move |data: &[u8]| {
            calls.push(data.to_vec());
            FuzzItem::new(data.to_vec())
        }
    }

    #[test]
    fn overwrite_with_dictionary_restores_between_entries() {
        let dicts = Dicts::new(Dictionary::from_entries([b"AB".to_vec()]), Dictionary::new());
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0u8; 4]),
            dicts,
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        engine.eff.mark_all();
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.overwrite_with_dictionary(&mut oracle);
        }
        assert_eq!(engine.data(), &[0u8; 4]);
        assert!(calls.iter().any(|c| c == &vec![b'A', b'B', 0, 0]));
    }

    #[test]
    fn overwrite_with_dictionary_skips_noop_entry() {
        let dicts = Dicts::new(Dictionary::from_entries([vec![0u8, 0u8]]), Dictionary::new());
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0u8; 2]),
            dicts,
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        engine.eff.mark_all();
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.overwrite_with_dictionary(&mut oracle);
        }
        assert!(calls.is_empty());
    }

    #[test]
    fn overwrite_with_address_dictionary_touches_low_twenty_bytes_of_each_word() {
        let addr = [0xAAu8; ADDRESS_LEN];
        let dicts = Dicts::new(Dictionary::new(), Dictionary::from_addresses([addr]));
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0u8; 32]),
            dicts,
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.overwrite_with_address_dictionary(&mut oracle);
        }
        assert_eq!(calls.len(), 1);
        assert_eq!(&calls[0][0..12], &[0u8; 12]);
        assert_eq!(&calls[0][12..32], &addr[..]);
        assert_eq!(engine.data(), &[0u8; 32]);
    }

    #[test]
    fn overwrite_with_address_dictionary_handles_empty_data() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0u8; 1]),
            Dicts::default(),
            false,
            ScriptedRng::always_zero(),
        )
        .unwrap();
        let mut calls = Vec::new();
        {
            let mut oracle = oracle_of(&mut calls);
            engine.overwrite_with_address_dictionary(&mut oracle);
        }
        assert!(calls.is_empty());
    }
}
