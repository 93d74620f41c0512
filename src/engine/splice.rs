//! Splice: cross-seed recombination at the byte level. Overwrites a prefix
//! of the current buffer with the matching prefix of a corpus item whose
//! checksum differs, up to the point the two inputs start disagreeing with
//! each other by more than one byte.

use super::stage_id;
use crate::engine::MutationEngine;
use crate::item::FuzzItem;
use crate::rng::EngineRng;
use crate::util::locate_diffs;

impl<R: EngineRng> MutationEngine<R> {
    /// Attempt to splice a corpus member into the current buffer.
    ///
    /// Returns `true` if a candidate was produced (the caller is expected to
    /// run [`MutationEngine::havoc`] over the result next), `false` if no
    /// suitable pair was found within `splice_cycles` attempts. Never
    /// invokes an oracle itself.
    pub fn splice(&mut self, queue: &[FuzzItem]) -> bool {
        let cycles = self.config.splice_cycles;
        self.begin_stage("splice", cycles as u64);

        let cur_cksum = self.cur_item.res.cksum;
        let candidates: Vec<&FuzzItem> = queue.iter().filter(|it| it.res.cksum != cur_cksum).collect();

        if candidates.is_empty() || self.data_size() <= 1 {
            self.stage_max = 0;
            self.finish_stage(stage_id::SPLICE);
            return false;
        }

        for attempt in 0..cycles {
            self.stage_cur = attempt as u64;
            let target = candidates[self.rng.below(candidates.len() as u32) as usize];
            let min_len = self.data_size().min(target.data.len());
            let (first, last) = locate_diffs(&self.cur_item.data, &target.data, min_len);
            let (Some(first), Some(last)) = (first, last) else {
                continue;
            };
            if last < 2 || first == last {
                continue;
            }

            let split_at = first + self.rng.below((last - first) as u32) as usize;
            self.cur_item.data[..split_at].copy_from_slice(&target.data[..split_at]);

            // Positions the splice actually overwrote keep whatever
            // capability flags the byte-walk stage already learned for
            // them; everything from `split_at` onward is unproven territory
            // again and regains full capability. The buffer's length never
            // changes here, so the mask isn't resized.
            let data_size = self.data_size();
            if let Some(mask) = self.branch_mask.as_mut() {
                for pos in split_at..data_size {
                    mask.set_modify(pos, true);
                    mask.set_delete(pos, true);
                    mask.set_insert_before(pos, true);
                }
                self.orig_branch_mask = Some(mask.snapshot());
            }

            self.stage_max = 1;
            self.finish_stage(stage_id::SPLICE);
            return true;
        }

        self.stage_max = 0;
        self.finish_stage(stage_id::SPLICE);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::dictionary::Dicts;
    use crate::item::OracleResult;
    use crate::rng::ScriptedRng;

    fn item(data: Vec<u8>, cksum: u64) -> FuzzItem {
        FuzzItem {
            data,
            res: OracleResult { cksum },
            ..FuzzItem::new(vec![])
        }
    }

    #[test]
    fn splice_overwrites_the_prefix_up_to_a_random_split_point() {
        let seed = item(vec![0u8; 64], 1);
        let mut engine = MutationEngine::new(seed, Dicts::default(), false, ScriptedRng::new(vec![0, 5])).unwrap();
        let mut target_data = vec![0u8; 64];
        for i in 10..20 {
            target_data[i] = 0xFF;
        }
        let queue = vec![item(target_data.clone(), 2)];

        assert!(engine.splice(&queue));
        let split_at = 10 + 5;
        assert_eq!(&engine.data()[..split_at], &target_data[..split_at]);
        assert_eq!(engine.data()[split_at], 0);
    }

    #[test]
    fn splice_fails_when_corpus_has_no_distinct_checksum() {
        let seed = item(vec![1, 2, 3], 7);
        let mut engine = MutationEngine::new(seed.clone(), Dicts::default(), false, ScriptedRng::always_zero()).unwrap();
        let queue = vec![item(vec![1, 2, 3], 7)];
        assert!(!engine.splice(&queue));
        assert_eq!(engine.data(), &[1, 2, 3]);
    }

    #[test]
    fn splice_leaves_buffer_length_unchanged_and_refreshes_the_spliced_tail() {
        let seed = item(vec![0u8; 10], 1);
        let mut engine = MutationEngine::with_config(
            seed,
            Dicts::default(),
            true,
            ScriptedRng::new(vec![0, 2]),
            EngineConfig::default(),
        )
        .unwrap();
        engine.branch_mask.as_mut().unwrap().revoke_modify(5);
        let mut target_data = vec![0u8; 5];
        target_data[1] = 1;
        target_data[2] = 1;
        let queue = vec![item(target_data, 2)];

        assert!(engine.splice(&queue));
        // data length is never touched by splice.
        assert_eq!(engine.branch_mask().unwrap().len(), 11);
        assert_eq!(engine.data().len(), 10);
        // split_at landed at 1 here, so position 5 falls in the refreshed
        // tail and regains its modify capability.
        assert!(engine.branch_mask().unwrap().can_modify(5));
    }
}
