//! Prolongate: ABI-level cross-seed recombination. Doubles the ABI's
//! function-descriptor list, concatenates a distinct-checksum corpus
//! member's bytes with the current seed's, and runs the oracle once per
//! attempt with `transaction_length` temporarily raised to 2.

use super::stage_id;
use crate::abi::{AbiDescriptors, FunctionDescriptor};
use crate::engine::MutationEngine;
use crate::item::FuzzItem;
use crate::oracle::Oracle;
use crate::rng::EngineRng;
use crate::util::locate_diffs;

impl<R: EngineRng> MutationEngine<R> {
    /// Attempt up to `splice_cycles` ABI-level recombinations against
    /// `queue`. Returns `true` iff at least one candidate was emitted.
    ///
    /// `cur_item`'s data is never mutated by this stage; each attempt works
    /// off a freshly built buffer of `target.data ++ seed.data`.
    pub fn prolongate<A: AbiDescriptors>(
        &mut self,
        queue: &[FuzzItem],
        abi: &mut A,
        oracle: &mut impl Oracle,
    ) -> bool {
        let cycles = self.config.splice_cycles;
        self.begin_stage("prolongation", cycles as u64);

        let cur_cksum = self.cur_item.res.cksum;
        let candidates: Vec<&FuzzItem> = queue.iter().filter(|it| it.res.cksum != cur_cksum).collect();
        if candidates.is_empty() || self.data_size() <= 1 {
            self.stage_max = 0;
            self.finish_stage(stage_id::PROLONGATION);
            return false;
        }

        let original_len = abi.descriptors().len();
        let originals: Vec<FunctionDescriptor> = abi.descriptors().to_vec();
        abi.descriptors_mut().extend(originals.iter().cloned());
        if abi.descriptors().last().map(|d| d.name.is_empty()).unwrap_or(false) {
            abi.descriptors_mut().pop();
        }

        let origin = self.cur_item.data.clone();
        let mut emitted = 0u64;

        for attempt in 0..cycles {
            self.stage_cur = attempt as u64;
            let target = candidates[self.rng.below(candidates.len() as u32) as usize];
            let min_len = origin.len().min(target.data.len());
            let max_len = origin.len().max(target.data.len());
            let (first, last) = locate_diffs(&origin, &target.data, min_len);
            let (Some(first), Some(last)) = (first, last) else {
                continue;
            };
            if last < 2 || first == last {
                continue;
            }

            let mut buffer = vec![0u8; 2 * max_len];
            buffer[..target.data.len()].copy_from_slice(&target.data);
            buffer[max_len..max_len + origin.len()].copy_from_slice(&origin);

            abi.set_transaction_length(2);
            oracle.on_mutate(&buffer);
            abi.set_transaction_length(1);
            emitted += 1;
        }

        abi.descriptors_mut().truncate(original_len);

        self.stage_max = emitted;
        self.finish_stage(stage_id::PROLONGATION);
        emitted > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dicts;
    use crate::item::OracleResult;
    use crate::rng::ScriptedRng;

    #[derive(Default)]
    struct TestAbi {
        descriptors: Vec<FunctionDescriptor>,
        transaction_length: u32,
    }

    impl AbiDescriptors for TestAbi {
        fn descriptors(&self) -> &[FunctionDescriptor] {
            &self.descriptors
        }
        fn descriptors_mut(&mut self) -> &mut Vec<FunctionDescriptor> {
            &mut self.descriptors
        }
        fn transaction_length(&self) -> u32 {
            self.transaction_length
        }
        fn set_transaction_length(&mut self, length: u32) {
            self.transaction_length = length;
        }
    }

    fn item(data: Vec<u8>, cksum: u64) -> FuzzItem {
        FuzzItem {
            data,
            res: OracleResult { cksum },
            ..FuzzItem::new(vec![])
        }
    }

    #[test]
    fn prolongate_doubles_descriptors_and_restores_them_after() {
        let seed = item(vec![0u8; 8], 1);
        let mut engine = MutationEngine::new(seed, Dicts::default(), false, ScriptedRng::new(vec![0, 0])).unwrap();
        let mut abi = TestAbi {
            descriptors: vec![FunctionDescriptor::new("transfer"), FunctionDescriptor::new("approve")],
            transaction_length: 1,
        };
        let mut target_data = vec![0u8; 8];
        target_data[2] = 1;
        target_data[3] = 1;
        let queue = vec![item(target_data, 2)];

        let mut seen_lengths = Vec::new();
        let mut oracle = |data: &[u8]| {
            seen_lengths.push(data.len());
            FuzzItem::new(data.to_vec())
        };
        assert!(engine.prolongate(&queue, &mut abi, &mut oracle));
        assert_eq!(abi.descriptors().len(), 2);
        assert_eq!(abi.transaction_length(), 1);
        assert!(seen_lengths.iter().all(|&l| l == 16));
    }

    #[test]
    fn prolongate_strips_a_trailing_empty_name_sentinel() {
        let seed = item(vec![0u8; 4], 1);
        let mut engine = MutationEngine::new(seed, Dicts::default(), false, ScriptedRng::always_zero()).unwrap();
        let mut abi = TestAbi {
            descriptors: vec![FunctionDescriptor::new("transfer"), FunctionDescriptor::new("")],
            transaction_length: 1,
        };
        let mut target_data = vec![0u8; 4];
        target_data[1] = 1;
        target_data[2] = 1;
        let queue = vec![item(target_data, 2)];
        let mut oracle = |data: &[u8]| FuzzItem::new(data.to_vec());

        // Capture descriptor count mid-call isn't directly observable from
        // the outside, but the post-call length must match the original.
        assert!(engine.prolongate(&queue, &mut abi, &mut oracle));
        assert_eq!(abi.descriptors().len(), 2);
    }

    #[test]
    fn prolongate_fails_with_no_distinct_checksum_corpus_member() {
        let seed = item(vec![1, 2, 3, 4], 5);
        let mut engine = MutationEngine::new(seed, Dicts::default(), false, ScriptedRng::always_zero()).unwrap();
        let mut abi = TestAbi {
            descriptors: vec![FunctionDescriptor::new("transfer")],
            transaction_length: 1,
        };
        let queue = vec![item(vec![1, 2, 3, 4], 5)];
        let mut oracle = |data: &[u8]| FuzzItem::new(data.to_vec());
        assert!(!engine.prolongate(&queue, &mut abi, &mut oracle));
        assert_eq!(abi.descriptors().len(), 1);
    }
}
