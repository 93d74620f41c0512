//! `random`: the baseline/sanity stage. Overwrites every byte of the
//! current seed with a fresh uniform random byte and invokes the oracle
//! once.

use super::stage_id;
use crate::engine::MutationEngine;
use crate::oracle::Oracle;
use crate::rng::EngineRng;

impl<R: EngineRng> MutationEngine<R> {
    /// Overwrite the entire buffer with uniform random bytes and invoke the
    /// oracle once.
    pub fn random(&mut self, oracle: &mut impl Oracle) {
        self.begin_stage("random", 1);
        let fresh: Vec<u8> = (0..self.data_size()).map(|_| self.rng.byte()).collect();
        self.cur_item.data.copy_from_slice(&fresh);
        oracle.on_mutate(&self.cur_item.data);
        self.stage_cur = 1;
        self.finish_stage(stage_id::RANDOM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dicts;
    use crate::item::FuzzItem;
    use crate::rng::ScriptedRng;

    #[test]
    fn random_overwrites_every_byte_and_calls_the_oracle_once() {
        let mut engine = MutationEngine::new(
            FuzzItem::new(vec![0u8; 6]),
            Dicts::default(),
            false,
            ScriptedRng::new(vec![7, 9, 11, 13, 15, 17]),
        )
        .unwrap();
        let mut calls = 0;
        let mut oracle = |data: &[u8]| {
            calls += 1;
            FuzzItem::new(data.to_vec())
        };
        engine.random(&mut oracle);
        assert_eq!(calls, 1);
        assert_eq!(engine.data(), &[7, 9, 11, 13, 15, 17]);
        assert_eq!(engine.stage_cycles()[stage_id::RANDOM], 1);
    }
}
