#![allow(clippy::too_many_arguments)]

pub mod abi;
pub mod branch_mask;
pub mod config;
pub mod dictionary;
pub mod effector;
pub mod engine;
pub mod error;
pub mod item;
pub mod oracle;
pub mod position_map;
pub mod rng;
pub mod util;

pub mod prelude {
    pub use crate::abi::{AbiDescriptors, FunctionDescriptor};
    pub use crate::config::EngineConfig;
    pub use crate::dictionary::{DictEntry, Dictionary, Dicts};
    pub use crate::engine::MutationEngine;
    pub use crate::error::MutationError;
    pub use crate::item::{FuzzItem, HitRank, OracleResult};
    pub use crate::oracle::Oracle;
    pub use crate::rng::{EngineRng, StdEngineRng};
}
