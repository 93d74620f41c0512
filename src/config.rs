//! Tunable constants for the mutation engine.

/// One bit of the effector map covers this many input bytes.
pub const EFF_MAP_SCALE2: u32 = 8;

/// Size, in bytes, of an ABI-encoded address dictionary entry.
pub const ADDRESS_LEN: usize = 20;

/// Size, in bytes, of an ABI word (the stride used by the address-dictionary
/// overwrite stage).
pub const ABI_WORD_LEN: usize = 32;

/// Number of stages tracked by [`crate::engine::MutationEngine::stage_cycles`].
pub const STAGE_COUNT: usize = 32;

/// `EngineConfig` collects the magic numbers the original mutation engine
/// hard-coded as free constants (`ARITH_MAX`, `HAVOC_MIN`, ...) into a single
/// injectable, overridable struct. [`Default`] reproduces the spec's exact
/// values; callers wanting a cheaper engine for tests or interactive use can
/// override any field before constructing a [`crate::engine::MutationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Maximum magnitude of the `±k` arithmetic stages try at each width.
    pub arith_max: u32,
    /// Number of rounds the havoc stage runs.
    pub havoc_min_rounds: u32,
    /// `useStacking = 2^(1 + UR(havoc_stack_pow2))`.
    pub havoc_stack_pow2: u32,
    /// Maximum number of attempts `splice`/`prolongate` make to find a
    /// suitable corpus pair.
    pub splice_cycles: u32,
    /// Above this many dictionary entries, each entry is additionally skipped
    /// probabilistically during deterministic dictionary overwrite.
    pub max_det_extras: u32,
    /// Upper bound on the block length chosen for the "large" branch of
    /// havoc's constant-run insertion (opcode 13, non-clone branch).
    pub havoc_blk_large: u32,
    /// Above this density (percent, 0-100) the effector map is flagged as
    /// fully dense rather than tracked bit-by-bit.
    pub eff_max_perc: u32,
    /// Guard rail against runaway allocation requests in the branch-mask
    /// allocator (bytes). The original C++ aborts the process past this
    /// point; this crate panics with the same intent.
    pub max_alloc: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arith_max: 35,
            havoc_min_rounds: 1024,
            havoc_stack_pow2: 7,
            splice_cycles: 15,
            max_det_extras: 200,
            havoc_blk_large: 1500,
            eff_max_perc: 90,
            max_alloc: 1 << 30,
        }
    }
}
