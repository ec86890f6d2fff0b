//! RNG seed derivation for deterministic stage behavior.
//!
//! Each room owns a base seed; every stage entry reseeds the room RNG from a
//! value derived here. Replaying the same message log against a room created
//! with the same base seed therefore reproduces the identical shuffles and
//! draws, independent of how many random values earlier stages consumed.

/// Derive the RNG seed for one stage activation.
///
/// Unique per (room, stage) combination; stable across re-entries of the
/// same stage index within a run.
pub fn derive_stage_seed(base_seed: u64, stage_index: u32) -> u64 {
    base_seed
        .wrapping_add((stage_index as u64).wrapping_mul(1_000_000))
        .wrapping_add(1)
}
