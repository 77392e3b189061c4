use libafl::{
    inputs::{BytesInput, HasMutatorBytes},
    mutators::{havoc_mutations_no_crossover, HavocMutationsNoCrossoverType, Mutator, StdScheduledMutator},
    state::{HasMaxSize, HasRand},
};
use libafl_bolts::rands::StdRand;
use log::debug;
use rand::RngCore;

use crate::{error::MutatorError, inputstruct::grammar::LengthRule};

use super::context::MutationCtx;

/// Generic byte-level mutator the engine uses for leaf fields.
pub trait ScalarMutator {
    /// Mutates `buf` in place without growing it past `max_len` and returns
    /// its new length (`buf.len()` afterwards).
    fn mutate_bytes(
        &mut self,
        rng: &mut dyn RngCore,
        buf: &mut Vec<u8>,
        max_len: usize,
    ) -> Result<usize, MutatorError>;
}

// 叶子字段的临时 state, max_size 即字段的长度上限
struct LeafState {
    rand: StdRand,
    max_size: usize,
}

impl HasRand for LeafState {
    type Rand = StdRand;

    fn rand(&self) -> &StdRand {
        &self.rand
    }

    fn rand_mut(&mut self) -> &mut StdRand {
        &mut self.rand
    }
}

impl HasMaxSize for LeafState {
    fn max_size(&self) -> usize {
        self.max_size
    }

    fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }
}

/// libafl's stacked havoc (without crossover) applied to one leaf value.
pub struct HavocBytesMutator {
    scheduled: StdScheduledMutator<BytesInput, HavocMutationsNoCrossoverType, LeafState>,
}

impl Default for HavocBytesMutator {
    fn default() -> Self {
        Self::new()
    }
}

impl HavocBytesMutator {
    pub fn new() -> Self {
        Self::with_max_stack_pow(4)
    }

    /// Each call stacks `2^k` havoc operations, `k` drawn in `1..=max_stack_pow`.
    pub fn with_max_stack_pow(max_stack_pow: usize) -> Self {
        Self {
            scheduled: StdScheduledMutator::with_max_stack_pow(
                havoc_mutations_no_crossover(),
                max_stack_pow.max(1),
            ),
        }
    }
}

impl ScalarMutator for HavocBytesMutator {
    fn mutate_bytes(
        &mut self,
        rng: &mut dyn RngCore,
        buf: &mut Vec<u8>,
        max_len: usize,
    ) -> Result<usize, MutatorError> {
        buf.truncate(max_len);
        if max_len == 0 {
            return Ok(0);
        }
        let mut state = LeafState {
            rand: StdRand::with_seed(rng.next_u64()),
            max_size: max_len,
        };
        let mut input = BytesInput::new(std::mem::take(buf));
        self.scheduled
            .mutate(&mut state, &mut input)
            .map_err(|e| MutatorError::Havoc(e.to_string()))?;
        buf.extend_from_slice(input.bytes());
        buf.truncate(max_len);
        Ok(buf.len())
    }
}

/// Mutates a leaf value until its length satisfies `rule`.
///
/// Every attempt starts over from `value`; after `scalar_retry_limit` failed
/// attempts the original bytes are returned.
pub fn mutate_scalar(
    ctx: &mut MutationCtx<'_>,
    rule: LengthRule,
    value: &[u8],
) -> Result<Vec<u8>, MutatorError> {
    let max_len = rule.max_len(value.len(), ctx.budget.free_space());
    for _ in 0..ctx.config.scalar_retry_limit {
        let mut attempt = value.to_vec();
        let len = ctx.scalar.mutate_bytes(&mut ctx.rng, &mut attempt, max_len)?;
        attempt.truncate(len);
        if attempt.len() <= max_len && rule.accepts(attempt.len()) {
            return Ok(attempt);
        }
    }
    debug!("scalar retry limit reached for {:?}, keeping original bytes", rule);
    Ok(value.to_vec())
}
