use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::MutatorConfig;

use super::{digest::DigestProvider, scalar::ScalarMutator};

/// Size budget of one mutation call: the packet's size on entry and the
/// largest size the caller accepts back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    pub current: usize,
    pub max: usize,
}

impl Budget {
    pub fn new(current: usize, max: usize) -> Self {
        Self { current, max }
    }

    /// Room left for growing a scalar field, keeping 8 bytes for length headers.
    pub fn free_space(&self) -> usize {
        self.max.saturating_sub(self.current).saturating_sub(8)
    }

    pub fn allows_doubling(&self) -> bool {
        self.max > self.current.saturating_mul(2)
    }

    /// Appending needs `max - 8 > current`, the same 8 bytes of header
    /// headroom as [`Budget::free_space`]; the exact size is checked again
    /// once the container is rebuilt.
    pub fn allows_append(&self) -> bool {
        self.max.saturating_sub(8) > self.current
    }

    pub fn allows_retag(&self) -> bool {
        self.max.saturating_sub(5) > self.current
    }

    /// Whether replacing a subtree of `old_len` encoded bytes with one of
    /// `new_len` keeps the packet within `max`.
    pub fn fits(&self, old_len: usize, new_len: usize) -> bool {
        self.current.saturating_sub(old_len) + new_len <= self.max
    }
}

/// Everything one mutation call threads through the recursive mutators.
pub struct MutationCtx<'a> {
    pub rng: StdRng,
    pub budget: Budget,
    pub scalar: &'a mut dyn ScalarMutator,
    pub digest: &'a dyn DigestProvider,
    pub config: &'a MutatorConfig,
    /// Drawn once per call in 0..100
    pub satisfaction_bias: u32,
}

impl<'a> MutationCtx<'a> {
    pub fn new(
        seed: u64,
        budget: Budget,
        scalar: &'a mut dyn ScalarMutator,
        digest: &'a dyn DigestProvider,
        config: &'a MutatorConfig,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let satisfaction_bias = rng.gen_range(0..100);
        Self {
            rng,
            budget,
            scalar,
            digest,
            config,
            satisfaction_bias,
        }
    }

    /// True when satisfaction-critical fields are off limits for this call.
    pub fn avoid_satisfaction_fields(&self) -> bool {
        self.satisfaction_bias > self.config.satisfaction_threshold
    }
}
