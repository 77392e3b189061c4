use log::debug;

use crate::{
    config::MutatorConfig,
    error::MutatorError,
    inputstruct::{grammar::ContainerKind, tlv::Element},
};

use super::{
    context::{Budget, MutationCtx},
    digest::{DigestProvider, RingSha256},
    fields::mutate_packet,
    scalar::{HavocBytesMutator, ScalarMutator},
};

/// Structure-aware mutator for encoded Interest and Data packets.
pub struct TlvMutator<S = HavocBytesMutator, D = RingSha256> {
    scalar: S,
    digest: D,
    config: MutatorConfig,
}

impl TlvMutator {
    pub fn with_defaults() -> Self {
        Self::new(HavocBytesMutator::new(), RingSha256, MutatorConfig::default())
    }

    pub fn with_config(config: MutatorConfig) -> Self {
        Self::new(HavocBytesMutator::new(), RingSha256, config)
    }
}

impl<S, D> TlvMutator<S, D>
where
    S: ScalarMutator,
    D: DigestProvider,
{
    pub fn new(scalar: S, digest: D, config: MutatorConfig) -> Self {
        Self {
            scalar,
            digest,
            config,
        }
    }

    pub fn config(&self) -> &MutatorConfig {
        &self.config
    }

    /// Mutates one field of the packet at the start of `packet`; bytes after
    /// it are carried over unchanged.
    ///
    /// Returns `None` when nothing changed: unparsable input, a packet type
    /// other than Interest or Data, a failed precondition or an output that
    /// would exceed `max_size`.
    pub fn mutate(
        &mut self,
        packet: &[u8],
        max_size: usize,
        seed: u64,
    ) -> Result<Option<Vec<u8>>, MutatorError> {
        let (element, used) = match Element::parse(packet) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("not mutating malformed packet: {e}");
                return Ok(None);
            }
        };
        let Some(kind) = ContainerKind::for_packet(element.tag()) else {
            debug!("not mutating packet with type {}", element.tag());
            return Ok(None);
        };

        let budget = Budget::new(packet.len(), max_size);
        let mut ctx = MutationCtx::new(seed, budget, &mut self.scalar, &self.digest, &self.config);
        let mutated = mutate_packet(&mut ctx, kind, &element)?;

        let mut out = mutated.encode();
        out.extend_from_slice(&packet[used..]);
        if out.len() > max_size {
            debug!("mutated packet of {} bytes exceeds {}", out.len(), max_size);
            return Ok(None);
        }
        if out == packet {
            return Ok(None);
        }
        Ok(Some(out))
    }

    /// libFuzzer-style variant: mutates `buf[..size]` in place, never writing
    /// past `max_size` nor the end of `buf`, and returns the new size (`size`
    /// itself on a no-op).
    pub fn mutate_in_place(
        &mut self,
        buf: &mut [u8],
        size: usize,
        max_size: usize,
        seed: u64,
    ) -> Result<usize, MutatorError> {
        let size = size.min(buf.len());
        let max_size = max_size.min(buf.len());
        match self.mutate(&buf[..size], max_size, seed)? {
            Some(out) => {
                buf[..out.len()].copy_from_slice(&out);
                Ok(out.len())
            }
            None => Ok(size),
        }
    }
}
