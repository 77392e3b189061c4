use std::borrow::Cow;

use libafl::{
    inputs::HasMutatorBytes,
    mutators::{MutationResult, Mutator},
    state::{HasMaxSize, HasRand},
    Error,
};
use libafl_bolts::{rands::Rand, Named};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::MutatorConfig,
    inputstruct::{
        ndn_packet::{answer_interest, fallback_data, fallback_interest},
        ndn_tlv::{DATA, INTEREST},
        packet_ring::PacketRing,
        tlv::Element,
    },
};

use super::{digest::RingSha256, engine::TlvMutator};

fn write_input<I: HasMutatorBytes>(input: &mut I, bytes: &[u8]) {
    input.resize(bytes.len(), 0);
    input.bytes_mut().copy_from_slice(bytes);
}

// 结构化变异单个 Interest/Data 数据包
pub struct NdnPacketMutator {
    engine: TlvMutator,
}

impl NdnPacketMutator {
    pub fn new() -> Self {
        Self::with_config(MutatorConfig::default())
    }

    pub fn with_config(config: MutatorConfig) -> Self {
        Self {
            engine: TlvMutator::with_config(config),
        }
    }
}

impl Default for NdnPacketMutator {
    fn default() -> Self {
        Self::new()
    }
}

impl Named for NdnPacketMutator {
    fn name(&self) -> &Cow<'static, str> {
        static NAME: Cow<'static, str> = Cow::Borrowed("NdnPacketMutator");
        &NAME
    }
}

impl<I, S> Mutator<I, S> for NdnPacketMutator
where
    S: HasRand + HasMaxSize,
    I: HasMutatorBytes,
{
    fn mutate(&mut self, state: &mut S, input: &mut I) -> Result<MutationResult, Error> {
        debug!("NdnPacketMutator");
        let seed = state.rand_mut().next();
        let max_size = state.max_size().min(self.engine.config().max_packet_size);
        match self.engine.mutate(input.bytes(), max_size, seed)? {
            Some(out) => {
                write_input(input, &out);
                Ok(MutationResult::Mutated)
            }
            None => Ok(MutationResult::Skipped),
        }
    }
}

// 变异 Interest, 并按概率附带一个应答近期 Interest 的 Data
pub struct NdnInterestDataMutator {
    engine: TlvMutator,
    recent: PacketRing,
}

impl NdnInterestDataMutator {
    pub fn new() -> Self {
        Self::with_config(MutatorConfig::default())
    }

    pub fn with_config(config: MutatorConfig) -> Self {
        Self {
            recent: PacketRing::new(config.recent_capacity),
            engine: TlvMutator::with_config(config),
        }
    }

    pub fn recent(&self) -> &PacketRing {
        &self.recent
    }

    /// Splits the input into its Interest and Data template, substituting the
    /// fallback packets for whatever does not parse.
    fn split_input(bytes: &[u8]) -> Result<(Vec<u8>, Element), Error> {
        let (interest, rest) = match Element::parse(bytes) {
            Ok((element, used)) if element.tag() == INTEREST => (bytes[..used].to_vec(), &bytes[used..]),
            _ => {
                debug!("input does not start with an Interest, using the fallback");
                (fallback_interest(&RingSha256)?.encode(), &[][..])
            }
        };
        let template = match Element::parse(rest) {
            Ok((element, _)) if element.tag() == DATA => element,
            _ => fallback_data(&RingSha256)?,
        };
        Ok((interest, template))
    }

    fn answer(&mut self, rng: &mut StdRng, template: &Element, half: usize) -> Result<Option<Vec<u8>>, Error> {
        let Some(recent) = self.recent.choose(rng) else {
            return Ok(None);
        };
        let Ok((interest, _)) = Element::parse(recent) else {
            return Ok(None);
        };
        let data = answer_interest(template, &interest, half).encode();
        let mutated = self.engine.mutate(&data, half, rng.gen())?;
        Ok(Some(mutated.unwrap_or(data)))
    }
}

impl Default for NdnInterestDataMutator {
    fn default() -> Self {
        Self::new()
    }
}

impl Named for NdnInterestDataMutator {
    fn name(&self) -> &Cow<'static, str> {
        static NAME: Cow<'static, str> = Cow::Borrowed("NdnInterestDataMutator");
        &NAME
    }
}

impl<I, S> Mutator<I, S> for NdnInterestDataMutator
where
    S: HasRand + HasMaxSize,
    I: HasMutatorBytes,
{
    fn mutate(&mut self, state: &mut S, input: &mut I) -> Result<MutationResult, Error> {
        debug!("NdnInterestDataMutator");
        let mut rng = StdRng::seed_from_u64(state.rand_mut().next());
        let max_size = state.max_size().min(self.engine.config().max_packet_size);
        let half = max_size / 2;

        let (interest, template) = Self::split_input(input.bytes())?;

        let data = if rng.gen_range(0..100) < self.engine.config().data_response_percent {
            self.answer(&mut rng, &template, half)?
        } else {
            None
        };

        let interest = self
            .engine
            .mutate(&interest, half, rng.gen())?
            .unwrap_or(interest);
        self.recent.push(interest.clone());

        let mut out = interest;
        if let Some(data) = data {
            if out.len() + data.len() <= max_size {
                out.extend_from_slice(&data);
            } else {
                info!("dropping {} byte Data answer, no room", data.len());
            }
        }
        if out.len() > max_size || out == input.bytes() {
            return Ok(MutationResult::Skipped);
        }
        write_input(input, &out);
        Ok(MutationResult::Mutated)
    }
}
