pub mod context;
pub mod digest;
pub mod engine;
pub mod fields;
pub mod ndnmutator;
pub mod scalar;
pub mod selector;
pub mod structural;

pub use digest::{DigestProvider, RingSha256};
pub use engine::TlvMutator;
pub use ndnmutator::*;
pub use scalar::{HavocBytesMutator, ScalarMutator};

pub use libafl::inputs::BytesInput;

use libafl_bolts::tuples::{tuple_list, tuple_list_type};

use crate::config::MutatorConfig;

pub type NdnMutatorsTupleType = tuple_list_type!(
    NdnPacketMutator,
    NdnInterestDataMutator
);

pub fn ndn_mutations() -> NdnMutatorsTupleType {
    ndn_mutations_with_config(&MutatorConfig::default())
}

pub fn ndn_mutations_with_config(config: &MutatorConfig) -> NdnMutatorsTupleType {
    tuple_list!(
        NdnPacketMutator::with_config(config.clone()),
        NdnInterestDataMutator::with_config(config.clone())
    )
}
