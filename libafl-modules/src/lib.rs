//! Structure-aware mutators for NDN Interest and Data packets, usable on
//! their own through [`mutators::TlvMutator`] or as libafl mutators.

pub mod config;
pub mod error;
pub mod inputstruct;
pub mod mutators;

pub use config::MutatorConfig;
pub use error::{MutatorError, TlvError};
