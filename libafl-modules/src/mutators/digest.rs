use log::error;
use ring::digest::{digest, SHA256};

use crate::{
    error::MutatorError,
    inputstruct::{
        ndn_tlv::{PARAMETERS_DIGEST_LEN, PARAMETERS_SHA256_DIGEST_COMPONENT},
        tlv::Element,
    },
};

/// Hash primitive behind the parameters digest component.
pub trait DigestProvider {
    fn digest(&self, data: &[u8]) -> Result<Vec<u8>, MutatorError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RingSha256;

impl DigestProvider for RingSha256 {
    fn digest(&self, data: &[u8]) -> Result<Vec<u8>, MutatorError> {
        Ok(digest(&SHA256, data).as_ref().to_vec())
    }
}

/// Brings every ParametersSha256Digest component of `name` in line with
/// `params`, the full ApplicationParameters element. Without parameters the
/// digest components are dropped. Other components keep their bytes.
pub fn recompute_digest(
    name: &Element,
    params: Option<&Element>,
    provider: &dyn DigestProvider,
) -> Result<Element, MutatorError> {
    if name.find(PARAMETERS_SHA256_DIGEST_COMPONENT).is_none() {
        return Ok(name.clone());
    }
    let hash = match params {
        Some(params) => {
            let hash = provider.digest(&params.encode()).map_err(|e| {
                error!("parameters digest failed: {e}");
                e
            })?;
            if hash.len() != PARAMETERS_DIGEST_LEN {
                error!("parameters digest has {} bytes", hash.len());
                return Err(MutatorError::DigestLength {
                    expected: PARAMETERS_DIGEST_LEN,
                    actual: hash.len(),
                });
            }
            Some(Element::new(PARAMETERS_SHA256_DIGEST_COMPONENT, hash))
        }
        None => None,
    };
    let mut value = Vec::with_capacity(name.value_len());
    for component in name.children() {
        if component.tag() != PARAMETERS_SHA256_DIGEST_COMPONENT {
            component.encode_into(&mut value);
        } else if let Some(hash) = &hash {
            hash.encode_into(&mut value);
        }
    }
    Ok(name.with_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputstruct::ndn_tlv::{APPLICATION_PARAMETERS, GENERIC_NAME_COMPONENT, NAME};

    struct Broken;

    impl DigestProvider for Broken {
        fn digest(&self, _data: &[u8]) -> Result<Vec<u8>, MutatorError> {
            Ok(vec![0; 20])
        }
    }

    fn name_with_digest() -> Element {
        Element::container(
            NAME,
            [
                &Element::new(GENERIC_NAME_COMPONENT, b"a".to_vec()),
                &Element::new(PARAMETERS_SHA256_DIGEST_COMPONENT, vec![0; 32]),
            ],
        )
    }

    #[test]
    fn digest_matches_parameters_encoding() {
        let params = Element::new(APPLICATION_PARAMETERS, vec![1, 2, 3]);
        let name = recompute_digest(&name_with_digest(), Some(&params), &RingSha256).unwrap();
        let expected = digest(&SHA256, &[36, 3, 1, 2, 3]);
        assert_eq!(name.children()[0].value(), b"a");
        assert_eq!(name.children()[1].value(), expected.as_ref());
    }

    #[test]
    fn removed_parameters_drop_digest_components() {
        let name = recompute_digest(&name_with_digest(), None, &RingSha256).unwrap();
        assert_eq!(name.child_count(), 1);
        assert_eq!(name.children()[0].tag(), GENERIC_NAME_COMPONENT);
    }

    #[test]
    fn wrong_digest_length_is_fatal() {
        let params = Element::new(APPLICATION_PARAMETERS, vec![1]);
        let err = recompute_digest(&name_with_digest(), Some(&params), &Broken).unwrap_err();
        assert!(matches!(err, MutatorError::DigestLength { expected: 32, actual: 20 }));
    }
}
