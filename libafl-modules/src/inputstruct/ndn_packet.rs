//! Well-formed packet builders used for seeds, fallbacks and Data answers.

use crate::{
    error::MutatorError,
    mutators::digest::{recompute_digest, DigestProvider},
};

use super::{
    ndn_tlv::*,
    tlv::Element,
};

/// Shortest big-endian encoding of a non-negative integer (1, 2, 4 or 8 bytes).
pub fn encode_non_negative(n: u64) -> Vec<u8> {
    if n <= u8::MAX as u64 {
        vec![n as u8]
    } else if n <= u16::MAX as u64 {
        (n as u16).to_be_bytes().to_vec()
    } else if n <= u32::MAX as u64 {
        (n as u32).to_be_bytes().to_vec()
    } else {
        n.to_be_bytes().to_vec()
    }
}

/// Name from a `/`-separated URI; empty segments are skipped.
pub fn name_from_uri(uri: &str) -> Element {
    let components: Vec<Element> = uri
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| Element::new(GENERIC_NAME_COMPONENT, s.as_bytes()))
        .collect();
    Element::container(NAME, &components)
}

#[derive(Debug, Clone)]
pub struct InterestSpec<'a> {
    pub name: &'a str,
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
    pub nonce: [u8; 4],
    pub lifetime_ms: Option<u64>,
    pub hop_limit: Option<u8>,
    pub parameters: Option<&'a [u8]>,
}

impl Default for InterestSpec<'_> {
    fn default() -> Self {
        Self {
            name: "/a/test",
            can_be_prefix: false,
            must_be_fresh: false,
            nonce: [0; 4],
            lifetime_ms: None,
            hop_limit: None,
            parameters: None,
        }
    }
}

/// Encodes an Interest. With parameters, the Name gets a
/// ParametersSha256Digest component computed by `digest`.
pub fn build_interest(spec: &InterestSpec<'_>, digest: &dyn DigestProvider) -> Result<Element, MutatorError> {
    let mut name = name_from_uri(spec.name);
    let params = spec
        .parameters
        .map(|p| Element::new(APPLICATION_PARAMETERS, p));
    if let Some(params) = &params {
        let placeholder = Element::new(PARAMETERS_SHA256_DIGEST_COMPONENT, vec![0; PARAMETERS_DIGEST_LEN]);
        name = name.insert_child(name.child_count(), &placeholder);
        name = recompute_digest(&name, Some(params), digest)?;
    }

    let mut children = vec![name];
    if spec.can_be_prefix {
        children.push(Element::new(CAN_BE_PREFIX, Vec::new()));
    }
    if spec.must_be_fresh {
        children.push(Element::new(MUST_BE_FRESH, Vec::new()));
    }
    children.push(Element::new(NONCE, spec.nonce.to_vec()));
    if let Some(lifetime) = spec.lifetime_ms {
        children.push(Element::new(INTEREST_LIFETIME, encode_non_negative(lifetime)));
    }
    if let Some(hops) = spec.hop_limit {
        children.push(Element::new(HOP_LIMIT, vec![hops]));
    }
    children.extend(params);
    Ok(Element::container(INTEREST, &children))
}

/// Encodes a Data packet signed with a plain SHA-256 digest over everything
/// from the Name up to the SignatureInfo.
pub fn build_data(
    name: &str,
    content: &[u8],
    freshness_ms: Option<u64>,
    digest: &dyn DigestProvider,
) -> Result<Element, MutatorError> {
    let mut meta = vec![Element::new(CONTENT_TYPE, vec![0])];
    if let Some(freshness) = freshness_ms {
        meta.push(Element::new(FRESHNESS_PERIOD, encode_non_negative(freshness)));
    }
    let signed = [
        name_from_uri(name),
        Element::container(META_INFO, &meta),
        Element::new(CONTENT, content),
        Element::container(
            SIGNATURE_INFO,
            [&Element::new(SIGNATURE_TYPE, vec![DIGEST_SHA256])],
        ),
    ];
    let portion: Vec<u8> = signed.iter().flat_map(|e| e.encode()).collect();
    let signature = Element::new(SIGNATURE_VALUE, digest.digest(&portion)?);
    Ok(Element::container(DATA, signed.iter().chain(std::iter::once(&signature))))
}

/// Interest used when the fuzzer input does not parse.
pub fn fallback_interest(digest: &dyn DigestProvider) -> Result<Element, MutatorError> {
    build_interest(
        &InterestSpec {
            parameters: Some(b"\x80\x01\xff"),
            ..InterestSpec::default()
        },
        digest,
    )
}

/// Data used as the answer template when none is available.
pub fn fallback_data(digest: &dyn DigestProvider) -> Result<Element, MutatorError> {
    build_data("/space", b"", None, digest)
}

/// Data answering `interest`: every Name of `template` is swapped for the
/// Interest's Name. Falls back to `template` when the Interest has no Name or
/// the answer would exceed `max_size`.
pub fn answer_interest(template: &Element, interest: &Element, max_size: usize) -> Element {
    let Some(name) = interest.find(NAME).map(|i| &interest.children()[i]) else {
        return template.clone();
    };
    let answer = Element::container(
        DATA,
        template
            .children()
            .iter()
            .map(|c| if c.tag() == NAME { name } else { c }),
    );
    if answer.encoded_len() > max_size {
        return template.clone();
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutators::digest::RingSha256;

    #[test]
    fn non_negative_integers_use_shortest_width() {
        assert_eq!(encode_non_negative(0), vec![0]);
        assert_eq!(encode_non_negative(4000), vec![0x0f, 0xa0]);
        assert_eq!(encode_non_negative(70000).len(), 4);
        assert_eq!(encode_non_negative(u64::MAX).len(), 8);
    }

    #[test]
    fn fallback_interest_carries_a_matching_digest() {
        let interest = fallback_interest(&RingSha256).unwrap();
        let name = &interest.children()[0];
        assert_eq!(name.child_count(), 3);
        let params = &interest.children()[interest.find(APPLICATION_PARAMETERS).unwrap()];
        let expected = RingSha256.digest(&params.encode()).unwrap();
        assert_eq!(name.children()[2].value(), expected.as_slice());
    }

    #[test]
    fn answer_takes_the_interest_name() {
        let data = fallback_data(&RingSha256).unwrap();
        let interest = build_interest(
            &InterestSpec {
                name: "/x/y/z",
                ..InterestSpec::default()
            },
            &RingSha256,
        )
        .unwrap();
        let answer = answer_interest(&data, &interest, 4096);
        assert_eq!(answer.tag(), DATA);
        assert_eq!(answer.children()[0], interest.children()[0]);
        assert_eq!(answer.children()[1..], data.children()[1..]);

        let small = answer_interest(&data, &interest, data.encoded_len());
        assert_eq!(small, data);
    }
}
