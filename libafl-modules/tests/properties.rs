//! Property tests for the packet mutation engine: every output is a single,
//! honestly length-prefixed packet within budget, and the field invariants
//! (nonce and lifetime widths, parameters digest, one FinalBlockId) hold.

use ndnlibafl::inputstruct::ndn_packet::{build_data, build_interest, InterestSpec};
use ndnlibafl::inputstruct::ndn_tlv::*;
use ndnlibafl::inputstruct::tlv::Element;
use ndnlibafl::mutators::{DigestProvider, RingSha256, TlvMutator};
use proptest::prelude::*;

fn interest_packet() -> impl Strategy<Value = Vec<u8>> {
    (
        prop::collection::vec("[a-z0-9]{0,6}", 1..4),
        any::<[u8; 4]>(),
        prop::option::of(0u64..100_000),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..24)),
        any::<bool>(),
    )
        .prop_map(|(components, nonce, lifetime_ms, parameters, must_be_fresh)| {
            let uri = components.join("/");
            let spec = InterestSpec {
                name: &uri,
                must_be_fresh,
                nonce,
                lifetime_ms,
                parameters: parameters.as_deref(),
                ..InterestSpec::default()
            };
            build_interest(&spec, &RingSha256).unwrap().encode()
        })
}

fn data_packet() -> impl Strategy<Value = Vec<u8>> {
    (
        prop::collection::vec("[a-z]{1,6}", 1..4),
        prop::collection::vec(any::<u8>(), 0..64),
        prop::option::of(0u64..100_000),
        any::<bool>(),
    )
        .prop_map(|(components, content, freshness, with_final_block)| {
            let data = build_data(&components.join("/"), &content, freshness, &RingSha256).unwrap();
            if !with_final_block {
                return data.encode();
            }
            let meta_index = data.find(META_INFO).unwrap();
            let meta = &data.children()[meta_index];
            let meta = meta.insert_child(
                meta.child_count(),
                &Element::new(FINAL_BLOCK_ID, b"\x08\x01z".to_vec()),
            );
            data.replace_child(meta_index, Some(&meta)).encode()
        })
}

fn child<'a>(packet: &'a Element, tag: u64) -> Option<&'a Element> {
    packet.find(tag).map(|i| &packet.children()[i])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn outputs_are_single_honest_packets(
        packet in prop_oneof![interest_packet(), data_packet()],
        seed in any::<u64>(),
        headroom in 0usize..256,
    ) {
        let max_size = packet.len() + headroom;
        let mut mutator = TlvMutator::with_defaults();
        if let Some(out) = mutator.mutate(&packet, max_size, seed).unwrap() {
            prop_assert!(out.len() <= max_size);
            let (parsed, used) = Element::parse(&out).unwrap();
            prop_assert_eq!(used, out.len());
            prop_assert_eq!(parsed.tag(), Element::parse(&packet).unwrap().0.tag());
        }
    }

    #[test]
    fn tight_budgets_never_grow(
        packet in interest_packet(),
        seed in any::<u64>(),
        shortfall in 0usize..16,
    ) {
        let max_size = packet.len().saturating_sub(shortfall);
        let mut mutator = TlvMutator::with_defaults();
        if let Some(out) = mutator.mutate(&packet, max_size, seed).unwrap() {
            prop_assert!(out.len() <= max_size);
        }
    }

    #[test]
    fn interest_scalars_keep_legal_widths(packet in interest_packet(), seed in any::<u64>()) {
        let mut mutator = TlvMutator::with_defaults();
        if let Some(out) = mutator.mutate(&packet, packet.len() + 128, seed).unwrap() {
            let (interest, _) = Element::parse(&out).unwrap();
            for c in interest.children() {
                match c.tag() {
                    NONCE => prop_assert_eq!(c.value_len(), 4),
                    INTEREST_LIFETIME => prop_assert!([1, 2, 4, 8].contains(&c.value_len())),
                    HOP_LIMIT => prop_assert!(c.value_len() <= 1),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn parameters_digest_follows_parameters(packet in interest_packet(), seed in any::<u64>()) {
        let mut mutator = TlvMutator::with_defaults();
        let (before, _) = Element::parse(&packet).unwrap();
        let Some(out) = mutator.mutate(&packet, packet.len() + 128, seed).unwrap() else {
            return Ok(());
        };
        let (after, _) = Element::parse(&out).unwrap();
        let params_before = child(&before, APPLICATION_PARAMETERS);
        let params_after = child(&after, APPLICATION_PARAMETERS);
        if params_before == params_after {
            return Ok(());
        }
        let name = child(&after, NAME).unwrap();
        match params_after {
            Some(params) => {
                let expected = RingSha256.digest(&params.encode()).unwrap();
                for component in name.children() {
                    if component.tag() == PARAMETERS_SHA256_DIGEST_COMPONENT {
                        prop_assert_eq!(component.value(), expected.as_slice());
                    }
                }
            }
            None => prop_assert_eq!(name.count(PARAMETERS_SHA256_DIGEST_COMPONENT), 0),
        }
    }

    #[test]
    fn meta_info_never_gains_a_second_final_block_id(packet in data_packet(), seed in any::<u64>()) {
        let mut mutator = TlvMutator::with_defaults();
        if let Some(out) = mutator.mutate(&packet, packet.len() + 256, seed).unwrap() {
            let (data, _) = Element::parse(&out).unwrap();
            if let Some(meta) = child(&data, META_INFO) {
                prop_assert!(meta.count(FINAL_BLOCK_ID) <= 1);
            }
        }
    }
}
