//! Static knowledge about which children each NDN container carries, how to
//! pick among them and how to build a minimal instance of a missing one.

use rand::Rng;

use super::ndn_tlv::*;
use super::tlv::{Element, Tag};

/// Every container the engine knows how to descend into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Interest,
    Data,
    Name,
    Selectors,
    ForwardingHint,
    Delegation,
    SignatureInfo,
    KeyLocator,
    MetaInfo,
    FinalBlockId,
}

impl ContainerKind {
    pub fn grammar(self) -> &'static Grammar {
        match self {
            ContainerKind::Interest => &INTEREST_GRAMMAR,
            ContainerKind::Data => &DATA_GRAMMAR,
            ContainerKind::Name => &NAME_GRAMMAR,
            ContainerKind::Selectors => &SELECTORS_GRAMMAR,
            ContainerKind::ForwardingHint => &FORWARDING_HINT_GRAMMAR,
            ContainerKind::Delegation => &DELEGATION_GRAMMAR,
            ContainerKind::SignatureInfo => &SIGNATURE_INFO_GRAMMAR,
            ContainerKind::KeyLocator => &KEY_LOCATOR_GRAMMAR,
            ContainerKind::MetaInfo => &META_INFO_GRAMMAR,
            ContainerKind::FinalBlockId => &FINAL_BLOCK_ID_GRAMMAR,
        }
    }

    /// Packet kinds accepted at the top level.
    pub fn for_packet(tag: Tag) -> Option<Self> {
        match tag {
            INTEREST => Some(ContainerKind::Interest),
            DATA => Some(ContainerKind::Data),
            _ => None,
        }
    }
}

/// Length constraint applied to a scalar field after byte mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthRule {
    /// Non-negative integers: lifetimes, freshness, preferences, selector numbers
    Duration,
    Nonce,
    /// SignatureType and ContentType
    Code,
    HopLimit,
    /// Opaque bytes bounded only by the packet budget
    Bytes,
}

impl LengthRule {
    /// Upper bound handed to the scalar mutator.
    pub fn max_len(self, value_len: usize, free_space: usize) -> usize {
        match self {
            LengthRule::Duration | LengthRule::Nonce | LengthRule::Code => 8,
            LengthRule::HopLimit => 1,
            LengthRule::Bytes => value_len + free_space,
        }
    }

    pub fn accepts(self, len: usize) -> bool {
        match self {
            LengthRule::Duration => matches!(len, 1 | 2 | 4 | 8),
            LengthRule::Nonce => len == 4,
            LengthRule::Code => matches!(len, 1 | 2),
            LengthRule::HopLimit | LengthRule::Bytes => true,
        }
    }
}

/// How a child is mutated once selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldClass {
    Container(ContainerKind),
    Scalar(LengthRule),
    /// ApplicationParameters: removal or byte mutation, followed by a digest update
    Parameters,
    /// Selected but left untouched
    PassThrough,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    AtMostOne,
    ZeroOrMore,
}

/// Whether the field selector may draw a child tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Candidate,
    /// Only when the container already carries it
    WhenPresent,
    Never,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Draw a tag from the candidate list, then an occurrence of it
    ByTag,
    /// Draw a child position; an empty container gets a `default_tag` child
    Positional { default_tag: Tag },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Delete,
    Duplicate,
    Shuffle,
    Retag,
    Field,
}

impl MutationKind {
    pub const ALL: [MutationKind; 5] = [
        MutationKind::Delete,
        MutationKind::Duplicate,
        MutationKind::Shuffle,
        MutationKind::Retag,
        MutationKind::Field,
    ];
}

/// Relative weights of [`MutationKind::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindWeights(pub [u32; 5]);

impl KindWeights {
    pub const UNIFORM: Self = Self([1, 1, 1, 1, 1]);
    pub const FIELD_ONLY: Self = Self([0, 0, 0, 0, 1]);
    pub const NO_DELETE: Self = Self([0, 1, 1, 1, 1]);

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> MutationKind {
        let total: u32 = self.0.iter().sum();
        if total == 0 {
            return MutationKind::Field;
        }
        let mut roll = rng.gen_range(0..total);
        for (kind, weight) in MutationKind::ALL.iter().zip(self.0) {
            if roll < weight {
                return *kind;
            }
            roll -= weight;
        }
        MutationKind::Field
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ChildSpec {
    pub tag: Tag,
    pub class: FieldClass,
    pub multiplicity: Multiplicity,
    pub selection: Selection,
    /// Value of a synthesized instance
    pub default: &'static [u8],
}

const fn child(
    tag: Tag,
    class: FieldClass,
    multiplicity: Multiplicity,
    selection: Selection,
    default: &'static [u8],
) -> ChildSpec {
    ChildSpec {
        tag,
        class,
        multiplicity,
        selection,
        default,
    }
}

#[derive(Debug)]
pub struct Grammar {
    pub kind: ContainerKind,
    pub tag: Tag,
    /// Catalogue in canonical order
    pub children: &'static [ChildSpec],
    pub mode: SelectionMode,
    pub weights: KindWeights,
    /// Class of children the catalogue does not name (e.g. after a retag)
    pub fallback: FieldClass,
    /// Field excluded from selection when the satisfaction bias is high
    pub satisfaction_field: Option<Tag>,
    /// Tags never removed by Delete nor retagged
    pub protected: &'static [Tag],
    /// Leading children that Shuffle and Retag leave in place
    pub pinned_prefix: usize,
    /// Tag emitted at most once on every rebuild
    pub unique: Option<Tag>,
    /// Child appended by the append flavor of Duplicate; `None` appends a
    /// synthesized catalogue candidate
    pub append: Option<(Tag, &'static [u8])>,
}

impl Grammar {
    pub fn spec(&self, tag: Tag) -> Option<&ChildSpec> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn class_of(&self, tag: Tag) -> FieldClass {
        self.spec(tag).map(|c| c.class).unwrap_or(self.fallback)
    }

    pub fn is_protected(&self, tag: Tag) -> bool {
        self.protected.contains(&tag)
    }

    fn catalogue_index(&self, tag: Tag) -> Option<usize> {
        self.children.iter().position(|c| c.tag == tag)
    }

    /// Minimal well-formed instance of `tag` for this container.
    pub fn synthesize(&self, tag: Tag) -> Element {
        match self.spec(tag) {
            Some(spec) => Element::new(tag, spec.default),
            None => Element::new(tag, vec![0]),
        }
    }

    /// Position a synthesized `tag` child goes to: right after the last
    /// present child that precedes it in the catalogue. Positional
    /// containers and unknown tags append.
    pub fn insertion_point(&self, container: &Element, tag: Tag) -> usize {
        let children = container.children();
        let rank = match (self.mode, self.catalogue_index(tag)) {
            (SelectionMode::ByTag, Some(rank)) => rank,
            _ => return children.len(),
        };
        children
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(self.catalogue_index(c.tag()), Some(r) if r < rank))
            .map(|(i, _)| i + 1)
            .last()
            .unwrap_or(0)
    }

    pub fn append_child<R: Rng + ?Sized>(&self, rng: &mut R) -> Element {
        if let Some((tag, value)) = self.append {
            return Element::new(tag, value);
        }
        let candidates: Vec<&ChildSpec> = self
            .children
            .iter()
            .filter(|c| c.selection == Selection::Candidate)
            .collect();
        if candidates.is_empty() {
            return Element::new(GENERIC_NAME_COMPONENT, vec![255]);
        }
        let spec = candidates[rng.gen_range(0..candidates.len())];
        Element::new(spec.tag, spec.default)
    }

    /// Re-encodes `children` under this container's tag, emitting the unique
    /// tag at most once. Its first occurrence is kept when it holds at least
    /// one child and replaced by the synthesized default otherwise.
    pub fn rebuild<'a, C>(&self, children: C) -> Element
    where
        C: IntoIterator<Item = &'a Element>,
    {
        let mut value = Vec::new();
        let mut seen_unique = false;
        for c in children {
            if Some(c.tag()) == self.unique {
                if seen_unique {
                    continue;
                }
                seen_unique = true;
                if c.children().is_empty() {
                    self.synthesize(c.tag()).encode_into(&mut value);
                    continue;
                }
            }
            c.encode_into(&mut value);
        }
        Element::new(self.tag, value)
    }
}

use ContainerKind as K;
use FieldClass::{Container, Parameters, PassThrough, Scalar};
use LengthRule as L;
use Multiplicity::{AtMostOne, ZeroOrMore};
use Selection::{Candidate, Never, WhenPresent};

const EMPTY_NAME: &[u8] = b"\x08\x00";

static INTEREST_CHILDREN: [ChildSpec; 9] = [
    child(NAME, Container(K::Name), AtMostOne, Candidate, EMPTY_NAME),
    child(SELECTORS, Container(K::Selectors), AtMostOne, WhenPresent, b"\x12\x00"),
    child(CAN_BE_PREFIX, PassThrough, AtMostOne, Never, b""),
    child(MUST_BE_FRESH, PassThrough, AtMostOne, Never, b""),
    // one delegation: preference 64, name /test
    child(
        FORWARDING_HINT,
        Container(K::ForwardingHint),
        AtMostOne,
        Candidate,
        b"\x1f\x0b\x1e\x01\x40\x07\x06\x08\x04test",
    ),
    child(NONCE, Scalar(L::Nonce), AtMostOne, Candidate, b"\x00\x00\x00\x00"),
    child(INTEREST_LIFETIME, Scalar(L::Duration), AtMostOne, Candidate, b"\x00"),
    child(HOP_LIMIT, Scalar(L::HopLimit), AtMostOne, Candidate, b"\x00"),
    child(APPLICATION_PARAMETERS, Parameters, AtMostOne, Candidate, b"\x80\x01\xff"),
];

pub static INTEREST_GRAMMAR: Grammar = Grammar {
    kind: K::Interest,
    tag: INTEREST,
    children: &INTEREST_CHILDREN,
    mode: SelectionMode::ByTag,
    weights: KindWeights::FIELD_ONLY,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[],
    pinned_prefix: 0,
    unique: None,
    append: None,
};

static DATA_CHILDREN: [ChildSpec; 6] = [
    child(NAME, Container(K::Name), AtMostOne, Candidate, EMPTY_NAME),
    child(META_INFO, Container(K::MetaInfo), AtMostOne, Candidate, b""),
    child(CONTENT, Scalar(L::Bytes), AtMostOne, Candidate, b"\xff"),
    // only mutated when a Data already carries one
    child(APPLICATION_PARAMETERS, Parameters, AtMostOne, WhenPresent, b"\x80\x01\xff"),
    child(SIGNATURE_INFO, Container(K::SignatureInfo), AtMostOne, Candidate, b"\x1b\x01\x00"),
    child(SIGNATURE_VALUE, Scalar(L::Bytes), AtMostOne, Candidate, b"\x00"),
];

pub static DATA_GRAMMAR: Grammar = Grammar {
    kind: K::Data,
    tag: DATA,
    children: &DATA_CHILDREN,
    mode: SelectionMode::ByTag,
    weights: KindWeights::FIELD_ONLY,
    fallback: Scalar(L::Bytes),
    satisfaction_field: Some(NAME),
    protected: &[],
    pinned_prefix: 0,
    unique: None,
    append: None,
};

static NAME_CHILDREN: [ChildSpec; 3] = [
    child(GENERIC_NAME_COMPONENT, Scalar(L::Bytes), ZeroOrMore, Candidate, b""),
    child(IMPLICIT_SHA256_DIGEST_COMPONENT, Scalar(L::Bytes), AtMostOne, Never, &[0; 32]),
    child(PARAMETERS_SHA256_DIGEST_COMPONENT, Scalar(L::Bytes), AtMostOne, Never, &[0; 32]),
];

pub static NAME_GRAMMAR: Grammar = Grammar {
    kind: K::Name,
    tag: NAME,
    children: &NAME_CHILDREN,
    mode: SelectionMode::Positional {
        default_tag: GENERIC_NAME_COMPONENT,
    },
    weights: KindWeights::UNIFORM,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[PARAMETERS_SHA256_DIGEST_COMPONENT],
    pinned_prefix: 0,
    unique: None,
    append: Some((GENERIC_NAME_COMPONENT, b"\xff")),
};

pub static FINAL_BLOCK_ID_GRAMMAR: Grammar = Grammar {
    kind: K::FinalBlockId,
    tag: FINAL_BLOCK_ID,
    children: &NAME_CHILDREN,
    mode: SelectionMode::Positional {
        default_tag: GENERIC_NAME_COMPONENT,
    },
    weights: KindWeights::FIELD_ONLY,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[],
    pinned_prefix: 0,
    unique: None,
    append: None,
};

static SELECTORS_CHILDREN: [ChildSpec; 6] = [
    child(MIN_SUFFIX_COMPONENTS, Scalar(L::Duration), AtMostOne, Candidate, b"\x00"),
    child(MAX_SUFFIX_COMPONENTS, Scalar(L::Duration), AtMostOne, Candidate, b"\x00"),
    child(PUBLISHER_PUBLIC_KEY_LOCATOR, PassThrough, AtMostOne, Never, b""),
    child(EXCLUDE, PassThrough, AtMostOne, Never, b""),
    child(CHILD_SELECTOR, Scalar(L::Duration), AtMostOne, Candidate, b"\x00"),
    child(MUST_BE_FRESH, Scalar(L::Duration), AtMostOne, Candidate, b""),
];

pub static SELECTORS_GRAMMAR: Grammar = Grammar {
    kind: K::Selectors,
    tag: SELECTORS,
    children: &SELECTORS_CHILDREN,
    mode: SelectionMode::ByTag,
    weights: KindWeights::UNIFORM,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[],
    pinned_prefix: 0,
    unique: None,
    append: None,
};

static FORWARDING_HINT_CHILDREN: [ChildSpec; 2] = [
    child(
        LINK_DELEGATION,
        Container(K::Delegation),
        ZeroOrMore,
        Candidate,
        b"\x1e\x01\x40\x07\x06\x08\x04test",
    ),
    child(NAME, Container(K::Name), ZeroOrMore, Candidate, EMPTY_NAME),
];

pub static FORWARDING_HINT_GRAMMAR: Grammar = Grammar {
    kind: K::ForwardingHint,
    tag: FORWARDING_HINT,
    children: &FORWARDING_HINT_CHILDREN,
    mode: SelectionMode::Positional {
        default_tag: LINK_DELEGATION,
    },
    weights: KindWeights::UNIFORM,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[],
    pinned_prefix: 0,
    unique: None,
    // preference 255, name /%FF
    append: Some((LINK_DELEGATION, b"\x1e\x01\xff\x07\x03\x08\x01\xff")),
};

static DELEGATION_CHILDREN: [ChildSpec; 2] = [
    child(LINK_PREFERENCE, Scalar(L::Duration), AtMostOne, Candidate, b"\x00"),
    child(NAME, Container(K::Name), AtMostOne, Candidate, EMPTY_NAME),
];

pub static DELEGATION_GRAMMAR: Grammar = Grammar {
    kind: K::Delegation,
    tag: LINK_DELEGATION,
    children: &DELEGATION_CHILDREN,
    mode: SelectionMode::ByTag,
    weights: KindWeights::FIELD_ONLY,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[],
    pinned_prefix: 0,
    unique: None,
    append: None,
};

static SIGNATURE_INFO_CHILDREN: [ChildSpec; 7] = [
    child(SIGNATURE_TYPE, Scalar(L::Code), AtMostOne, Candidate, b"\x00"),
    child(KEY_LOCATOR, Container(K::KeyLocator), AtMostOne, Candidate, b"\x07\x03\x08\x01T"),
    child(ADDITIONAL_DESCRIPTION, Scalar(L::Bytes), ZeroOrMore, Candidate, b"\xff"),
    child(DESCRIPTION_ENTRY, Scalar(L::Bytes), ZeroOrMore, Candidate, b"\xff"),
    child(DESCRIPTION_KEY, Scalar(L::Bytes), ZeroOrMore, Candidate, b"\xff"),
    child(DESCRIPTION_VALUE, Scalar(L::Bytes), ZeroOrMore, Candidate, b"\xff"),
    child(
        VALIDITY_PERIOD,
        PassThrough,
        AtMostOne,
        Candidate,
        b"\xfe\x0f19700101T000000\xff\x0f19700101T000000",
    ),
];

pub static SIGNATURE_INFO_GRAMMAR: Grammar = Grammar {
    kind: K::SignatureInfo,
    tag: SIGNATURE_INFO,
    children: &SIGNATURE_INFO_CHILDREN,
    mode: SelectionMode::ByTag,
    weights: KindWeights::NO_DELETE,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[],
    pinned_prefix: 1,
    unique: None,
    append: None,
};

static KEY_LOCATOR_CHILDREN: [ChildSpec; 2] = [
    child(NAME, Container(K::Name), AtMostOne, Candidate, b"\x08\x01T"),
    child(KEY_DIGEST, Scalar(L::Bytes), AtMostOne, Candidate, b"\x01\x01\x01"),
];

pub static KEY_LOCATOR_GRAMMAR: Grammar = Grammar {
    kind: K::KeyLocator,
    tag: KEY_LOCATOR,
    children: &KEY_LOCATOR_CHILDREN,
    mode: SelectionMode::Positional {
        default_tag: NAME,
    },
    weights: KindWeights::FIELD_ONLY,
    fallback: Scalar(L::Bytes),
    satisfaction_field: None,
    protected: &[],
    pinned_prefix: 0,
    unique: None,
    append: None,
};

static META_INFO_CHILDREN: [ChildSpec; 3] = [
    child(CONTENT_TYPE, Scalar(L::Code), AtMostOne, Candidate, b"\x00"),
    child(FRESHNESS_PERIOD, Scalar(L::Duration), AtMostOne, Candidate, b"\x00"),
    child(FINAL_BLOCK_ID, Container(K::FinalBlockId), AtMostOne, Candidate, b"\x08\x01\xff"),
];

pub static META_INFO_GRAMMAR: Grammar = Grammar {
    kind: K::MetaInfo,
    tag: META_INFO,
    children: &META_INFO_CHILDREN,
    mode: SelectionMode::ByTag,
    weights: KindWeights::UNIFORM,
    fallback: Scalar(L::Bytes),
    satisfaction_field: Some(FRESHNESS_PERIOD),
    protected: &[],
    pinned_prefix: 0,
    unique: Some(FINAL_BLOCK_ID),
    append: None,
};

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn length_rules() {
        for len in 0..10 {
            assert_eq!(LengthRule::Duration.accepts(len), [1, 2, 4, 8].contains(&len));
            assert_eq!(LengthRule::Nonce.accepts(len), len == 4);
            assert_eq!(LengthRule::Code.accepts(len), len == 1 || len == 2);
        }
        assert_eq!(LengthRule::HopLimit.max_len(5, 100), 1);
        assert_eq!(LengthRule::Bytes.max_len(5, 100), 105);
    }

    #[test]
    fn synthesized_children_are_minimal() {
        let interest = ContainerKind::Interest.grammar();
        assert_eq!(interest.synthesize(NAME).encode(), vec![7, 2, 8, 0]);
        assert_eq!(interest.synthesize(INTEREST_LIFETIME).value(), &[0]);
        assert_eq!(interest.synthesize(NONCE).value_len(), 4);

        let fh = interest.synthesize(FORWARDING_HINT);
        assert_eq!(fh.child_count(), 1);
        let delegation = &fh.children()[0];
        assert_eq!(delegation.tag(), LINK_DELEGATION);
        assert_eq!(delegation.child_count(), 2);

        let vp = ContainerKind::SignatureInfo.grammar().synthesize(VALIDITY_PERIOD);
        assert_eq!(vp.child_count(), 2);
        assert_eq!(vp.children()[1].value(), b"19700101T000000");
    }

    #[test]
    fn insertion_follows_catalogue_order() {
        let data = Element::container(
            DATA,
            [
                &Element::new(NAME, b"\x08\x01a".to_vec()),
                &Element::new(CONTENT, vec![1]),
                &Element::new(SIGNATURE_VALUE, vec![2]),
            ],
        );
        let grammar = ContainerKind::Data.grammar();
        assert_eq!(grammar.insertion_point(&data, META_INFO), 1);
        assert_eq!(grammar.insertion_point(&data, SIGNATURE_INFO), 2);
        assert_eq!(grammar.insertion_point(&data, NAME), 0);

        let name = Element::new(NAME, b"\x08\x01a".to_vec());
        assert_eq!(NAME_GRAMMAR.insertion_point(&name, GENERIC_NAME_COMPONENT), 1);
    }

    #[test]
    fn meta_info_rebuild_keeps_one_final_block_id() {
        let fbid = Element::new(FINAL_BLOCK_ID, b"\x08\x01z".to_vec());
        let broken = Element::new(FINAL_BLOCK_ID, vec![0xff]);
        let ct = Element::new(CONTENT_TYPE, vec![0]);

        let meta = META_INFO_GRAMMAR.rebuild([&ct, &fbid, &broken, &fbid]);
        assert_eq!(meta.count(FINAL_BLOCK_ID), 1);
        assert_eq!(meta.children()[1], fbid);

        let meta = META_INFO_GRAMMAR.rebuild([&broken, &ct, &fbid]);
        assert_eq!(meta.count(FINAL_BLOCK_ID), 1);
        assert_eq!(meta.children()[0].value(), b"\x08\x01\xff");
    }

    #[test]
    fn weights_never_draw_zero_kinds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(KindWeights::FIELD_ONLY.draw(&mut rng), MutationKind::Field);
            assert_ne!(KindWeights::NO_DELETE.draw(&mut rng), MutationKind::Delete);
        }
    }

    #[test]
    fn append_child_comes_from_catalogue() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let appended = META_INFO_GRAMMAR.append_child(&mut rng);
            assert!(META_INFO_GRAMMAR.spec(appended.tag()).is_some());
        }
        let component = NAME_GRAMMAR.append_child(&mut rng);
        assert_eq!(component.encode(), vec![8, 1, 255]);
    }
}
