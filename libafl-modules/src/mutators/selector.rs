use rand::Rng;

use crate::inputstruct::{
    grammar::{Grammar, Selection, SelectionMode},
    tlv::{Element, Tag},
};

use super::context::MutationCtx;

/// Target picked for a field mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldChoice {
    /// Index of an existing child
    Existing(usize),
    /// Tag the container lacks; it has to be synthesized first
    Missing(Tag),
    /// Nothing eligible
    Nothing,
}

pub fn choose_field(ctx: &mut MutationCtx<'_>, grammar: &Grammar, container: &Element) -> FieldChoice {
    match grammar.mode {
        SelectionMode::Positional { default_tag } => {
            let count = container.child_count();
            if count == 0 {
                FieldChoice::Missing(default_tag)
            } else {
                FieldChoice::Existing(ctx.rng.gen_range(0..count))
            }
        }
        SelectionMode::ByTag => {
            let avoided = if ctx.avoid_satisfaction_fields() {
                grammar.satisfaction_field
            } else {
                None
            };
            let candidates: Vec<Tag> = grammar
                .children
                .iter()
                .filter(|c| match c.selection {
                    Selection::Candidate => true,
                    Selection::WhenPresent => container.find(c.tag).is_some(),
                    Selection::Never => false,
                })
                .map(|c| c.tag)
                .filter(|tag| Some(*tag) != avoided)
                .collect();
            if candidates.is_empty() {
                return FieldChoice::Nothing;
            }
            let tag = candidates[ctx.rng.gen_range(0..candidates.len())];
            let occurrences = container.occurrences(tag);
            if occurrences.is_empty() {
                FieldChoice::Missing(tag)
            } else {
                FieldChoice::Existing(occurrences[ctx.rng.gen_range(0..occurrences.len())])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MutatorConfig,
        inputstruct::{grammar::ContainerKind, ndn_tlv::*},
        mutators::{
            context::{Budget, MutationCtx},
            digest::RingSha256,
            scalar::HavocBytesMutator,
        },
    };

    fn data_packet() -> Element {
        Element::container(
            DATA,
            [
                &Element::new(NAME, b"\x08\x01a".to_vec()),
                &Element::new(CONTENT, b"x".to_vec()),
            ],
        )
    }

    #[test]
    fn high_bias_never_picks_the_satisfaction_field() {
        let config = MutatorConfig {
            satisfaction_threshold: 0,
            ..MutatorConfig::default()
        };
        let mut havoc = HavocBytesMutator::new();
        let data = data_packet();
        for seed in 0..200 {
            let mut ctx = MutationCtx::new(seed, Budget::new(10, 100), &mut havoc, &RingSha256, &config);
            if ctx.satisfaction_bias == 0 {
                continue;
            }
            let choice = choose_field(&mut ctx, ContainerKind::Data.grammar(), &data);
            assert_ne!(choice, FieldChoice::Existing(0));
        }
    }

    #[test]
    fn duplicates_are_picked_by_ordinal() {
        let config = MutatorConfig::default();
        let mut havoc = HavocBytesMutator::new();
        let meta = Element::container(
            META_INFO,
            [
                &Element::new(CONTENT_TYPE, vec![0]),
                &Element::new(CONTENT_TYPE, vec![1]),
            ],
        );
        let mut seen = [false; 2];
        for seed in 0..300 {
            let mut ctx = MutationCtx::new(seed, Budget::new(10, 100), &mut havoc, &RingSha256, &config);
            if let FieldChoice::Existing(i) = choose_field(&mut ctx, ContainerKind::MetaInfo.grammar(), &meta) {
                seen[i] = true;
            }
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn empty_positional_container_asks_for_a_component() {
        let config = MutatorConfig::default();
        let mut havoc = HavocBytesMutator::new();
        let mut ctx = MutationCtx::new(5, Budget::new(10, 100), &mut havoc, &RingSha256, &config);
        let name = Element::new(NAME, Vec::new());
        assert_eq!(
            choose_field(&mut ctx, ContainerKind::Name.grammar(), &name),
            FieldChoice::Missing(GENERIC_NAME_COMPONENT)
        );
    }

    #[test]
    fn selectors_only_offered_when_present() {
        let config = MutatorConfig::default();
        let mut havoc = HavocBytesMutator::new();
        let interest = Element::container(INTEREST, [&Element::new(NAME, b"\x08\x01a".to_vec())]);
        for seed in 0..200 {
            let mut ctx = MutationCtx::new(seed, Budget::new(10, 100), &mut havoc, &RingSha256, &config);
            let choice = choose_field(&mut ctx, ContainerKind::Interest.grammar(), &interest);
            assert_ne!(choice, FieldChoice::Missing(SELECTORS));
        }
    }
}
