//! Child-level operators shared by every container: delete, duplicate or
//! append, shuffle and retag. Each returns the container unchanged when its
//! precondition or the budget does not allow the change.

use log::debug;
use rand::Rng;

use crate::inputstruct::{grammar::Grammar, tlv::Element};

use super::context::MutationCtx;

fn within_budget(ctx: &MutationCtx<'_>, container: &Element, rebuilt: Element, op: &str) -> Element {
    if ctx.budget.fits(container.encoded_len(), rebuilt.encoded_len()) {
        rebuilt
    } else {
        debug!("{op} on {} exceeds the budget", container.tag());
        container.clone()
    }
}

/// Removes a run of up to `child_count` children from a uniform start.
/// Protected children survive.
pub fn delete(ctx: &mut MutationCtx<'_>, grammar: &Grammar, container: &Element) -> Element {
    let children = container.children();
    if children.len() < 2 {
        debug!("delete: {} has fewer than 2 children", container.tag());
        return container.clone();
    }
    let start = ctx.rng.gen_range(0..children.len());
    let deletions = ctx.rng.gen_range(0..=children.len());
    let end = start.saturating_add(deletions).min(children.len());
    let kept = children
        .iter()
        .enumerate()
        .filter(|(i, c)| !(start..end).contains(i) || grammar.is_protected(c.tag()))
        .map(|(_, c)| c);
    within_budget(ctx, container, grammar.rebuild(kept), "delete")
}

/// Either re-emits every child twice or appends one synthesized child.
pub fn duplicate(ctx: &mut MutationCtx<'_>, grammar: &Grammar, container: &Element) -> Element {
    let children = container.children();
    if ctx.rng.gen_bool(0.5) {
        if !ctx.budget.allows_doubling() {
            debug!("duplicate: no room to double {}", container.tag());
            return container.clone();
        }
        let rebuilt = grammar.rebuild(children.iter().chain(children.iter()));
        within_budget(ctx, container, rebuilt, "duplicate")
    } else {
        if !ctx.budget.allows_append() {
            debug!("append: no room in {}", container.tag());
            return container.clone();
        }
        let extra = grammar.append_child(&mut ctx.rng);
        let rebuilt = grammar.rebuild(children.iter().chain(std::iter::once(&extra)));
        within_budget(ctx, container, rebuilt, "append")
    }
}

/// `child_count / 2` random swaps among the children after the pinned prefix.
pub fn shuffle(ctx: &mut MutationCtx<'_>, grammar: &Grammar, container: &Element) -> Element {
    let children = container.children();
    let pinned = grammar.pinned_prefix.min(children.len());
    let movable = children.len() - pinned;
    if movable < 2 {
        debug!("shuffle: {} has fewer than 2 movable children", container.tag());
        return container.clone();
    }
    let mut order: Vec<usize> = (0..children.len()).collect();
    for _ in 0..children.len() / 2 {
        let a = pinned + ctx.rng.gen_range(0..movable);
        let b = pinned + ctx.rng.gen_range(0..movable);
        order.swap(a, b);
    }
    let rebuilt = grammar.rebuild(order.iter().map(|&i| &children[i]));
    within_budget(ctx, container, rebuilt, "shuffle")
}

/// Gives one child a uniformly random 32-bit tag.
pub fn retag(ctx: &mut MutationCtx<'_>, grammar: &Grammar, container: &Element) -> Element {
    if !ctx.budget.allows_retag() {
        debug!("retag: no room in {}", container.tag());
        return container.clone();
    }
    let children = container.children();
    let eligible: Vec<usize> = (grammar.pinned_prefix..children.len())
        .filter(|&i| !grammar.is_protected(children[i].tag()))
        .collect();
    if eligible.is_empty() {
        debug!("retag: nothing to retag in {}", container.tag());
        return container.clone();
    }
    let index = eligible[ctx.rng.gen_range(0..eligible.len())];
    let new_tag = ctx.rng.gen::<u32>() as u64;
    let replacement = children[index].retagged(new_tag);
    let rebuilt = grammar.rebuild(
        children
            .iter()
            .enumerate()
            .map(|(i, c)| if i == index { &replacement } else { c }),
    );
    within_budget(ctx, container, rebuilt, "retag")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MutatorConfig,
        inputstruct::{grammar::ContainerKind, ndn_tlv::*},
        mutators::{context::Budget, digest::RingSha256, scalar::HavocBytesMutator},
    };

    fn component(v: &[u8]) -> Element {
        Element::new(GENERIC_NAME_COMPONENT, v.to_vec())
    }

    fn run<F>(seed: u64, budget: Budget, f: F) -> Element
    where
        F: FnOnce(&mut MutationCtx<'_>) -> Element,
    {
        let config = MutatorConfig::default();
        let mut havoc = HavocBytesMutator::new();
        let mut ctx = MutationCtx::new(seed, budget, &mut havoc, &RingSha256, &config);
        f(&mut ctx)
    }

    #[test]
    fn delete_needs_two_children() {
        let name = Element::container(NAME, [&component(b"only")]);
        for seed in 0..20 {
            let out = run(seed, Budget::new(10, 100), |ctx| {
                delete(ctx, ContainerKind::Name.grammar(), &name)
            });
            assert_eq!(out, name);
        }
    }

    #[test]
    fn delete_keeps_the_parameters_digest() {
        let digest = Element::new(PARAMETERS_SHA256_DIGEST_COMPONENT, vec![7; 32]);
        let name = Element::container(NAME, [&component(b"a"), &component(b"b"), &digest]);
        for seed in 0..100 {
            let out = run(seed, Budget::new(60, 200), |ctx| {
                delete(ctx, ContainerKind::Name.grammar(), &name)
            });
            assert_eq!(out.count(PARAMETERS_SHA256_DIGEST_COMPONENT), 1);
            assert!(out.child_count() >= 1);
        }
    }

    #[test]
    fn duplicate_doubles_or_appends() {
        let name = Element::container(NAME, [&component(b"a"), &component(b"b")]);
        for seed in 0..50 {
            let out = run(seed, Budget::new(10, 100), |ctx| {
                duplicate(ctx, ContainerKind::Name.grammar(), &name)
            });
            assert!(out.child_count() == 4 || out.child_count() == 3, "{:?}", out);
            if out.child_count() == 3 {
                assert_eq!(out.children()[2].encode(), vec![8, 1, 255]);
            }
        }
    }

    #[test]
    fn duplicate_is_a_noop_without_room() {
        let name = Element::container(NAME, [&component(b"a"), &component(b"b")]);
        for seed in 0..20 {
            let out = run(seed, Budget::new(100, 104), |ctx| {
                duplicate(ctx, ContainerKind::Name.grammar(), &name)
            });
            assert_eq!(out, name);
        }
    }

    #[test]
    fn shuffle_keeps_the_multiset_and_pinned_prefix() {
        let sig = Element::container(
            SIGNATURE_INFO,
            [
                &Element::new(SIGNATURE_TYPE, vec![0]),
                &Element::new(DESCRIPTION_KEY, vec![1]),
                &Element::new(DESCRIPTION_VALUE, vec![2]),
                &Element::new(DESCRIPTION_ENTRY, vec![3]),
            ],
        );
        for seed in 0..50 {
            let out = run(seed, Budget::new(20, 100), |ctx| {
                shuffle(ctx, ContainerKind::SignatureInfo.grammar(), &sig)
            });
            assert_eq!(out.encoded_len(), sig.encoded_len());
            assert_eq!(out.children()[0].tag(), SIGNATURE_TYPE);
            let mut tags: Vec<_> = out.children().iter().map(|c| c.tag()).collect();
            tags.sort_unstable();
            assert_eq!(tags, vec![SIGNATURE_TYPE, DESCRIPTION_ENTRY, DESCRIPTION_KEY, DESCRIPTION_VALUE]);
        }
    }

    #[test]
    fn retag_skips_protected_and_pinned_children() {
        let digest = Element::new(PARAMETERS_SHA256_DIGEST_COMPONENT, vec![7; 32]);
        let name = Element::container(NAME, [&component(b"a"), &digest]);
        for seed in 0..50 {
            let out = run(seed, Budget::new(40, 200), |ctx| {
                retag(ctx, ContainerKind::Name.grammar(), &name)
            });
            assert_eq!(out.children()[1], digest);
        }

        let sig = Element::container(SIGNATURE_INFO, [&Element::new(SIGNATURE_TYPE, vec![0])]);
        let out = run(1, Budget::new(10, 100), |ctx| {
            retag(ctx, ContainerKind::SignatureInfo.grammar(), &sig)
        });
        assert_eq!(out, sig);
    }
}
